use crate::core::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Compared,
    NotAuthored,
    NoRequestSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub required: bool,
}

impl MissingField {
    pub fn severity(&self) -> Severity {
        if self.required {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum UnionIssue {
    #[serde(rename = "VARIANT_COUNT")]
    VariantCount {
        name: String,
        spec_variants: usize,
        ui_variants: usize,
    },
    #[serde(rename = "NOT_UNION_IN_UI")]
    NotUnionInUi { name: String, spec_variants: usize },
    #[serde(rename = "NOT_UNION_IN_SPEC")]
    NotUnionInSpec { name: String, ui_variants: usize },
}

impl UnionIssue {
    pub fn name(&self) -> &str {
        match self {
            UnionIssue::VariantCount { name, .. }
            | UnionIssue::NotUnionInUi { name, .. }
            | UnionIssue::NotUnionInSpec { name, .. } => name,
        }
    }
}

impl fmt::Display for UnionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnionIssue::VariantCount {
                name,
                spec_variants,
                ui_variants,
            } => write!(
                f,
                "field \"{name}\": specification has {spec_variants} variants, UI has {ui_variants} ({spec_variants} vs {ui_variants})"
            ),
            UnionIssue::NotUnionInUi {
                name,
                spec_variants,
            } => write!(
                f,
                "field \"{name}\": specification declares oneOf ({spec_variants} variants) but the UI field is not oneOf"
            ),
            UnionIssue::NotUnionInSpec { name, ui_variants } => write!(
                f,
                "field \"{name}\": UI declares oneOf ({ui_variants} variants) but the specification does not"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFinding {
    pub endpoint: String,
    pub status: EndpointStatus,
    pub spec_properties: usize,
    pub ui_fields: usize,
    pub missing: Vec<MissingField>,
    pub extra: Vec<ExtraField>,
    pub union_issues: Vec<UnionIssue>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl EndpointFinding {
    pub fn new(endpoint: impl Into<String>, status: EndpointStatus) -> Self {
        Self {
            endpoint: endpoint.into(),
            status,
            spec_properties: 0,
            ui_fields: 0,
            missing: vec![],
            extra: vec![],
            union_issues: vec![],
            warnings: vec![],
            notes: vec![],
        }
    }

    pub fn error_count(&self) -> usize {
        let status = usize::from(self.status == EndpointStatus::NoRequestSchema);
        let missing_required = self.missing.iter().filter(|m| m.required).count();
        status + missing_required + self.union_issues.len()
    }

    pub fn warning_count(&self) -> usize {
        let status = usize::from(self.status == EndpointStatus::NotAuthored);
        let missing_optional = self.missing.iter().filter(|m| !m.required).count();
        status + missing_optional + self.extra.len() + self.warnings.len()
    }

    pub fn severity(&self) -> Severity {
        if self.error_count() > 0 {
            Severity::Error
        } else if self.warning_count() > 0 {
            Severity::Warning
        } else {
            Severity::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.severity() == Severity::Success
    }
}
