use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::{
    EndpointFinding, EndpointStatus, FieldDescriptor, PropertyDescriptor, ReportInputs,
    ReportSummary, ValidationReport,
};
use crate::fields::FieldTable;
use crate::openapi::SpecDocument;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub method: String,
    pub content_type: String,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub spec: SpecDocument,
    pub table: FieldTable,
    pub spec_path: String,
    pub table_path: String,
}

impl Inputs {
    pub fn load(spec_path: &Path, table_path: &Path, export_name: &str) -> Result<Self> {
        let spec = SpecDocument::load(spec_path)?;
        let table = FieldTable::load(table_path, export_name)?;
        Ok(Self {
            spec,
            table,
            spec_path: spec_path.display().to_string(),
            table_path: table_path.display().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub endpoint: String,
    pub properties: Option<Vec<PropertyDescriptor>>,
    pub fields: Option<Vec<FieldDescriptor>>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointEntry {
    pub endpoint: String,
    pub has_request_schema: bool,
    pub authored: bool,
    pub ui_fields: usize,
}

#[derive(Clone)]
pub struct Engine {
    opts: EngineOptions,
}

impl Engine {
    pub fn new(opts: EngineOptions) -> Self {
        Self { opts }
    }

    pub fn validate(&self, inputs: &Inputs, endpoints: &[String]) -> ValidationReport {
        use std::io::IsTerminal;
        let progress_enabled = self.opts.show_progress && std::io::stderr().is_terminal();
        let pb = if progress_enabled {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let mut findings = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if let Some(pb) = &pb {
                pb.set_message(format!("validating {endpoint}"));
            }
            findings.push(self.validate_endpoint(inputs, endpoint));
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        self.report_from_findings(inputs, findings, generated_at)
    }

    pub fn report_from_findings(
        &self,
        inputs: &Inputs,
        findings: Vec<EndpointFinding>,
        generated_at: String,
    ) -> ValidationReport {
        ValidationReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            inputs: ReportInputs {
                spec_path: inputs.spec_path.clone(),
                table_path: inputs.table_path.clone(),
                method: self.opts.method.to_ascii_uppercase(),
            },
            summary: ReportSummary::from_findings(&findings),
            endpoints: findings,
        }
    }

    pub fn validate_endpoint(&self, inputs: &Inputs, endpoint: &str) -> EndpointFinding {
        let Some(schema) = inputs.spec.request_body_schema_for(
            endpoint,
            &self.opts.method,
            &self.opts.content_type,
        ) else {
            tracing::warn!(endpoint, "no request body schema in the specification");
            let mut finding = EndpointFinding::new(endpoint, EndpointStatus::NoRequestSchema);
            finding.notes.push(format!(
                "no {} request body with content type {} in the specification",
                self.opts.method.to_ascii_uppercase(),
                self.opts.content_type
            ));
            return finding;
        };

        let extraction = crate::schema::extract_properties(&inputs.spec, schema);
        let mut finding = EndpointFinding::new(endpoint, EndpointStatus::Compared);
        finding.spec_properties = extraction.properties.len();
        for reference in &extraction.cycles {
            tracing::warn!(endpoint, reference = reference.as_str(), "cyclic schema reference");
            finding
                .warnings
                .push(format!("cyclic reference {reference}; the branch was not expanded"));
        }
        for reference in &extraction.unresolved {
            finding
                .notes
                .push(format!("unresolved reference {reference}; treated as no properties"));
        }

        let Some(fields) = inputs.table.extract_fields(endpoint) else {
            tracing::warn!(endpoint, "no entry in the field table");
            finding.status = EndpointStatus::NotAuthored;
            finding
                .notes
                .push("no entry in the field table (endpoint may not be implemented yet)".to_string());
            return finding;
        };
        finding.warnings.extend(fields.warnings);
        if fields.fields.is_empty() {
            tracing::warn!(endpoint, "empty entry in the field table");
            finding.status = EndpointStatus::NotAuthored;
            finding
                .notes
                .push("the field table entry lists no fields".to_string());
            return finding;
        }

        let discrepancies = crate::diff::diff(&extraction.properties, &fields.fields);
        finding.ui_fields = fields.fields.len();
        finding.missing = discrepancies.missing;
        finding.extra = discrepancies.extra;
        finding.union_issues = discrepancies.union_issues;

        tracing::debug!(
            endpoint,
            spec_properties = finding.spec_properties,
            ui_fields = finding.ui_fields,
            missing = finding.missing.len(),
            extra = finding.extra.len(),
            union_issues = finding.union_issues.len(),
            "compared endpoint"
        );
        finding
    }

    pub fn endpoints(&self, inputs: &Inputs, endpoints: &[String]) -> Vec<EndpointEntry> {
        endpoints
            .iter()
            .map(|endpoint| {
                let ui_fields = inputs
                    .table
                    .extract_fields(endpoint)
                    .map_or(0, |ex| ex.fields.len());
                EndpointEntry {
                    endpoint: endpoint.clone(),
                    has_request_schema: inputs
                        .spec
                        .request_body_schema_for(
                            endpoint,
                            &self.opts.method,
                            &self.opts.content_type,
                        )
                        .is_some(),
                    authored: ui_fields > 0,
                    ui_fields,
                }
            })
            .collect()
    }

    pub fn inspect(&self, inputs: &Inputs, endpoint: &str) -> Inspection {
        let mut warnings = Vec::new();
        let mut notes = Vec::new();

        let properties = inputs
            .spec
            .request_body_schema_for(endpoint, &self.opts.method, &self.opts.content_type)
            .map(|schema| {
                let extraction = crate::schema::extract_properties(&inputs.spec, schema);
                warnings.extend(
                    extraction
                        .cycles
                        .iter()
                        .map(|r| format!("cyclic reference {r}")),
                );
                notes.extend(
                    extraction
                        .unresolved
                        .iter()
                        .map(|r| format!("unresolved reference {r}")),
                );
                extraction.properties
            });

        let fields = inputs.table.extract_fields(endpoint).map(|ex| {
            warnings.extend(ex.warnings);
            ex.fields
        });

        Inspection {
            endpoint: endpoint.to_string(),
            properties,
            fields,
            warnings,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, UnionIssue};

    const SPEC: &str = r##"
openapi: 3.0.3
paths:
  /jobs/single-doc-job-template:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/SingleDocJob'
  /jobs/agreeing:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [documentSourceIdentifier]
              properties:
                documentSourceIdentifier: { type: string }
                deliveryMethod:
                  oneOf:
                    - type: string
                    - type: integer
  /jobs/optional-union:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                documentSourceIdentifier: { type: string }
                paymentDetails:
                  oneOf:
                    - type: string
                    - type: integer
  /jobs/untabled:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                a: { type: string }
components:
  schemas:
    SingleDocJob:
      type: object
      required: [documentSourceIdentifier, recipientAddress]
      properties:
        documentSourceIdentifier: { type: string }
        recipientAddress:
          $ref: '#/components/schemas/Address'
        deliveryMethod:
          oneOf:
            - type: string
            - type: integer
            - type: boolean
    Address:
      type: object
      properties:
        city: { type: string }
"##;

    const TABLE: &str = r#"
export const parameterSchemas = {
  '/jobs/single-doc-job-template': [
    { name: 'documentSourceIdentifier', type: 'string', required: true },
    { name: 'city', type: 'string' },
    { name: 'debugMode', type: 'boolean' },
    {
      name: 'deliveryMethod',
      type: 'oneOf',
      oneOfOptions: [
        { label: 'A', value: 'a' },
        { label: 'B', value: 'b' },
      ],
    },
  ],
  '/jobs/agreeing': [
    { name: 'documentSourceIdentifier', type: 'string', required: true },
    { name: 'deliveryMethod', type: 'oneOf', oneOfOptions: [{ label: 'S' }, { label: 'I' }] },
  ],
  '/jobs/optional-union': [
    { name: 'documentSourceIdentifier', type: 'string' },
  ],
};
"#;

    fn inputs() -> Inputs {
        Inputs {
            spec: SpecDocument::parse(SPEC).expect("spec"),
            table: FieldTable::parse(TABLE.to_string(), "parameterSchemas").expect("table"),
            spec_path: "openapi.yaml".to_string(),
            table_path: "parameterSchemas.ts".to_string(),
        }
    }

    fn engine() -> Engine {
        Engine::new(EngineOptions {
            method: "post".to_string(),
            content_type: "application/json".to_string(),
            show_progress: false,
        })
    }

    #[test]
    fn classifies_missing_extra_and_union_findings() {
        let f = engine().validate_endpoint(&inputs(), "/jobs/single-doc-job-template");
        assert_eq!(f.status, EndpointStatus::Compared);

        let missing: Vec<(&str, bool)> = f
            .missing
            .iter()
            .map(|m| (m.name.as_str(), m.required))
            .collect();
        assert_eq!(missing, vec![("recipientAddress", true)]);

        let extra: Vec<&str> = f.extra.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(extra, vec!["debugMode"]);

        assert_eq!(
            f.union_issues,
            vec![UnionIssue::VariantCount {
                name: "deliveryMethod".to_string(),
                spec_variants: 3,
                ui_variants: 2,
            }]
        );
        assert_eq!(f.error_count(), 2);
        assert_eq!(f.warning_count(), 1);
        assert_eq!(f.severity(), Severity::Error);
    }

    #[test]
    fn agreeing_endpoint_is_a_success() {
        let f = engine().validate_endpoint(&inputs(), "/jobs/agreeing");
        assert!(f.is_success(), "{f:?}");
        assert_eq!(f.spec_properties, 3);
        assert_eq!(f.ui_fields, 2);
    }

    #[test]
    fn unauthored_and_schemaless_endpoints() {
        let e = engine();
        let f = e.validate_endpoint(&inputs(), "/jobs/untabled");
        assert_eq!(f.status, EndpointStatus::NotAuthored);
        assert_eq!(f.severity(), Severity::Warning);

        let f = e.validate_endpoint(&inputs(), "/jobs/not-in-spec");
        assert_eq!(f.status, EndpointStatus::NoRequestSchema);
        assert_eq!(f.severity(), Severity::Error);
    }

    #[test]
    fn report_keeps_endpoint_order_and_is_deterministic() {
        let e = engine();
        let inputs = inputs();
        let endpoints = vec![
            "/jobs/untabled".to_string(),
            "/jobs/agreeing".to_string(),
            "/jobs/single-doc-job-template".to_string(),
        ];
        let a = e.validate(&inputs, &endpoints);
        let b = e.validate(&inputs, &endpoints);
        assert_eq!(a.endpoints, b.endpoints);
        assert_eq!(
            serde_json::to_string(&a.endpoints).unwrap(),
            serde_json::to_string(&b.endpoints).unwrap()
        );

        let order: Vec<&str> = a.endpoints.iter().map(|f| f.endpoint.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "/jobs/untabled",
                "/jobs/agreeing",
                "/jobs/single-doc-job-template"
            ]
        );
        assert_eq!(a.summary.endpoints, 3);
        assert_eq!(a.summary.successes, 1);
        assert_eq!(a.summary.errors, 2);
        assert_eq!(a.summary.warnings, 2);
        assert!(!a.passed());
        assert_eq!(a.inputs.method, "POST");
    }

    #[test]
    fn optional_union_missing_from_the_ui_fails_the_run() {
        let e = engine();
        let f = e.validate_endpoint(&inputs(), "/jobs/optional-union");
        assert_eq!(f.missing.len(), 1);
        assert!(!f.missing[0].required);
        assert_eq!(
            f.union_issues,
            vec![UnionIssue::NotUnionInUi {
                name: "paymentDetails".to_string(),
                spec_variants: 2,
            }]
        );
        assert_eq!(f.severity(), Severity::Error);

        let report = e.validate(&inputs(), &["/jobs/optional-union".to_string()]);
        assert!(!report.passed());
        assert_eq!(report.summary.errors, 1);
    }

    #[test]
    fn warnings_alone_still_pass() {
        let e = engine();
        let report = e.validate(&inputs(), &["/jobs/agreeing".to_string(), "/jobs/untabled".to_string()]);
        assert_eq!(report.summary.warnings, 1);
        assert!(report.passed());
    }

    #[test]
    fn endpoint_listing_marks_authored_entries() {
        let entries = engine().endpoints(
            &inputs(),
            &["/jobs/agreeing".to_string(), "/jobs/untabled".to_string()],
        );
        assert_eq!(
            entries,
            vec![
                EndpointEntry {
                    endpoint: "/jobs/agreeing".to_string(),
                    has_request_schema: true,
                    authored: true,
                    ui_fields: 2,
                },
                EndpointEntry {
                    endpoint: "/jobs/untabled".to_string(),
                    has_request_schema: true,
                    authored: false,
                    ui_fields: 0,
                },
            ]
        );
    }

    #[test]
    fn inspect_lists_both_sides() {
        let ins = engine().inspect(&inputs(), "/jobs/single-doc-job-template");
        let props = ins.properties.expect("properties");
        assert!(props.iter().any(|p| p.name == "recipientAddress"));
        let fields = ins.fields.expect("fields");
        assert_eq!(fields.len(), 4);

        let ins = engine().inspect(&inputs(), "/nowhere");
        assert!(ins.properties.is_none());
        assert!(ins.fields.is_none());
    }
}
