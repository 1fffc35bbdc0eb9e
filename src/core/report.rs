use crate::core::EndpointFinding;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInputs {
    pub spec_path: String,
    pub table_path: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub endpoints: usize,
    pub successes: usize,
    pub warnings: usize,
    pub errors: usize,
    pub passed: bool,
}

impl ReportSummary {
    pub fn from_findings(findings: &[EndpointFinding]) -> Self {
        let errors: usize = findings.iter().map(EndpointFinding::error_count).sum();
        let warnings = findings.iter().map(EndpointFinding::warning_count).sum();
        let successes = findings.iter().filter(|f| f.is_success()).count();
        Self {
            endpoints: findings.len(),
            successes,
            warnings,
            errors,
            passed: errors == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema_version: String,
    pub tool_version: String,
    pub generated_at: String,
    pub inputs: ReportInputs,
    pub summary: ReportSummary,
    pub endpoints: Vec<EndpointFinding>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.summary.errors == 0
    }
}
