use std::path::PathBuf;

use paramlint::engine::{Engine, EngineOptions, Inputs};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn report_json_matches_golden() {
    let mut inputs = Inputs::load(
        &fixture("openapi.yaml"),
        &fixture("parameterSchemas.ts"),
        "parameterSchemas",
    )
    .expect("load fixtures");
    inputs.spec_path = "openapi.yaml".to_string();
    inputs.table_path = "parameterSchemas.ts".to_string();

    let engine = Engine::new(EngineOptions {
        method: "post".to_string(),
        content_type: "application/json".to_string(),
        show_progress: false,
    });
    let endpoints: Vec<String> = [
        "/jobs/single-doc-job-template",
        "/jobs/multi-docs-job-template",
        "/jobs/tree-node",
        "/jobs/no-body",
        "/jobs/new-endpoint",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let mut report = engine.validate(&inputs, &endpoints);
    assert!(!report.generated_at.is_empty());
    report.generated_at = "2026-01-01T00:00:00Z".to_string();

    let actual = serde_json::to_value(&report).expect("serialize report");
    let expected: serde_json::Value =
        serde_json::from_str(include_str!("golden/report.json")).expect("parse golden json");

    assert_eq!(actual, expected);
}

#[test]
fn golden_report_deserializes_back() {
    let report: paramlint::core::ValidationReport =
        serde_json::from_str(include_str!("golden/report.json")).expect("parse golden json");
    assert!(!report.passed());
    assert_eq!(report.endpoints.len(), report.summary.endpoints);
}
