use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

const SPEC_PATH: &str = "frontend/data/reference/c2mapiv2-openapi-spec-final.yaml";
const TABLE_PATH: &str = "frontend/src/components/forms/parameterSchemas.ts";

fn paramlint_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_paramlint"));
    cmd.current_dir(root);
    cmd.env_remove("PARAMLINT_CONFIG");
    cmd.env_remove("PARAMLINT_LOG");
    cmd.env_remove("PARAMLINT_SPEC_PATH");
    cmd.env_remove("PARAMLINT_SPEC_METHOD");
    cmd.env_remove("PARAMLINT_SPEC_CONTENT_TYPE");
    cmd.env_remove("PARAMLINT_TABLE_PATH");
    cmd.env_remove("PARAMLINT_TABLE_EXPORT");
    cmd.env_remove("PARAMLINT_ENDPOINTS");
    cmd.env_remove("PARAMLINT_UI_COLOR");
    cmd.env_remove("PARAMLINT_UI_MAX_TABLE_ROWS");
    cmd
}

fn run(root: &Path, args: &[&str]) -> Output {
    paramlint_cmd(root).args(args).output().expect("run paramlint")
}

fn make_temp_root() -> PathBuf {
    static ROOT_SEQ: AtomicU64 = AtomicU64::new(0);

    let temp = std::env::temp_dir();
    let seq = ROOT_SEQ.fetch_add(1, Ordering::Relaxed);
    let uniq = format!("paramlint-markdown-test-{}-{seq}", std::process::id());
    let root = temp.join(uniq);
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).expect("create root");
    root
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    std::fs::write(path, bytes).expect("write");
}

fn make_project() -> PathBuf {
    let root = make_temp_root();
    write_file(
        &root.join(SPEC_PATH),
        include_bytes!("fixtures/openapi.yaml"),
    );
    write_file(
        &root.join(TABLE_PATH),
        include_bytes!("fixtures/parameterSchemas.ts"),
    );
    root
}

#[test]
fn report_markdown_summarises_every_endpoint() {
    let root = make_project();
    let out = run(
        &root,
        &[
            "report",
            "--markdown",
            "--endpoint",
            "/jobs/single-doc-job-template",
            "--endpoint",
            "/jobs/multi-docs-job-template",
            "--endpoint",
            "/jobs/no-body",
        ],
    );
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("# paramlint report\n"), "stdout={stdout}");
    assert!(stdout.contains("- Method: POST"), "stdout={stdout}");
    assert!(stdout.contains("## Endpoints (3)"), "stdout={stdout}");
    assert!(
        stdout.contains("| `/jobs/multi-docs-job-template` | success | 3 | 2 | 0 | 0 |"),
        "stdout={stdout}"
    );
    assert!(
        stdout.contains("### `/jobs/single-doc-job-template` (error)"),
        "stdout={stdout}"
    );
    assert!(
        stdout.contains("- **warning** not in specification: `debugMode` (boolean)"),
        "stdout={stdout}"
    );
    assert!(
        stdout.contains("- **error** no request body schema in the specification"),
        "stdout={stdout}"
    );
    assert!(!stdout.contains("\x1b["), "markdown must not carry ANSI codes");

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn report_json_wins_over_markdown() {
    let root = make_project();
    let out = run(
        &root,
        &[
            "--json",
            "report",
            "--markdown",
            "--endpoint",
            "/jobs/multi-docs-job-template",
        ],
    );
    assert_eq!(out.status.code(), Some(0));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    assert_eq!(v["schema_version"], "1.0");
    assert_eq!(v["summary"]["passed"], true);

    let _ = std::fs::remove_dir_all(&root);
}
