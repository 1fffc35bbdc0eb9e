use anyhow::Error;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

use crate::core::{EndpointFinding, EndpointStatus, Severity, ValidationReport};
use crate::engine::{EndpointEntry, Inspection};

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stdout_is_tty: bool,
    pub stderr_is_tty: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(stderr, "  - re-run with `--verbose` for details");
    let _ = writeln!(
        stderr,
        "  - see `paramlint --help` for the available commands and options"
    );
}

pub fn print_report(report: &ValidationReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    write_report(&mut out, report, cfg);
}

fn write_report(out: &mut dyn Write, report: &ValidationReport, cfg: &UiConfig) {
    let _ = writeln!(
        out,
        "Checking {} request bodies against {}",
        report.inputs.method, report.inputs.table_path
    );
    let _ = writeln!(out, "  specification: {}", report.inputs.spec_path);
    let _ = writeln!(out);

    print_endpoint_table(out, &report.endpoints, cfg.color);

    let successes: Vec<&EndpointFinding> =
        report.endpoints.iter().filter(|f| f.is_success()).collect();
    if !successes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} ({}):",
            paint("Successes", severity_code(Severity::Success), cfg.color),
            successes.len()
        );
        for finding in successes {
            let _ = writeln!(
                out,
                "- {}: all {} fields match the specification",
                finding.endpoint, finding.ui_fields
            );
        }
    }

    for severity in [Severity::Error, Severity::Warning] {
        let group: Vec<&EndpointFinding> = report
            .endpoints
            .iter()
            .filter(|f| f.severity() == severity)
            .collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let title = match severity {
            Severity::Error => "Errors",
            _ => "Warnings",
        };
        let _ = writeln!(
            out,
            "{} ({}):",
            paint(title, severity_code(severity), cfg.color),
            group.len()
        );
        for finding in group {
            write_finding_details(out, finding, cfg);
        }
    }

    if cfg.verbose {
        let noted: Vec<&EndpointFinding> = report
            .endpoints
            .iter()
            .filter(|f| !f.notes.is_empty())
            .collect();
        if !noted.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Notes:");
            for finding in noted {
                let _ = writeln!(out, "- {}", finding.endpoint);
                for note in &finding.notes {
                    let _ = writeln!(out, "  - {note}");
                }
            }
        }
    }

    let s = &report.summary;
    let _ = writeln!(out);
    let verdict = if s.passed {
        paint("PASSED", severity_code(Severity::Success), cfg.color)
    } else {
        paint("FAILED", severity_code(Severity::Error), cfg.color)
    };
    let _ = writeln!(
        out,
        "Summary: {verdict}  endpoints={}  ok={}  warnings={}  errors={}",
        s.endpoints, s.successes, s.warnings, s.errors
    );
}

fn write_finding_details(out: &mut dyn Write, finding: &EndpointFinding, cfg: &UiConfig) {
    let _ = writeln!(out, "- {}", finding.endpoint);
    match finding.status {
        EndpointStatus::NoRequestSchema => {
            let _ = writeln!(out, "  - no request body schema in the specification");
        }
        EndpointStatus::NotAuthored => {
            let _ = writeln!(
                out,
                "  - no fields in the field table (endpoint may not be implemented yet)"
            );
        }
        EndpointStatus::Compared => {}
    }

    let limit = cfg.max_table_rows.max(1);
    let mut lines: Vec<String> = Vec::new();
    for m in &finding.missing {
        let severity = m.severity();
        let label = paint(severity.as_str(), severity_code(severity), cfg.color);
        let required = if m.required { "required" } else { "optional" };
        lines.push(format!(
            "[{label}] missing in UI: {} ({}, {required})",
            m.path, m.type_tag
        ));
    }
    for e in &finding.extra {
        let label = paint("warning", severity_code(Severity::Warning), cfg.color);
        lines.push(format!(
            "[{label}] not in specification: {} ({})",
            e.name, e.type_tag
        ));
    }
    for issue in &finding.union_issues {
        let label = paint("error", severity_code(Severity::Error), cfg.color);
        lines.push(format!("[{label}] {issue}"));
    }
    for w in &finding.warnings {
        let label = paint("warning", severity_code(Severity::Warning), cfg.color);
        lines.push(format!("[{label}] {w}"));
    }

    let shown = if cfg.verbose {
        lines.len()
    } else {
        lines.len().min(limit)
    };
    for line in lines.iter().take(shown) {
        let _ = writeln!(out, "  - {line}");
    }
    if lines.len() > shown {
        let _ = writeln!(out, "  - ... ({} more)", lines.len() - shown);
    }
}

fn print_endpoint_table(out: &mut dyn Write, findings: &[EndpointFinding], color: bool) {
    let label_endpoint = "ENDPOINT";
    let label_result = "RESULT";
    let label_spec = "SPEC";
    let label_ui = "UI";

    let endpoint_w = findings
        .iter()
        .map(|f| visible_width_ansi(&f.endpoint))
        .max()
        .unwrap_or(0)
        .max(visible_width_ansi(label_endpoint));
    let result_w = visible_width_ansi(label_result).max(7);
    let spec_w = visible_width_ansi(label_spec);
    let ui_w = visible_width_ansi(label_ui).max(4);

    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        pad_end_display(label_endpoint, endpoint_w),
        pad_end_display(label_result, result_w),
        pad_start_display(label_spec, spec_w),
        pad_start_display(label_ui, ui_w),
    );
    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        "-".repeat(endpoint_w),
        "-".repeat(result_w),
        "-".repeat(spec_w),
        "-".repeat(ui_w)
    );

    for finding in findings {
        let endpoint = pad_end_display(&finding.endpoint, endpoint_w);
        let result = pad_end_display(&format_result(finding, color), result_w);
        let spec = pad_start_display(&finding.spec_properties.to_string(), spec_w);
        let ui = pad_start_display(&finding.ui_fields.to_string(), ui_w);
        let _ = writeln!(out, "{endpoint}  {result}  {spec}  {ui}");
    }
}

fn format_result(finding: &EndpointFinding, color: bool) -> String {
    let severity = finding.severity();
    let label = match (severity, finding.status) {
        (_, EndpointStatus::NotAuthored) => "skipped",
        (Severity::Success, _) => "ok",
        (Severity::Warning, _) => "warning",
        (Severity::Error, _) => "error",
    };
    paint(label, severity_code(severity), color)
}

pub fn print_inspection(inspection: &Inspection, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", inspection.endpoint);

    let _ = writeln!(out);
    match &inspection.properties {
        None => {
            let _ = writeln!(out, "Specification: no request body schema");
        }
        Some(props) => {
            let _ = writeln!(out, "Specification properties ({}):", props.len());
            let rows: Vec<[String; 4]> = props
                .iter()
                .map(|p| {
                    [
                        p.dotted_path(),
                        p.type_tag.clone(),
                        yes_no(p.required).to_string(),
                        if p.is_union() {
                            p.variant_count().to_string()
                        } else {
                            String::new()
                        },
                    ]
                })
                .collect();
            print_rows(&mut out, ["PATH", "TYPE", "REQUIRED", "VARIANTS"], &rows);
        }
    }

    let _ = writeln!(out);
    match &inspection.fields {
        None => {
            let _ = writeln!(out, "Field table: no entry");
        }
        Some(fields) => {
            let _ = writeln!(out, "Field table fields ({}):", fields.len());
            let rows: Vec<[String; 4]> = fields
                .iter()
                .map(|f| {
                    [
                        f.name.clone(),
                        f.type_tag.clone(),
                        yes_no(f.required).to_string(),
                        f.variant_count.map(|n| n.to_string()).unwrap_or_default(),
                    ]
                })
                .collect();
            print_rows(&mut out, ["NAME", "TYPE", "REQUIRED", "VARIANTS"], &rows);
        }
    }

    if !inspection.warnings.is_empty() {
        let _ = writeln!(out);
        for w in &inspection.warnings {
            let label = paint("warning", severity_code(Severity::Warning), cfg.color);
            let _ = writeln!(out, "[{label}] {w}");
        }
    }
    if cfg.verbose {
        for note in &inspection.notes {
            let _ = writeln!(out, "note: {note}");
        }
    }
}

pub fn print_endpoints(entries: &[EndpointEntry], cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|e| {
            let schema = if e.has_request_schema {
                paint("yes", severity_code(Severity::Success), cfg.color)
            } else {
                paint("no", severity_code(Severity::Error), cfg.color)
            };
            let authored = if e.authored {
                paint("yes", severity_code(Severity::Success), cfg.color)
            } else {
                paint("no", severity_code(Severity::Warning), cfg.color)
            };
            [e.endpoint.clone(), schema, authored, e.ui_fields.to_string()]
        })
        .collect();
    print_rows(&mut out, ["ENDPOINT", "SCHEMA", "AUTHORED", "FIELDS"], &rows);
}

fn print_rows(out: &mut dyn Write, header: [&str; 4], rows: &[[String; 4]]) {
    let mut widths = header.map(visible_width_ansi);
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(visible_width_ansi(cell));
        }
    }

    let line = |cells: [&str; 4]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| pad_end_display(c, w))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let _ = writeln!(out, "{}", line(header));
    let rule = widths.map(|w| "-".repeat(w));
    let _ = writeln!(out, "{}", line(rule.each_ref().map(String::as_str)));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.each_ref().map(String::as_str)));
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn severity_code(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "32",
        Severity::Warning => "33",
        Severity::Error => "31",
    }
}

fn paint(s: &str, code: &str, color: bool) -> String {
    if !color {
        return s.to_string();
    }
    format!("\x1b[{code}m{s}\x1b[0m")
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_start_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{}{}", " ".repeat(width - w), s)
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}
