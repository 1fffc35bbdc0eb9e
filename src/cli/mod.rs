use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;

use crate::config::EffectiveConfig;
use crate::core::{EndpointFinding, EndpointStatus, Severity, ValidationReport};
use crate::engine::{Engine, EngineOptions, Inputs};
use crate::exit::ExitCode;
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "paramlint",
    version,
    about = "Checks that a UI parameter table covers the request bodies declared in an OpenAPI specification"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Project root for relative paths (default: current directory)")]
    pub root: Option<PathBuf>,
    #[arg(long, global = true, help = "OpenAPI document, overrides [spec].path")]
    pub spec: Option<PathBuf>,
    #[arg(long, global = true, help = "Field-table source, overrides [table].path and the search")]
    pub table: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Check(CheckArgs),
    Report(ReportArgs),
    Inspect(InspectArgs),
    Endpoints,
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args, Default)]
pub struct CheckArgs {
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub markdown: bool,
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    pub endpoint: String,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to determine the current directory")?,
    };

    let env_config_path = std::env::var_os("PARAMLINT_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &root,
    )
    .map_err(crate::exit::invalid_args_err)?;

    crate::logging::init(
        cli.verbose,
        cli.quiet,
        stderr_is_tty && cfg.ui.color && !cli.no_color,
    );

    let ui_cfg = UiConfig {
        color: stdout_is_tty && cfg.ui.color && !cli.no_color,
        stdout_is_tty,
        stderr_is_tty,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Check(CheckArgs::default()));

    match command {
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "paramlint", &mut out);
            return Ok(ExitCode::Success);
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    write_json(&cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `paramlint config --show`");
            }
            return Ok(ExitCode::Success);
        }
        _ => {}
    }

    let inputs = load_inputs(&cfg, &root, cli.spec.as_deref(), cli.table.as_deref())?;
    let engine = Engine::new(EngineOptions {
        method: cfg.spec.method.trim().to_ascii_lowercase(),
        content_type: cfg.spec.content_type.clone(),
        show_progress: ui_cfg.stderr_is_tty && !cli.quiet && !cli.json,
    });

    match command {
        Commands::Check(args) => {
            let endpoints = select_endpoints(&cfg, args.endpoints)?;
            let report = engine.validate(&inputs, &endpoints);
            if cli.json {
                write_json(&report)?;
            } else {
                crate::ui::print_report(&report, &ui_cfg);
            }
            Ok(ExitCode::from_passed(report.passed()))
        }
        Commands::Report(args) => {
            let endpoints = select_endpoints(&cfg, args.endpoints)?;
            let report = engine.validate(&inputs, &endpoints);
            if cli.json {
                write_json(&report)?;
            } else if args.markdown {
                write_markdown_report(&report)?;
            } else {
                crate::ui::print_report(&report, &ui_cfg);
            }
            Ok(ExitCode::from_passed(report.passed()))
        }
        Commands::Inspect(args) => {
            let inspection = engine.inspect(&inputs, &args.endpoint);
            if inspection.properties.is_none() && inspection.fields.is_none() {
                let known = inputs.spec.endpoint_paths().join(", ");
                return Err(crate::exit::invalid_args(format!(
                    "unknown endpoint: {} (not in the specification nor in the field table; declared paths: {known})",
                    args.endpoint
                )));
            }
            if cli.json {
                write_json(&inspection)?;
            } else {
                crate::ui::print_inspection(&inspection, &ui_cfg);
            }
            Ok(ExitCode::Success)
        }
        Commands::Endpoints => {
            let entries = engine.endpoints(&inputs, &cfg.endpoints.paths);
            if cli.json {
                write_json(&entries)?;
            } else {
                crate::ui::print_endpoints(&entries, &ui_cfg);
            }
            Ok(ExitCode::Success)
        }
        Commands::Completion(_) | Commands::Config(_) => Ok(ExitCode::Success),
    }
}

fn load_inputs(
    cfg: &EffectiveConfig,
    root: &Path,
    spec_flag: Option<&Path>,
    table_flag: Option<&Path>,
) -> Result<Inputs> {
    let spec_path = spec_flag
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| root.join(&cfg.spec.path));

    let table_path = match (table_flag, &cfg.table.path) {
        (Some(flag), _) => flag.to_owned(),
        (None, Some(path)) => root.join(path),
        (None, None) => crate::fields::locate_table_source(
            &root.join(&cfg.table.search_root),
            &cfg.table.search_glob,
            &cfg.table.exclude,
        )
        .map_err(crate::exit::load_failed_err)?,
    };
    tracing::debug!(
        spec = %spec_path.display(),
        table = %table_path.display(),
        "loading inputs"
    );

    Inputs::load(&spec_path, &table_path, cfg.table.export_name.trim())
        .map_err(crate::exit::load_failed_err)
}

fn select_endpoints(cfg: &EffectiveConfig, requested: Vec<String>) -> Result<Vec<String>> {
    if requested.iter().any(|e| e.trim().is_empty()) {
        return Err(crate::exit::invalid_args("--endpoint must not be empty"));
    }
    let candidates = if requested.is_empty() {
        cfg.endpoints.paths.clone()
    } else {
        requested
    };

    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for endpoint in candidates {
        let endpoint = endpoint.trim().to_string();
        if !out.contains(&endpoint) {
            out.push(endpoint);
        }
    }
    Ok(out)
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(value)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn write_markdown_report(report: &ValidationReport) -> Result<()> {
    use std::io::Write;

    let markdown = format_markdown_report(report);
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(markdown.as_bytes()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn format_markdown_report(report: &ValidationReport) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let s = &report.summary;

    let _ = writeln!(out, "# paramlint report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Tool version: {}", report.tool_version);
    let _ = writeln!(out, "- Generated at: {}", report.generated_at);
    let _ = writeln!(out, "- Specification: `{}`", report.inputs.spec_path);
    let _ = writeln!(out, "- Field table: `{}`", report.inputs.table_path);
    let _ = writeln!(out, "- Method: {}", report.inputs.method);
    let _ = writeln!(
        out,
        "- Result: **{}** (endpoints={}, ok={}, warnings={}, errors={})",
        if s.passed { "PASSED" } else { "FAILED" },
        s.endpoints,
        s.successes,
        s.warnings,
        s.errors
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "## Endpoints ({})", report.endpoints.len());
    let _ = writeln!(out);
    if report.endpoints.is_empty() {
        let _ = writeln!(out, "_No endpoints were checked._");
    } else {
        let _ = writeln!(
            out,
            "| Endpoint | Result | Spec properties | UI fields | Errors | Warnings |"
        );
        let _ = writeln!(out, "|---|---|---:|---:|---:|---:|");
        for f in &report.endpoints {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {} | {} | {} |",
                f.endpoint,
                f.severity(),
                f.spec_properties,
                f.ui_fields,
                f.error_count(),
                f.warning_count()
            );
        }
    }

    for f in report.endpoints.iter().filter(|f| !f.is_success()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "### `{}` ({})", f.endpoint, f.severity());
        let _ = writeln!(out);
        write_markdown_finding(&mut out, f);
    }

    out
}

fn write_markdown_finding(out: &mut String, f: &EndpointFinding) {
    use std::fmt::Write as _;

    match f.status {
        EndpointStatus::NoRequestSchema => {
            let _ = writeln!(
                out,
                "- **error** no request body schema in the specification"
            );
        }
        EndpointStatus::NotAuthored => {
            let _ = writeln!(
                out,
                "- **warning** no fields in the field table (endpoint may not be implemented yet)"
            );
        }
        EndpointStatus::Compared => {}
    }
    for m in &f.missing {
        let _ = writeln!(
            out,
            "- **{}** missing in UI: `{}` ({}, {})",
            m.severity(),
            m.path,
            m.type_tag,
            if m.required { "required" } else { "optional" }
        );
    }
    for e in &f.extra {
        let _ = writeln!(
            out,
            "- **{}** not in specification: `{}` ({})",
            Severity::Warning,
            e.name,
            e.type_tag
        );
    }
    for issue in &f.union_issues {
        let _ = writeln!(out, "- **{}** {issue}", Severity::Error);
    }
    for w in &f.warnings {
        let _ = writeln!(out, "- **{}** {w}", Severity::Warning);
    }
    for note in &f.notes {
        let _ = writeln!(out, "- note: {note}");
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish)"
        ))),
    }
}
