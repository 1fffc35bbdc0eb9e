use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "paramlint.toml";

const DEFAULT_ENDPOINTS: [&str; 9] = [
    "/jobs/single-doc-job-template",
    "/jobs/single-pdf-address-capture",
    "/jobs/single-pdf-split",
    "/jobs/multi-docs-job-template",
    "/jobs/multi-doc-merge-job-template",
    "/jobs/multi-pdf-address-capture",
    "/jobs/submit-multi-doc-with-template",
    "/jobs/split-pdf-with-capture",
    "/jobs/merge-multi-doc-with-template",
];

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub spec: SpecConfig,
    pub table: TableConfig,
    pub endpoints: EndpointsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecConfig {
    pub path: String,
    pub method: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub search_root: String,
    pub search_glob: String,
    pub exclude: Vec<String>,
    pub export_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointsConfig {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            spec: SpecConfig {
                path: "frontend/data/reference/c2mapiv2-openapi-spec-final.yaml".to_string(),
                method: "post".to_string(),
                content_type: crate::openapi::DEFAULT_CONTENT_TYPE.to_string(),
            },
            table: TableConfig {
                path: None,
                search_root: "frontend/src".to_string(),
                search_glob: "**/parameterSchemas.ts".to_string(),
                exclude: vec!["**/node_modules/**".to_string()],
                export_name: "parameterSchemas".to_string(),
            },
            endpoints: EndpointsConfig {
                paths: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            },
            ui: UiConfig {
                color: true,
                max_table_rows: 10,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    spec: Option<RawSpecConfig>,
    table: Option<RawTableConfig>,
    endpoints: Option<RawEndpointsConfig>,
    ui: Option<RawUiConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSpecConfig {
    path: Option<String>,
    method: Option<String>,
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTableConfig {
    path: Option<String>,
    search_root: Option<String>,
    search_glob: Option<String>,
    exclude: Option<Vec<String>>,
    export_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEndpointsConfig {
    paths: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

pub fn load(config_path: Option<&Path>, root: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let explicit = config_path.is_some();
    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(root));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    } else if explicit {
        anyhow::bail!("config file not found: {}", path.display());
    }

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(spec) = raw.spec {
        if let Some(path) = spec.path {
            cfg.spec.path = path;
        }
        if let Some(method) = spec.method {
            cfg.spec.method = method;
        }
        if let Some(content_type) = spec.content_type {
            cfg.spec.content_type = content_type;
        }
    }

    if let Some(table) = raw.table {
        if let Some(path) = table.path {
            cfg.table.path = Some(path);
        }
        if let Some(search_root) = table.search_root {
            cfg.table.search_root = search_root;
        }
        if let Some(search_glob) = table.search_glob {
            cfg.table.search_glob = search_glob;
        }
        if let Some(exclude) = table.exclude {
            cfg.table.exclude = exclude;
        }
        if let Some(export_name) = table.export_name {
            cfg.table.export_name = export_name;
        }
    }

    if let Some(endpoints) = raw.endpoints {
        if let Some(paths) = endpoints.paths {
            cfg.endpoints.paths = paths;
        }
    }

    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Some(v) = non_empty_env("PARAMLINT_SPEC_PATH") {
        cfg.spec.path = v;
    }
    if let Some(v) = non_empty_env("PARAMLINT_SPEC_METHOD") {
        cfg.spec.method = v;
    }
    if let Some(v) = non_empty_env("PARAMLINT_SPEC_CONTENT_TYPE") {
        cfg.spec.content_type = v;
    }
    if let Some(v) = non_empty_env("PARAMLINT_TABLE_PATH") {
        cfg.table.path = Some(v);
    }
    if let Some(v) = non_empty_env("PARAMLINT_TABLE_EXPORT") {
        cfg.table.export_name = v;
    }
    if let Ok(v) = std::env::var("PARAMLINT_ENDPOINTS") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.endpoints.paths = parts;
        }
    }
    if let Ok(v) = std::env::var("PARAMLINT_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "PARAMLINT_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("PARAMLINT_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "PARAMLINT_UI_MAX_TABLE_ROWS")?;
    }

    Ok(())
}

fn validate(cfg: &EffectiveConfig) -> Result<()> {
    let method = cfg.spec.method.trim().to_ascii_lowercase();
    if !matches!(
        method.as_str(),
        "get" | "put" | "post" | "delete" | "options" | "head" | "patch" | "trace"
    ) {
        anyhow::bail!("unsupported HTTP method: {}", cfg.spec.method);
    }
    if cfg.table.export_name.trim().is_empty() {
        anyhow::bail!("[table].export_name must not be empty");
    }
    if let Some(empty) = cfg.endpoints.paths.iter().find(|p| p.trim().is_empty()) {
        anyhow::bail!("[endpoints].paths contains an empty entry: {empty:?}");
    }
    crate::fields::validate_excludes(&cfg.table.exclude)
}

fn non_empty_env(key: &str) -> Option<String> {
    let v = std::env::var(key).ok()?;
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool(" YES ").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn raw_config_overrides_only_given_keys() {
        let mut cfg = EffectiveConfig::default();
        let raw: RawConfig = toml::from_str(
            r#"
[spec]
path = "api/openapi.json"

[endpoints]
paths = ["/a", "/b"]

[ui]
max_table_rows = 3
"#,
        )
        .unwrap();
        apply_raw_config(&mut cfg, raw);
        assert_eq!(cfg.spec.path, "api/openapi.json");
        assert_eq!(cfg.spec.method, "post");
        assert_eq!(cfg.endpoints.paths, vec!["/a", "/b"]);
        assert_eq!(cfg.ui.max_table_rows, 3);
        assert!(cfg.ui.color);
        assert_eq!(cfg.table.export_name, "parameterSchemas");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<RawConfig>("[spec]\npth = \"typo\"\n").is_err());
    }

    #[test]
    fn defaults_list_the_job_endpoints_in_order() {
        let cfg = EffectiveConfig::default();
        assert_eq!(cfg.endpoints.paths.len(), 9);
        assert_eq!(cfg.endpoints.paths[0], "/jobs/single-doc-job-template");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = EffectiveConfig::default();
        cfg.spec.method = "fetch".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = EffectiveConfig::default();
        cfg.endpoints.paths.push("  ".to_string());
        assert!(validate(&cfg).is_err());

        let mut cfg = EffectiveConfig::default();
        cfg.table.exclude = vec!["[".to_string()];
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" /a, ,/b ,"), vec!["/a", "/b"]);
    }
}
