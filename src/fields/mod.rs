use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::core::{FieldDescriptor, FieldKind};
use crate::scan::{self, CodeBytes};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldExtraction {
    pub fields: Vec<FieldDescriptor>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldTable {
    source: String,
    table: Range<usize>,
}

impl FieldTable {
    pub fn load(path: &Path, export_name: &str) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read the field table: {}", path.display()))?;
        Self::parse(source, export_name)
            .with_context(|| format!("invalid field table: {}", path.display()))
    }

    pub fn parse(source: String, export_name: &str) -> Result<Self> {
        let marker = format!("export const {export_name}");
        let start = find_code(&source, &marker)
            .with_context(|| format!("could not find `{marker}` in the source"))?;

        let after = start + marker.len();
        let assign = CodeBytes::new(&source, after, source.len())
            .find(|&(i, b)| b == b'=' && source.as_bytes().get(i + 1) != Some(&b'>'))
            .map(|(i, _)| i)
            .with_context(|| format!("`{marker}` is not assigned a value"))?;
        let open = scan::skip_trivia(&source, assign + 1);
        if source.as_bytes().get(open) != Some(&b'{') {
            anyhow::bail!("`{marker}` is not assigned an object literal");
        }
        let close = scan::matching_close(&source, open)
            .with_context(|| format!("the `{export_name}` object literal is never closed"))?;

        Ok(Self {
            source,
            table: open..close + 1,
        })
    }

    pub fn text(&self) -> &str {
        &self.source[self.table.clone()]
    }

    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        locate_endpoint(self.text(), endpoint).is_some()
    }

    pub fn extract_fields(&self, endpoint: &str) -> Option<FieldExtraction> {
        extract_fields(self.text(), endpoint)
    }
}

pub fn extract_fields(source: &str, endpoint: &str) -> Option<FieldExtraction> {
    let (open, close) = locate_endpoint(source, endpoint)?;

    let mut out = FieldExtraction::default();
    let end = match close {
        Some(close) => close + 1,
        None => {
            tracing::warn!(endpoint, "field list is never closed");
            out.warnings.push(format!(
                "the field list for {endpoint} is never closed; scanned to the end of the table"
            ));
            source.len()
        }
    };
    let list = &source[open..end];

    for (i, b) in CodeBytes::new(list, 0, list.len()) {
        if b != b'{' {
            continue;
        }
        let Some(name_pos) = scan::key_at(list, scan::skip_trivia(list, i + 1), "name") else {
            continue;
        };
        let Some(close) = scan::matching_close(list, i) else {
            let name = scan::quoted_value_at(list, name_pos).unwrap_or("<unnamed>");
            tracing::warn!(endpoint, field = name, "unbalanced field definition");
            out.warnings
                .push(format!("field definition `{name}` is not closed; skipped"));
            continue;
        };
        if let Some(field) = parse_field(&list[i..=close]) {
            out.fields.push(field);
        }
    }

    Some(out)
}

fn locate_endpoint(source: &str, endpoint: &str) -> Option<(usize, Option<usize>)> {
    let bytes = source.as_bytes();
    CodeBytes::new(source, 0, source.len()).find_map(|(i, quote)| {
        if !matches!(quote, b'\'' | b'"' | b'`') || !source[i + 1..].starts_with(endpoint) {
            return None;
        }
        let after = i + 1 + endpoint.len();
        if bytes.get(after) != Some(&quote) {
            return None;
        }
        let colon = scan::skip_trivia(source, after + 1);
        if bytes.get(colon) != Some(&b':') {
            return None;
        }
        let open = scan::skip_trivia(source, colon + 1);
        (bytes.get(open) == Some(&b'[')).then(|| (open, scan::matching_close(source, open)))
    })
}

fn parse_field(span: &str) -> Option<FieldDescriptor> {
    let own = scan::top_level(span);

    let name = scan::quoted_value_after(&own, "name")?.trim();
    if name.is_empty() {
        return None;
    }
    let required = scan::key_positions(&own, "required").any(|pos| scan::word_at(&own, pos, "true"));
    let type_tag = scan::quoted_value_after(&own, "type").unwrap_or("unknown");
    let kind = FieldKind::from_type_tag(type_tag);

    let variant_count = (kind == FieldKind::OneOf).then(|| count_variants(span, &own));
    let has_nested_fields = matches!(kind, FieldKind::Object | FieldKind::Array)
        && scan::key_positions(&own, "fields").any(|pos| own.as_bytes().get(pos) == Some(&b'['));

    Some(FieldDescriptor {
        name: name.to_string(),
        required,
        type_tag: type_tag.to_string(),
        kind,
        variant_count,
        has_nested_fields,
    })
}

/// Counts `label:` keys inside the field's `oneOfOptions` array.
///
/// Approximation: each variant is assumed to carry exactly one `label`, so a
/// label nested deeper inside a variant is counted as another variant.
fn count_variants(span: &str, own: &str) -> usize {
    let Some(open) = scan::key_positions(own, "oneOfOptions")
        .find(|&pos| own.as_bytes().get(pos) == Some(&b'['))
    else {
        return 0;
    };
    let end = scan::matching_close(span, open).map_or(span.len(), |close| close + 1);
    scan::count_keys(&span[open..end], "label")
}

fn find_code(source: &str, needle: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    CodeBytes::new(source, 0, source.len())
        .map(|(i, _)| i)
        .find(|&i| {
            bytes[i..].starts_with(needle.as_bytes())
                && (i == 0 || !scan::is_ident(bytes[i - 1]))
                && !bytes
                    .get(i + needle.len())
                    .is_some_and(|&b| scan::is_ident(b))
        })
}

pub fn locate_table_source(root: &Path, pattern: &str, exclude: &[String]) -> Result<PathBuf> {
    let wanted = Glob::new(pattern)
        .with_context(|| format!("invalid table search glob: {pattern}"))?
        .compile_matcher();
    let excluded = build_globset(exclude)?;

    let mut matches = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        let rel = e.path().strip_prefix(root).unwrap_or(e.path());
        rel.as_os_str().is_empty() || !excluded.is_match(rel)
    }) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if wanted.is_match(rel) {
            matches.push(entry.into_path());
        }
    }

    matches.sort();
    matches.into_iter().next().with_context(|| {
        format!(
            "no file matching `{pattern}` under {} (set [table].path or --table)",
            root.display()
        )
    })
}

pub fn validate_excludes(exclude: &[String]) -> Result<()> {
    build_globset(exclude).map(|_| ())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build exclude patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    const TABLE: &str = r#"
import { ParameterField } from '../types';

// Field definitions per endpoint. Keep keys in sync with the API spec.
export const parameterSchemas: Record<string, ParameterField[]> = {
  '/jobs/single-doc-job-template': [
    {
      name: 'documentSourceIdentifier',
      type: 'string',
      required: true,
      placeholder: 'e.g. {id: 1}',
    },
    {
      name: 'recipientAddress',
      type: 'object',
      fields: [
        { name: 'city', type: 'string', required: true },
        { name: 'zip', type: 'string' },
      ],
    },
    {
      name: 'deliveryMethod',
      type: 'oneOf',
      required: true,
      oneOfOptions: [
        { label: 'Email', value: 'email', fields: [{ name: 'emailAddress', type: 'string' }] },
        { label: 'Post', value: 'post' },
      ],
    },
  ],
  '/jobs/single-doc-job-template-v2': [
    { name: 'other', type: 'boolean' },
  ],
  "/jobs/empty": [],
};
"#;

    fn table() -> FieldTable {
        FieldTable::parse(TABLE.to_string(), "parameterSchemas").expect("parse table")
    }

    fn names(ex: &FieldExtraction) -> Vec<&str> {
        ex.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn extracts_fields_in_discovery_order_including_nested() {
        let ex = table()
            .extract_fields("/jobs/single-doc-job-template")
            .expect("endpoint present");
        assert_eq!(
            names(&ex),
            vec![
                "documentSourceIdentifier",
                "recipientAddress",
                "city",
                "zip",
                "deliveryMethod",
                "emailAddress",
            ]
        );
        assert!(ex.warnings.is_empty());
    }

    #[test]
    fn required_flag_ignores_nested_children() {
        let ex = table()
            .extract_fields("/jobs/single-doc-job-template")
            .expect("endpoint present");
        let by_name = |n: &str| ex.fields.iter().find(|f| f.name == n).expect(n).clone();
        assert!(by_name("documentSourceIdentifier").required);
        assert!(!by_name("recipientAddress").required);
        assert!(by_name("city").required);
        assert!(!by_name("zip").required);

        let address = by_name("recipientAddress");
        assert_eq!(address.kind, FieldKind::Object);
        assert!(address.has_nested_fields);
        assert_eq!(address.variant_count, None);
    }

    #[test]
    fn union_variants_are_counted_by_label() {
        let ex = table()
            .extract_fields("/jobs/single-doc-job-template")
            .expect("endpoint present");
        let delivery = ex
            .fields
            .iter()
            .find(|f| f.name == "deliveryMethod")
            .expect("deliveryMethod");
        assert_eq!(delivery.kind, FieldKind::OneOf);
        assert_eq!(delivery.variant_count, Some(2));
        assert!(delivery.required);
        assert!(!delivery.has_nested_fields);
    }

    #[test]
    fn nested_labels_inflate_the_variant_count() {
        let src = r#"{ '/x': [
            { name: 'pick', type: 'oneOf', oneOfOptions: [
                { label: 'A', fields: [{ name: 'inner', type: 'select', options: [{ label: 'i' }] }] },
                { label: 'B' },
            ] },
        ] }"#;
        let ex = extract_fields(src, "/x").expect("endpoint");
        assert_eq!(ex.fields[0].variant_count, Some(3));
    }

    #[test]
    fn endpoint_keys_anchor_on_quotes() {
        let table = table();
        let v2 = table
            .extract_fields("/jobs/single-doc-job-template-v2")
            .expect("v2 present");
        assert_eq!(names(&v2), vec!["other"]);
        assert!(table.extract_fields("/jobs/single-doc").is_none());
        assert!(table.extract_fields("/jobs/unknown").is_none());
        assert!(!table.has_endpoint("/jobs/single-doc"));
    }

    #[test]
    fn empty_entry_is_present_but_has_no_fields() {
        let ex = table().extract_fields("/jobs/empty").expect("present");
        assert!(ex.fields.is_empty());
    }

    #[test]
    fn whitespace_and_order_of_unrelated_fields_do_not_matter() {
        let a = r#"{ '/x': [ { name: 'a', type: 'string', required: true }, { name: 'b', type: 'number' } ] }"#;
        let b = "{\n  '/x'  :\n  [\n    {\n      name:'b',\n      type:'number'\n    },\n    {\n      name : 'a' ,\n      required :  true,\n      type : 'string'\n    }\n  ]\n}";
        let mut fa = extract_fields(a, "/x").expect("a").fields;
        let mut fb = extract_fields(b, "/x").expect("b").fields;
        fa.sort_by(|x, y| x.name.cmp(&y.name));
        fb.sort_by(|x, y| x.name.cmp(&y.name));
        assert_eq!(fa, fb);
    }

    #[test]
    fn unclosed_field_is_skipped_with_a_warning() {
        let src = "{ '/x': [ { name: 'ok', type: 'string' }, { name: 'broken', type: 'string', ";
        let ex = extract_fields(src, "/x").expect("endpoint");
        assert_eq!(names(&ex), vec!["ok"]);
        assert_eq!(ex.warnings.len(), 2, "{:?}", ex.warnings);
        assert!(ex.warnings.iter().any(|w| w.contains("broken")));
    }

    #[test]
    fn nameless_fields_are_discarded() {
        let src = "{ '/x': [ { name: '', type: 'string' }, { name: someConst }, { type: 'string' }, { name: 'kept' } ] }";
        let ex = extract_fields(src, "/x").expect("endpoint");
        assert_eq!(names(&ex), vec!["kept"]);
        assert_eq!(ex.fields[0].type_tag, "unknown");
        assert_eq!(ex.fields[0].kind, FieldKind::Primitive);
    }

    #[test]
    fn parse_requires_the_export() {
        let err = FieldTable::parse("const other = {};".to_string(), "parameterSchemas")
            .expect_err("missing export");
        assert!(err.to_string().contains("export const parameterSchemas"));
        assert!(
            FieldTable::parse(
                "export const parameterSchemasV2 = {};".to_string(),
                "parameterSchemas"
            )
            .is_err()
        );
        assert!(
            FieldTable::parse("export const parameterSchemas = {".to_string(), "parameterSchemas")
                .is_err()
        );
    }

    #[test]
    fn keys_outside_the_exported_table_are_ignored() {
        let src = "const draft = { '/x': [ { name: 'draft' } ] };\nexport const parameterSchemas = { '/y': [] };".to_string();
        let table = FieldTable::parse(src, "parameterSchemas").expect("parse");
        assert!(table.extract_fields("/x").is_none());
        assert!(table.extract_fields("/y").is_some());
    }

    #[test]
    fn locate_table_source_respects_excludes() {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "paramlint-locate-test-{}-{seq}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("node_modules/pkg")).expect("mkdirs");
        std::fs::create_dir_all(root.join("src/data")).expect("mkdirs");
        std::fs::write(root.join("node_modules/pkg/parameterSchemas.ts"), "x").expect("write");
        std::fs::write(root.join("src/data/parameterSchemas.ts"), "x").expect("write");

        let found = locate_table_source(
            &root,
            "**/parameterSchemas.ts",
            &["node_modules".to_string(), "**/node_modules".to_string()],
        )
        .expect("found");
        assert_eq!(found, root.join("src/data/parameterSchemas.ts"));

        assert!(locate_table_source(&root, "**/missing.ts", &[]).is_err());
        assert!(validate_excludes(&["[".to_string()]).is_err());

        let _ = std::fs::remove_dir_all(&root);
    }
}
