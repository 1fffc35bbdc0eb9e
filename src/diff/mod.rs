use std::collections::HashMap;

use crate::core::{ExtraField, FieldDescriptor, MissingField, PropertyDescriptor, UnionIssue};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discrepancies {
    pub missing: Vec<MissingField>,
    pub extra: Vec<ExtraField>,
    pub union_issues: Vec<UnionIssue>,
}

impl Discrepancies {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.union_issues.is_empty()
    }
}

pub fn diff(properties: &[PropertyDescriptor], fields: &[FieldDescriptor]) -> Discrepancies {
    let mut spec_first: Vec<&PropertyDescriptor> = Vec::new();
    let mut spec_by_name: HashMap<&str, &PropertyDescriptor> = HashMap::new();
    let mut spec_union: HashMap<&str, usize> = HashMap::new();
    for p in properties {
        if !spec_by_name.contains_key(p.name.as_str()) {
            spec_by_name.insert(p.name.as_str(), p);
            spec_first.push(p);
        }
        if p.is_union() {
            spec_union.entry(p.name.as_str()).or_insert(p.variant_count());
        }
    }

    let mut ui_first: Vec<&FieldDescriptor> = Vec::new();
    let mut ui_by_name: HashMap<&str, &FieldDescriptor> = HashMap::new();
    let mut ui_union: HashMap<&str, usize> = HashMap::new();
    for f in fields {
        if !ui_by_name.contains_key(f.name.as_str()) {
            ui_by_name.insert(f.name.as_str(), f);
            ui_first.push(f);
        }
        if f.is_union() {
            ui_union
                .entry(f.name.as_str())
                .or_insert(f.variant_count.unwrap_or(0));
        }
    }

    let mut out = Discrepancies::default();

    for p in &spec_first {
        if !ui_by_name.contains_key(p.name.as_str()) {
            out.missing.push(MissingField {
                name: p.name.clone(),
                path: p.dotted_path(),
                type_tag: p.type_tag.clone(),
                required: p.required,
            });
        }
    }

    for f in &ui_first {
        if !spec_by_name.contains_key(f.name.as_str()) {
            out.extra.push(ExtraField {
                name: f.name.clone(),
                type_tag: f.type_tag.clone(),
                required: f.required,
            });
        }
    }

    let mut union_names: Vec<&str> = Vec::new();
    for name in properties
        .iter()
        .filter(|p| p.is_union())
        .map(|p| p.name.as_str())
        .chain(fields.iter().filter(|f| f.is_union()).map(|f| f.name.as_str()))
    {
        if !union_names.contains(&name) {
            union_names.push(name);
        }
    }

    for name in union_names {
        let spec_variants = spec_union.get(name).copied();
        let ui_variants = ui_union.get(name).copied();
        let issue = match (spec_variants, ui_variants) {
            (Some(spec_variants), Some(ui_variants)) if spec_variants != ui_variants => {
                UnionIssue::VariantCount {
                    name: name.to_string(),
                    spec_variants,
                    ui_variants,
                }
            }
            (Some(spec_variants), None) => UnionIssue::NotUnionInUi {
                name: name.to_string(),
                spec_variants,
            },
            (None, Some(ui_variants)) => UnionIssue::NotUnionInSpec {
                name: name.to_string(),
                ui_variants,
            },
            _ => continue,
        };
        out.union_issues.push(issue);
    }

    out
}
