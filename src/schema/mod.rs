use serde_yaml::Value;

use crate::core::PropertyDescriptor;
use crate::openapi::{SchemaNode, SpecDocument, reference_of, type_tag};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub properties: Vec<PropertyDescriptor>,
    pub cycles: Vec<String>,
    pub unresolved: Vec<String>,
}

pub fn extract_properties(doc: &SpecDocument, node: &Value) -> Extraction {
    let mut walker = Walker {
        doc,
        out: Extraction::default(),
    };
    let mut stack = Vec::new();
    walker.walk(node, &[], &mut stack);
    walker.out
}

struct Walker<'a> {
    doc: &'a SpecDocument,
    out: Extraction,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: &'a Value, parent: &[String], stack: &mut Vec<&'a str>) {
        let Some((resolved, followed)) = self.resolve(node, stack) else {
            return;
        };
        let depth = stack.len();
        stack.extend(followed);

        match SchemaNode::classify(resolved) {
            SchemaNode::Union(alternatives) => {
                // Root variants keep the alternative's type, not `oneOf`, and skip the union check.
                for (index, alternative) in alternatives.iter().enumerate() {
                    let tag = self
                        .resolve(alternative, stack)
                        .map(|(v, _)| type_tag(v).to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    self.out.properties.push(PropertyDescriptor {
                        path: parent.to_vec(),
                        name: format!("oneOf_variant_{index}"),
                        required: false,
                        type_tag: tag,
                        alternatives: None,
                        variant_schema: Some(alternative.clone()),
                    });
                }
            }
            SchemaNode::Object {
                properties,
                required,
            } => {
                for (key, prop) in properties {
                    let Some(name) = key.as_str() else {
                        continue;
                    };
                    self.property(name, prop, required.contains(&name), parent, stack);
                }
            }
            SchemaNode::Reference(_) | SchemaNode::Scalar(_) => {}
        }

        stack.truncate(depth);
    }

    fn property(
        &mut self,
        name: &str,
        schema: &'a Value,
        required: bool,
        parent: &[String],
        stack: &mut Vec<&'a str>,
    ) {
        let mut path = parent.to_vec();
        path.push(name.to_string());

        let resolved = self.resolve(schema, stack);
        let tag = resolved
            .as_ref()
            .map_or("unknown", |(v, _)| type_tag(v))
            .to_string();
        self.out.properties.push(PropertyDescriptor {
            path: path.clone(),
            name: name.to_string(),
            required,
            type_tag: tag,
            alternatives: None,
            variant_schema: None,
        });

        let Some((resolved, _)) = resolved else {
            return;
        };
        match SchemaNode::classify(resolved) {
            SchemaNode::Object { .. } => self.walk(schema, &path, stack),
            SchemaNode::Union(alternatives) => {
                self.out.properties.push(PropertyDescriptor {
                    path,
                    name: name.to_string(),
                    required,
                    type_tag: "oneOf".to_string(),
                    alternatives: Some(alternatives.to_vec()),
                    variant_schema: None,
                });
            }
            SchemaNode::Reference(_) | SchemaNode::Scalar(_) => {}
        }
    }

    fn resolve(
        &mut self,
        mut node: &'a Value,
        stack: &[&'a str],
    ) -> Option<(&'a Value, Vec<&'a str>)> {
        let mut followed: Vec<&'a str> = Vec::new();
        while let Some(reference) = reference_of(node) {
            if stack.contains(&reference) || followed.contains(&reference) {
                tracing::debug!(reference, "cyclic schema reference");
                push_unique(&mut self.out.cycles, reference);
                return None;
            }
            followed.push(reference);
            let Some(next) = self.doc.resolve_reference(reference) else {
                tracing::debug!(reference, "unresolved schema reference");
                push_unique(&mut self.out.unresolved, reference);
                return None;
            };
            node = next;
        }
        Some((node, followed))
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
