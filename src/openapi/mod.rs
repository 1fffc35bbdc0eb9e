use std::path::Path;

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

const MAX_REQUEST_BODY_HOPS: usize = 8;

#[derive(Debug, Clone)]
pub struct SpecDocument {
    root: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode<'a> {
    Reference(&'a str),
    Object {
        properties: &'a Mapping,
        required: Vec<&'a str>,
    },
    Union(&'a [Value]),
    Scalar(&'a str),
}

impl<'a> SchemaNode<'a> {
    pub fn classify(node: &'a Value) -> Self {
        if let Some(reference) = reference_of(node) {
            return SchemaNode::Reference(reference);
        }
        if let Some(alternatives) = node.get("oneOf").and_then(Value::as_sequence) {
            return SchemaNode::Union(alternatives);
        }
        if let Some(properties) = node.get("properties").and_then(Value::as_mapping) {
            let required = node
                .get("required")
                .and_then(Value::as_sequence)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            return SchemaNode::Object {
                properties,
                required,
            };
        }
        SchemaNode::Scalar(type_tag(node))
    }
}

pub fn reference_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

pub fn type_tag(node: &Value) -> &str {
    match node.get("type") {
        Some(Value::String(t)) => return t,
        // 3.1 style `type: [string, "null"]`
        Some(Value::Sequence(types)) => {
            if let Some(t) = types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
            {
                return t;
            }
        }
        _ => {}
    }
    if node.get("oneOf").is_some() {
        "oneOf"
    } else if node.get("properties").is_some() {
        "object"
    } else if node.get("items").is_some() {
        "array"
    } else {
        "unknown"
    }
}

impl SpecDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| {
            format!("failed to read the API specification: {}", path.display())
        })?;
        Self::parse(&text)
            .with_context(|| format!("invalid API specification: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root: Value =
            serde_yaml::from_str(text).context("failed to parse the document as YAML/JSON")?;
        if !root.is_mapping() {
            anyhow::bail!("the document root is not a mapping");
        }
        if root.get("paths").and_then(Value::as_mapping).is_none() {
            anyhow::bail!("the document has no `paths` mapping");
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn endpoint_paths(&self) -> Vec<&str> {
        self.root
            .get("paths")
            .and_then(Value::as_mapping)
            .map(|paths| paths.keys().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn resolve_reference(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix("#/")?;
        let mut current = &self.root;
        for raw in pointer.split('/') {
            let segment = decode_segment(raw);
            current = match current {
                Value::Mapping(map) => map.get(segment.as_str())?,
                Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn request_body_schema(&self, endpoint: &str, method: &str) -> Option<&Value> {
        self.request_body_schema_for(endpoint, method, DEFAULT_CONTENT_TYPE)
    }

    pub fn request_body_schema_for(
        &self,
        endpoint: &str,
        method: &str,
        content_type: &str,
    ) -> Option<&Value> {
        let operation = self
            .root
            .get("paths")?
            .get(endpoint)?
            .get(method.to_ascii_lowercase().as_str())?;

        let mut body = operation.get("requestBody")?;
        let mut hops = 0;
        while let Some(reference) = reference_of(body) {
            hops += 1;
            if hops > MAX_REQUEST_BODY_HOPS {
                return None;
            }
            body = self.resolve_reference(reference)?;
        }

        body.get("content")?.get(content_type)?.get("schema")
    }
}

fn decode_segment(raw: &str) -> String {
    raw.replace("~1", "/").replace("~0", "~")
}
