use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Primitive,
    Object,
    Array,
    OneOf,
}

impl FieldKind {
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "oneOf" => FieldKind::OneOf,
            "array" => FieldKind::Array,
            "object" => FieldKind::Object,
            _ => FieldKind::Primitive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_count: Option<usize>,
    pub has_nested_fields: bool,
}

impl FieldDescriptor {
    pub fn is_union(&self) -> bool {
        self.kind == FieldKind::OneOf
    }
}
