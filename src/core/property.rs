use serde::Serialize;
use serde_yaml::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub path: Vec<String>,
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_schema: Option<Value>,
}

impl PropertyDescriptor {
    pub fn is_union(&self) -> bool {
        self.alternatives.is_some()
    }

    pub fn variant_count(&self) -> usize {
        self.alternatives.as_ref().map_or(0, Vec::len)
    }

    pub fn dotted_path(&self) -> String {
        if self.path.is_empty() {
            return self.name.clone();
        }
        self.path.join(".")
    }
}
