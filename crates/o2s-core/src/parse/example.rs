use serde::{Deserialize, Serialize};

/// An example object attached to a parameter or media type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    /// Not fetched; an example with only an external value carries no data.
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
}

/// A reference or inline example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExampleOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Example(Example),
}

impl ExampleOrRef {
    /// The inline value, if this is a resolved example that carries one.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            ExampleOrRef::Example(example) => example.value.as_ref(),
            ExampleOrRef::Ref { .. } => None,
        }
    }
}
