use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vertex document as loaded from storage: its id plus named attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VertexRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub document: BTreeMap<String, Value>,
}

impl VertexRecord {
    pub fn new(id: impl Into<String>, document: BTreeMap<String, Value>) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.document.clone();
        map.insert("_id".to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

/// A directed edge document with `_from`/`_to` identifiers and attributes
/// (e.g. a weight field projected by programs via `attrib`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeRecord {
    #[serde(rename = "_from")]
    pub from: String,
    #[serde(rename = "_to")]
    pub to: String,
    #[serde(flatten)]
    pub document: BTreeMap<String, Value>,
}

impl EdgeRecord {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        document: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            document,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.document.clone();
        map.insert("_from".to_string(), Value::String(self.from.clone()));
        map.insert("_to".to_string(), Value::String(self.to.clone()));
        Value::Object(map)
    }
}
