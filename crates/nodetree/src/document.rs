// SPDX-License-Identifier: MIT OR Apache-2.0
//! The three-part wire form a hierarchy serializes to.

use crate::import::ImportError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A serialized hierarchy: structural skeleton, port values, and
/// connections, all keyed by full paths.
///
/// `nodes` holds the skeleton forest: objects are named containers, arrays
/// are indexed containers, and strings are registered type names (ports and
/// custom nodes). `values` maps every reachable persisted port path to its
/// payload, including ports nested beneath custom nodes. `sources` maps each
/// sourced input's path to its source output's path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Structural skeleton, one entry per forest root.
    pub nodes: Map<String, Value>,
    /// Full port path to scalar payload.
    pub values: IndexMap<String, Value>,
    /// Destination input path to source output path.
    pub sources: IndexMap<String, String>,
}

impl Document {
    /// Validate and decode a document from a JSON value. The value must be
    /// an object with exactly the `nodes`, `values` and `sources` mappings.
    pub fn from_value(value: Value) -> Result<Self, ImportError> {
        serde_json::from_value(value).map_err(|e| ImportError::MalformedDocument(e.to_string()))
    }

    /// Validate and decode a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ImportError> {
        serde_json::from_str(text).map_err(|e| ImportError::MalformedDocument(e.to_string()))
    }

    /// Render the document back to a JSON value.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("nodes".to_string(), Value::Object(self.nodes.clone()));
        root.insert(
            "values".to_string(),
            Value::Object(
                self.values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );
        root.insert(
            "sources".to_string(),
            Value::Object(
                self.sources
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        Value::Object(root)
    }
}
