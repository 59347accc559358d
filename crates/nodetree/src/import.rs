// SPDX-License-Identifier: MIT OR Apache-2.0
//! Import engine: rebuild a hierarchy from a [`Document`].
//!
//! Reconstruction runs in three ordered passes: skeleton, values, sources.
//! Values and connections both need fully constructed endpoints, and a
//! connection's source may live outside the destination's own subtree, so
//! neither can be applied during the recursive skeleton walk. Import is
//! transactional: any failure drops the partially built hierarchy.

use crate::document::Document;
use crate::node::{Hierarchy, NodeError, NodeId};
use crate::port::{Payload, PortError};
use crate::registry::Registry;
use indexmap::IndexMap;
use serde_json::Value;

/// Error raised while importing a document.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The document is not an object of exactly the three required mappings.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A skeleton entry names a type with no registry entry.
    #[error("unexpected type '{typename}' during import")]
    UnknownType {
        /// The unregistered type name.
        typename: String,
    },

    /// A skeleton entry that is none of object, array or string.
    #[error("unexpected value at '{path}' during import")]
    UnexpectedValue {
        /// Path of the offending skeleton entry.
        path: String,
    },

    /// A `values` or `sources` path absent from the imported hierarchy.
    #[error("invalid path '{path}' during import")]
    InvalidPath {
        /// The unresolvable path.
        path: String,
    },

    /// A `values` payload whose JSON shape does not fit the port's kind.
    #[error("mismatched payload for '{path}' during import")]
    PayloadMismatch {
        /// Path of the port being written.
        path: String,
    },

    /// Skeleton construction failure.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Value write or connection failure.
    #[error(transparent)]
    Port(#[from] PortError),
}

/// A hierarchy rebuilt from a document, with its root-name map.
#[derive(Debug)]
pub struct ImportResult {
    /// The reconstructed hierarchy.
    pub hierarchy: Hierarchy,
    /// Root name to root node, in document order.
    pub roots: IndexMap<String, NodeId>,
}

impl ImportResult {
    /// Look up a forest root by name.
    pub fn root(&self, name: &str) -> Option<NodeId> {
        self.roots.get(name).copied()
    }
}

struct Importer<'a> {
    registry: &'a Registry,
    hierarchy: Hierarchy,
    /// Flat path index for O(1) cross-subtree resolution in later passes.
    index: IndexMap<String, NodeId>,
}

impl Importer<'_> {
    fn build(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
        value: &Value,
    ) -> Result<NodeId, ImportError> {
        match value {
            Value::Object(members) => {
                let id = self.hierarchy.add_group(parent, name)?;
                self.index.insert(self.hierarchy.path(id), id);
                for (child_name, child) in members {
                    self.build(Some(id), Some(child_name), child)?;
                }
                Ok(id)
            }
            Value::Array(items) => {
                let id = self.hierarchy.add_array(parent, name)?;
                self.index.insert(self.hierarchy.path(id), id);
                for item in items {
                    self.build(Some(id), None, item)?;
                }
                Ok(id)
            }
            Value::String(typename) => {
                let def =
                    self.registry
                        .get(typename)
                        .ok_or_else(|| ImportError::UnknownType {
                            typename: typename.clone(),
                        })?;
                let id = def.create(&mut self.hierarchy, parent, name)?;
                // Factories may build whole subtrees (custom nodes), so
                // index every descendant, not just the new node.
                self.index_subtree(id);
                Ok(id)
            }
            _ => Err(ImportError::UnexpectedValue {
                path: self.describe(parent, name),
            }),
        }
    }

    fn index_subtree(&mut self, id: NodeId) {
        self.index.insert(self.hierarchy.path(id), id);
        for child in self.hierarchy.children(id) {
            self.index_subtree(child);
        }
    }

    /// Best-effort path for an entry that was rejected before a node existed.
    fn describe(&self, parent: Option<NodeId>, name: Option<&str>) -> String {
        match (parent, name) {
            (Some(parent), Some(name)) => format!("{}.{name}", self.hierarchy.path(parent)),
            (Some(parent), None) => {
                let position = self.hierarchy.children(parent).len();
                format!("{}[{position}]", self.hierarchy.path(parent))
            }
            (None, Some(name)) => name.to_string(),
            (None, None) => String::new(),
        }
    }

    fn resolve(&self, path: &str) -> Result<NodeId, ImportError> {
        self.index
            .get(path)
            .copied()
            .ok_or_else(|| ImportError::InvalidPath {
                path: path.to_string(),
            })
    }
}

impl Registry {
    /// Rebuild a hierarchy from a document.
    ///
    /// Runs the skeleton, values and sources passes in order and returns
    /// the fresh hierarchy with its root map. Any failure discards the
    /// partial hierarchy.
    pub fn import(&self, document: &Document) -> Result<ImportResult, ImportError> {
        let mut importer = Importer {
            registry: self,
            hierarchy: Hierarchy::new(),
            index: IndexMap::new(),
        };

        let mut roots = IndexMap::new();
        for (name, value) in &document.nodes {
            let id = importer.build(None, Some(name), value)?;
            roots.insert(name.clone(), id);
        }
        tracing::trace!(nodes = importer.hierarchy.node_count(), "skeleton pass done");

        for (path, json) in &document.values {
            let id = importer.resolve(path)?;
            let kind = importer
                .hierarchy
                .payload_kind(id)
                .ok_or_else(|| ImportError::InvalidPath { path: path.clone() })?;
            let payload =
                Payload::from_json(kind, json).ok_or_else(|| ImportError::PayloadMismatch {
                    path: path.clone(),
                })?;
            importer.hierarchy.write(id, payload)?;
        }

        for (target_path, source_path) in &document.sources {
            let target = importer.resolve(target_path)?;
            let source = importer.resolve(source_path)?;
            importer.hierarchy.set_source(target, source)?;
        }

        tracing::debug!(
            nodes = importer.hierarchy.node_count(),
            values = document.values.len(),
            sources = document.sources.len(),
            "imported document"
        );
        Ok(ImportResult {
            hierarchy: importer.hierarchy,
            roots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeTypeDef;
    use serde_json::json;

    fn add_node_def() -> NodeTypeDef {
        NodeTypeDef::opaque("AddNode", |h, p, n| {
            let id = h.add_group(p, n)?;
            h.add_input(Some(id), Some("a"), Payload::Int(0))?;
            h.add_input(Some(id), Some("b"), Payload::Int(0))?;
            h.add_output(Some(id), Some("sum"), Payload::Int(0))?;
            Ok(id)
        })
    }

    #[test]
    fn test_custom_import() {
        let registry = Registry::with_types([add_node_def()]);
        let document = Document::from_value(json!({
            "nodes": {
                "root": {
                    "A": "OutputInt",
                    "B": "OutputInt",
                    "C": "InputInt",
                    "adder": "AddNode"
                }
            },
            "values": {
                "root.A": 7,
                "root.B": 11
            },
            "sources": {
                "root.adder.a": "root.A",
                "root.adder.b": "root.B",
                "root.C": "root.adder.sum"
            }
        }))
        .unwrap();

        let mut result = registry.import(&document).unwrap();
        let root = result.root("root").unwrap();
        let h = &mut result.hierarchy;

        let a_out = h.child(root, "A").unwrap();
        let b_out = h.child(root, "B").unwrap();
        let c_in = h.child(root, "C").unwrap();
        let adder = h.child(root, "adder").unwrap();
        assert!(h.is_custom(adder));

        assert_eq!(h.value(a_out).unwrap(), Payload::Int(7));
        assert_eq!(h.value(b_out).unwrap(), Payload::Int(11));
        assert_eq!(h.source(h.child(adder, "a").unwrap()), Some(a_out));
        assert_eq!(h.source(h.child(adder, "b").unwrap()), Some(b_out));
        assert_eq!(h.source(c_in), Some(h.child(adder, "sum").unwrap()));

        let a_in = h.child(adder, "a").unwrap();
        let b_in = h.child(adder, "b").unwrap();
        assert_eq!(h.read(a_in).unwrap(), Payload::Int(7));
        assert_eq!(h.read(b_in).unwrap(), Payload::Int(11));
    }

    #[test]
    fn test_adder_end_to_end() {
        let registry = Registry::with_types([add_node_def()]);
        let mut h = Hierarchy::new();
        let root = h.add_group(None, Some("root")).unwrap();
        let a_out = h.add_output(Some(root), Some("A"), Payload::Int(7)).unwrap();
        let b_out = h.add_output(Some(root), Some("B"), Payload::Int(11)).unwrap();
        let adder = registry.create("AddNode", &mut h, Some(root), Some("adder")).unwrap();
        h.connect(a_out, h.child(adder, "a").unwrap()).unwrap();
        h.connect(b_out, h.child(adder, "b").unwrap()).unwrap();

        let document = registry.export(&h, &[root]).unwrap();
        assert_eq!(document.sources.len(), 2);
        assert_eq!(document.values.get("root.A"), Some(&serde_json::json!(7)));
        assert_eq!(document.values.get("root.B"), Some(&serde_json::json!(11)));

        let mut result = registry.import(&document).unwrap();
        let imp_root = result.root("root").unwrap();
        let imp = &mut result.hierarchy;
        let imp_adder = imp.child(imp_root, "adder").unwrap();
        let a_in = imp.child(imp_adder, "a").unwrap();
        let b_in = imp.child(imp_adder, "b").unwrap();
        assert_eq!(imp.read(a_in).unwrap(), Payload::Int(7));
        assert_eq!(imp.read(b_in).unwrap(), Payload::Int(11));
    }

    #[test]
    fn test_round_trip() {
        let registry = Registry::with_types([add_node_def()]);
        let original = Document::from_value(json!({
            "nodes": {
                "foo": {
                    "x": "OutputBool",
                    "bar": [
                        "OutputInt",
                        { "z": "InputInt" },
                        "AddNode",
                        ["InputBool", "InputBool"]
                    ]
                },
                "extra_root": "AddNode"
            },
            "values": {
                "foo.bar[0]": 3,
                "foo.bar[2].a": 0,
                "foo.bar[2].b": 5,
                "foo.bar[2].sum": 0,
                "foo.bar[3][0]": false,
                "foo.bar[3][1]": true,
                "foo.x": true,
                "extra_root.a": 1,
                "extra_root.b": 2,
                "extra_root.sum": 0
            },
            "sources": {
                "foo.bar[1].z": "foo.bar[0]"
            }
        }))
        .unwrap();

        let result = registry.import(&original).unwrap();
        let roots: Vec<NodeId> = result.roots.values().copied().collect();
        let exported = registry.export(&result.hierarchy, &roots).unwrap();
        assert_eq!(exported, original);
    }

    #[test]
    fn test_import_unknown_type() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "widget": "Mystery" } },
            "values": {},
            "sources": {}
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "unexpected type 'Mystery' during import");
    }

    #[test]
    fn test_import_unexpected_skeleton_value() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "oops": 42 } },
            "values": {},
            "sources": {}
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "unexpected value at 'root.oops' during import");
    }

    #[test]
    fn test_import_invalid_value_path() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "x": "OutputInt" } },
            "values": { "root.nope": 1 },
            "sources": {}
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "invalid path 'root.nope' during import");
    }

    #[test]
    fn test_import_invalid_source_path() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "x": "InputInt" } },
            "values": {},
            "sources": { "root.x": "root.ghost" }
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "invalid path 'root.ghost' during import");
    }

    #[test]
    fn test_import_payload_mismatch() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "x": "OutputInt" } },
            "values": { "root.x": "seven" },
            "sources": {}
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "mismatched payload for 'root.x' during import");
    }

    #[test]
    fn test_import_value_path_addressing_container() {
        let registry = Registry::new();
        let document = Document::from_value(json!({
            "nodes": { "root": { "sub": {} } },
            "values": { "root.sub": 3 },
            "sources": {}
        }))
        .unwrap();
        let err = registry.import(&document).unwrap_err();
        assert_eq!(err.to_string(), "invalid path 'root.sub' during import");
    }

    #[test]
    fn test_ref_round_trip() {
        let mut registry = Registry::new();
        registry.register_ref_types();
        registry.register(NodeTypeDef::opaque("RefableNode", |h, p, n| {
            let id = h.add_group(p, n)?;
            h.add_output_ref(id, Some("ref"))?;
            Ok(id)
        }));
        registry.register(NodeTypeDef::opaque("RefUser", |h, p, n| {
            let id = h.add_group(p, n)?;
            h.add_input_ref(Some(id), Some("ref"))?;
            Ok(id)
        }));

        let mut h = Hierarchy::new();
        let root = h.add_group(None, Some("root")).unwrap();
        let foo = registry.create("RefableNode", &mut h, Some(root), Some("foo")).unwrap();
        let bar = registry.create("RefUser", &mut h, Some(root), Some("bar")).unwrap();
        h.connect(h.child(foo, "ref").unwrap(), h.child(bar, "ref").unwrap())
            .unwrap();

        let document = registry.export(&h, &[root]).unwrap();
        assert!(document.values.is_empty());

        let mut result = registry.import(&document).unwrap();
        let imp_root = result.root("root").unwrap();
        let imp = &mut result.hierarchy;
        let imp_foo = imp.child(imp_root, "foo").unwrap();
        let imp_ref = imp.child(imp.child(imp_root, "bar").unwrap(), "ref").unwrap();
        assert!(imp.is_sourced(imp_ref));
        assert_eq!(imp.read(imp_ref).unwrap(), Payload::Ref(Some(imp_foo)));
    }
}
