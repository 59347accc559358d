// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export engine: serialize a hierarchy into a [`Document`].

use crate::document::Document;
use crate::node::{Hierarchy, NodeId};
use crate::registry::Registry;
use crate::visitor::{visit_all, Visitor};
use serde_json::{Map, Value};

/// Error raised while exporting a hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A custom node whose type name has no registry entry.
    #[error("unexpected node type '{typename}' during export")]
    UnknownNodeType {
        /// The unregistered type name.
        typename: String,
    },

    /// A port whose type name has no registry entry.
    #[error("unexpected value type '{typename}' during export")]
    UnknownValueType {
        /// The unregistered type name.
        typename: String,
    },
}

/// One level of the skeleton under construction. The stack mirrors the
/// nesting of the skeleton being built, not the hierarchy itself: custom
/// nodes push a suppressed marker so their descendants leave no structural
/// trace, while still contributing `values` and `sources` entries.
enum Slot {
    Map(Map<String, Value>),
    Array(Vec<Value>),
    Suppressed,
}

struct ExportVisitor<'a> {
    registry: &'a Registry,
    document: Document,
    stack: Vec<Slot>,
}

impl ExportVisitor<'_> {
    fn can_store(&self) -> bool {
        !matches!(self.stack.last(), Some(Slot::Suppressed))
    }

    /// Record a finished skeleton entry under the current stack top, or at
    /// the document root when the stack is empty.
    fn store(&mut self, hierarchy: &Hierarchy, id: NodeId, value: Value) {
        match self.stack.last_mut() {
            None => {
                if let Some(name) = hierarchy.name(id) {
                    self.document.nodes.insert(name.to_string(), value);
                }
            }
            Some(Slot::Map(map)) => {
                if let Some(name) = hierarchy.name(id) {
                    map.insert(name.to_string(), value);
                }
            }
            Some(Slot::Array(items)) => items.push(value),
            Some(Slot::Suppressed) => {}
        }
    }

    /// Values and sources entries are recorded for every reachable port,
    /// independent of skeleton suppression.
    fn record_port(&mut self, hierarchy: &Hierarchy, id: NodeId) {
        if let Some(source) = hierarchy.source(id) {
            self.document
                .sources
                .insert(hierarchy.path(id), hierarchy.path(source));
        } else if hierarchy.is_persisted(id) {
            if let Ok(payload) = hierarchy.value(id) {
                self.document
                    .values
                    .insert(hierarchy.path(id), payload.to_json());
            }
        }
    }
}

impl Visitor for ExportVisitor<'_> {
    type Error = ExportError;

    fn on_group_enter(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), ExportError> {
        if !self.can_store() {
            self.stack.push(Slot::Suppressed);
            return Ok(());
        }
        if hierarchy.is_custom(id) {
            let typename = hierarchy.typename(id);
            if !self.registry.contains(typename) {
                return Err(ExportError::UnknownNodeType {
                    typename: typename.to_string(),
                });
            }
            self.store(hierarchy, id, Value::String(typename.to_string()));
            self.stack.push(Slot::Suppressed);
        } else {
            self.stack.push(Slot::Map(Map::new()));
        }
        Ok(())
    }

    fn on_group_exit(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), ExportError> {
        if let Some(Slot::Map(map)) = self.stack.pop() {
            self.store(hierarchy, id, Value::Object(map));
        }
        Ok(())
    }

    fn on_array_enter(&mut self, _: &Hierarchy, _: NodeId) -> Result<(), ExportError> {
        if self.can_store() {
            self.stack.push(Slot::Array(Vec::new()));
        } else {
            self.stack.push(Slot::Suppressed);
        }
        Ok(())
    }

    fn on_array_exit(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), ExportError> {
        if let Some(Slot::Array(items)) = self.stack.pop() {
            self.store(hierarchy, id, Value::Array(items));
        }
        Ok(())
    }

    fn on_input(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), ExportError> {
        if self.can_store() {
            let typename = hierarchy.typename(id);
            if !self.registry.contains(typename) {
                return Err(ExportError::UnknownValueType {
                    typename: typename.to_string(),
                });
            }
            self.store(hierarchy, id, Value::String(typename.to_string()));
        }
        self.record_port(hierarchy, id);
        Ok(())
    }

    fn on_output(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), ExportError> {
        if self.can_store() {
            let typename = hierarchy.typename(id);
            if !self.registry.contains(typename) {
                return Err(ExportError::UnknownValueType {
                    typename: typename.to_string(),
                });
            }
            self.store(hierarchy, id, Value::String(typename.to_string()));
        }
        self.record_port(hierarchy, id);
        Ok(())
    }
}

impl Registry {
    /// Export the subtrees rooted at `roots` into a document.
    ///
    /// Every node and port type encountered must be registered. Custom
    /// nodes are recorded opaquely by type name; their descendant ports
    /// still contribute `values` and `sources` entries.
    pub fn export(&self, hierarchy: &Hierarchy, roots: &[NodeId]) -> Result<Document, ExportError> {
        let mut exporter = ExportVisitor {
            registry: self,
            document: Document::default(),
            stack: Vec::new(),
        };
        visit_all(hierarchy, roots, &mut exporter)?;
        tracing::debug!(
            roots = roots.len(),
            values = exporter.document.values.len(),
            sources = exporter.document.sources.len(),
            "exported hierarchy"
        );
        Ok(exporter.document)
    }
}
