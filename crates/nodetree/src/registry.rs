// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed type-name registry used by export and import.

use crate::node::{Hierarchy, NodeError, NodeId};
use crate::port::Payload;
use indexmap::IndexMap;

/// Factory constructing an instance of a registered type under
/// `(parent, name)`.
pub type NodeFactory =
    Box<dyn Fn(&mut Hierarchy, Option<NodeId>, Option<&str>) -> Result<NodeId, NodeError>>;

/// A registered node or port type: a unique type name, a factory, and
/// whether instances serialize opaquely by type name alone.
pub struct NodeTypeDef {
    name: String,
    opaque: bool,
    factory: NodeFactory,
}

impl NodeTypeDef {
    /// Define a transparent type: instances are structurally recorded
    /// during export.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&mut Hierarchy, Option<NodeId>, Option<&str>) -> Result<NodeId, NodeError>
            + 'static,
    {
        Self {
            name: name.into(),
            opaque: false,
            factory: Box::new(factory),
        }
    }

    /// Define an opaque (custom) node type: the factory builds the node's
    /// fixed descendant shape, and export records instances by type name
    /// alone.
    pub fn opaque<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&mut Hierarchy, Option<NodeId>, Option<&str>) -> Result<NodeId, NodeError>
            + 'static,
    {
        Self {
            name: name.into(),
            opaque: true,
            factory: Box::new(factory),
        }
    }

    /// The unique registered type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether instances are serialized opaquely by type name.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Construct an instance under `(parent, name)`.
    pub fn create(
        &self,
        hierarchy: &mut Hierarchy,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        let id = (self.factory)(hierarchy, parent, name)?;
        if self.opaque {
            hierarchy.mark_custom(id, &self.name)?;
        }
        Ok(id)
    }
}

/// Name-keyed table of node and port types, built once per application.
///
/// A fresh registry always carries the eight standard scalar port types
/// (`InputInt`/`OutputInt` through `InputBool`/`OutputBool`). Registering a
/// type under an existing name replaces the earlier entry.
pub struct Registry {
    types: IndexMap<String, NodeTypeDef>,
}

impl Registry {
    /// A registry holding only the standard scalar port types.
    pub fn new() -> Self {
        let mut registry = Self {
            types: IndexMap::new(),
        };
        registry.register(NodeTypeDef::new("InputInt", |h, p, n| {
            h.add_input(p, n, Payload::Int(0))
        }));
        registry.register(NodeTypeDef::new("InputFloat", |h, p, n| {
            h.add_input(p, n, Payload::Float(0.0))
        }));
        registry.register(NodeTypeDef::new("InputString", |h, p, n| {
            h.add_input(p, n, Payload::Str(String::new()))
        }));
        registry.register(NodeTypeDef::new("InputBool", |h, p, n| {
            h.add_input(p, n, Payload::Bool(false))
        }));
        registry.register(NodeTypeDef::new("OutputInt", |h, p, n| {
            h.add_output(p, n, Payload::Int(0))
        }));
        registry.register(NodeTypeDef::new("OutputFloat", |h, p, n| {
            h.add_output(p, n, Payload::Float(0.0))
        }));
        registry.register(NodeTypeDef::new("OutputString", |h, p, n| {
            h.add_output(p, n, Payload::Str(String::new()))
        }));
        registry.register(NodeTypeDef::new("OutputBool", |h, p, n| {
            h.add_output(p, n, Payload::Bool(false))
        }));
        registry
    }

    /// A registry with the standard types plus the given application types.
    pub fn with_types(types: impl IntoIterator<Item = NodeTypeDef>) -> Self {
        let mut registry = Self::new();
        for def in types {
            registry.register(def);
        }
        registry
    }

    /// Register the node reference port types (`InputRef`, `OutputRef`).
    pub fn register_ref_types(&mut self) {
        self.register(NodeTypeDef::new("InputRef", |h, p, n| h.add_input_ref(p, n)));
        self.register(NodeTypeDef::new("OutputRef", |h, p, n| {
            h.add_output(p, n, Payload::Ref(p))
        }));
    }

    /// Register a type, replacing any earlier entry of the same name.
    pub fn register(&mut self, def: NodeTypeDef) {
        self.types.insert(def.name.clone(), def);
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&NodeTypeDef> {
        self.types.get(name)
    }

    /// Whether a type name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Construct an instance of a registered type. Fails with
    /// [`NodeError::UnknownType`] for unregistered names.
    pub fn create(
        &self,
        name: &str,
        hierarchy: &mut Hierarchy,
        parent: Option<NodeId>,
        child_name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        let def = self.get(name).ok_or_else(|| NodeError::UnknownType {
            typename: name.to_string(),
        })?;
        def.create(hierarchy, parent, child_name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
