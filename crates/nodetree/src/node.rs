// SPDX-License-Identifier: MIT OR Apache-2.0
//! The ownership hierarchy: an arena of nodes with named and indexed containers.

use crate::port::Payload;
use indexmap::IndexMap;
use std::fmt;

/// Handle to a node inside a [`Hierarchy`] arena.
///
/// Handles are minted by the hierarchy that owns the node and are only
/// meaningful against that hierarchy; indexing with a handle from another
/// hierarchy panics or addresses an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// How a node is addressed under its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alias {
    /// A caller-supplied name under a named container (or a root name).
    Name(String),
    /// A positional alias assigned by an indexed container.
    Index(usize),
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Closed set of node kinds in the hierarchy.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Named container: children keyed by unique sibling name, in
    /// registration order. `custom` marks instances serialized opaquely
    /// by type name.
    Group {
        children: IndexMap<String, NodeId>,
        custom: bool,
    },
    /// Indexed container: unnamed children addressed by append position.
    Array { children: Vec<NodeId> },
    /// Input port: payload slot plus an optional source output.
    Input {
        payload: Payload,
        source: Option<NodeId>,
        persisted: bool,
    },
    /// Output port: payload slot, fan-out unrestricted.
    Output { payload: Payload, persisted: bool },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) alias: Alias,
    pub(crate) parent: Option<NodeId>,
    pub(crate) typename: String,
    pub(crate) kind: NodeKind,
}

/// Error raised for invalid parent/child relationships.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Unparented nodes are addressable only by name.
    #[error("unparented nodes must be named")]
    UnnamedRoot,

    /// The requested parent cannot own children.
    #[error("cannot parent to non-container \"{parent}\"")]
    NotAContainer {
        /// Path of the rejected parent.
        parent: String,
    },

    /// Named containers reject unnamed children.
    #[error("children of \"{parent}\" must be named")]
    UnnamedChild {
        /// Path of the parent container.
        parent: String,
    },

    /// Sibling names must be unique within a named container.
    #[error("\"{parent}\" already has a child named '{name}'")]
    DuplicateChild {
        /// Path of the parent container.
        parent: String,
        /// The colliding name.
        name: String,
    },

    /// Indexed containers assign positional aliases themselves.
    #[error("indexed children must not be named: found '{name}' under \"{parent}\"")]
    NamedArrayChild {
        /// Path of the parent container.
        parent: String,
        /// The offending explicit name.
        name: String,
    },

    /// Lookup of a child name that is not registered.
    #[error("\"{parent}\" has no child named '{name}'")]
    NoSuchChild {
        /// Path of the parent container.
        parent: String,
        /// The missing name.
        name: String,
    },

    /// Positional lookup outside the container's bounds.
    #[error("index {index} out of bounds for \"{parent}\" with {len} children")]
    IndexOutOfBounds {
        /// Path of the parent container.
        parent: String,
        /// The requested position.
        index: usize,
        /// Number of children actually present.
        len: usize,
    },

    /// A type name with no registry entry.
    #[error("no registered type named '{typename}'")]
    UnknownType {
        /// The unregistered type name.
        typename: String,
    },
}

/// Arena owning a forest of nodes.
///
/// The hierarchy is the single exclusive owner of every node in it; handles
/// ([`NodeId`]) are stable for its whole lifetime. There is no per-node
/// deletion: discarding a subtree means discarding the hierarchy, so
/// connections between ports can never dangle.
#[derive(Debug, Default, Clone)]
pub struct Hierarchy {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named container. Unparented groups become forest roots.
    pub fn add_group(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        self.attach(
            parent,
            name,
            "Node",
            NodeKind::Group {
                children: IndexMap::new(),
                custom: false,
            },
        )
    }

    /// Add an indexed container.
    pub fn add_array(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        self.attach(
            parent,
            name,
            "NodeArray",
            NodeKind::Array {
                children: Vec::new(),
            },
        )
    }

    pub(crate) fn attach(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
        typename: &str,
        kind: NodeKind,
    ) -> Result<NodeId, NodeError> {
        let alias = match parent {
            None => {
                let name = name.ok_or(NodeError::UnnamedRoot)?;
                Alias::Name(name.to_string())
            }
            Some(pid) => {
                let parent_path = self.path(pid);
                match &self.nodes[pid.index()].kind {
                    NodeKind::Group { children, .. } => {
                        let name = name.ok_or(NodeError::UnnamedChild {
                            parent: parent_path.clone(),
                        })?;
                        if children.contains_key(name) {
                            return Err(NodeError::DuplicateChild {
                                parent: parent_path,
                                name: name.to_string(),
                            });
                        }
                        Alias::Name(name.to_string())
                    }
                    NodeKind::Array { children } => {
                        if let Some(name) = name {
                            return Err(NodeError::NamedArrayChild {
                                parent: parent_path,
                                name: name.to_string(),
                            });
                        }
                        Alias::Index(children.len())
                    }
                    _ => return Err(NodeError::NotAContainer {
                        parent: parent_path,
                    }),
                }
            }
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            alias: alias.clone(),
            parent,
            typename: typename.to_string(),
            kind,
        });

        match parent {
            None => self.roots.push(id),
            Some(pid) => match (&mut self.nodes[pid.index()].kind, alias) {
                (NodeKind::Group { children, .. }, Alias::Name(name)) => {
                    children.insert(name, id);
                }
                (NodeKind::Array { children }, Alias::Index(_)) => children.push(id),
                _ => {}
            },
        }
        Ok(id)
    }

    /// Flip a plain group into a custom node with the given registered
    /// type name. Used when a registry factory instantiates an opaque type.
    pub(crate) fn mark_custom(&mut self, id: NodeId, typename: &str) -> Result<(), NodeError> {
        let path = self.path(id);
        let node = &mut self.nodes[id.index()];
        match &mut node.kind {
            NodeKind::Group { custom, .. } => {
                *custom = true;
                node.typename = typename.to_string();
                Ok(())
            }
            _ => Err(NodeError::NotAContainer { parent: path }),
        }
    }

    pub(crate) fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    /// The alias this node is addressed by under its parent.
    pub fn alias(&self, id: NodeId) -> &Alias {
        &self.nodes[id.index()].alias
    }

    /// The node's name, if it has a name alias rather than a positional one.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].alias {
            Alias::Name(name) => Some(name),
            Alias::Index(_) => None,
        }
    }

    /// The owning container, or `None` for forest roots.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// The node's registered type name, used for serialization.
    pub fn typename(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].typename
    }

    /// Whether this node is a named container serialized opaquely by type name.
    pub fn is_custom(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Group { custom: true, .. })
    }

    /// Whether this node is an input port.
    pub fn is_input(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Input { .. })
    }

    /// Whether this node is an output port.
    pub fn is_output(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Output { .. })
    }

    /// Whether this node can own children.
    pub fn is_container(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Group { .. } | NodeKind::Array { .. }
        )
    }

    /// Forest roots in registration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Children of a container in traversal order; empty for ports.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Group { children, .. } => children.values().copied().collect(),
            NodeKind::Array { children } => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Look up a named child of a named container.
    pub fn child(&self, id: NodeId, name: &str) -> Result<NodeId, NodeError> {
        match self.kind(id) {
            NodeKind::Group { children, .. } => {
                children.get(name).copied().ok_or_else(|| NodeError::NoSuchChild {
                    parent: self.path(id),
                    name: name.to_string(),
                })
            }
            _ => Err(NodeError::NoSuchChild {
                parent: self.path(id),
                name: name.to_string(),
            }),
        }
    }

    /// Look up a positional child of an indexed container, bounds-checked.
    pub fn child_at(&self, id: NodeId, index: usize) -> Result<NodeId, NodeError> {
        match self.kind(id) {
            NodeKind::Array { children } => {
                children.get(index).copied().ok_or_else(|| NodeError::IndexOutOfBounds {
                    parent: self.path(id),
                    index,
                    len: children.len(),
                })
            }
            _ => Err(NodeError::IndexOutOfBounds {
                parent: self.path(id),
                index,
                len: 0,
            }),
        }
    }

    /// Full path from the forest root, joining ancestor aliases with `.`
    /// except positional aliases, which render as `[i]` with no leading dot.
    pub fn path(&self, id: NodeId) -> String {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.nodes[current.index()].parent;
        }

        let mut out = String::new();
        for current in chain.iter().rev() {
            match &self.nodes[current.index()].alias {
                Alias::Name(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Alias::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_group() {
        let mut h = Hierarchy::new();
        let foo = h.add_group(None, Some("foo")).unwrap();
        assert_eq!(h.name(foo), Some("foo"));
        assert_eq!(h.parent(foo), None);
        assert_eq!(h.typename(foo), "Node");
        assert_eq!(h.path(foo), "foo");
        assert!(h.children(foo).is_empty());
        assert_eq!(h.roots(), &[foo]);
    }

    #[test]
    fn test_unnamed_root_rejected() {
        let mut h = Hierarchy::new();
        let err = h.add_group(None, None).unwrap_err();
        assert!(matches!(err, NodeError::UnnamedRoot));
    }

    #[test]
    fn test_sub_group() {
        let mut h = Hierarchy::new();
        let foo = h.add_group(None, Some("foo")).unwrap();
        let bar = h.add_group(Some(foo), Some("bar")).unwrap();
        assert_eq!(h.children(foo), vec![bar]);
        assert_eq!(h.parent(bar), Some(foo));
        assert_eq!(h.path(bar), "foo.bar");

        let err = h.add_group(Some(foo), None).unwrap_err();
        assert!(matches!(err, NodeError::UnnamedChild { .. }));
    }

    #[test]
    fn test_duplicate_child_name() {
        let mut h = Hierarchy::new();
        let foo = h.add_group(None, Some("foo")).unwrap();
        h.add_group(Some(foo), Some("bar")).unwrap();
        let err = h.add_group(Some(foo), Some("bar")).unwrap_err();
        assert!(matches!(err, NodeError::DuplicateChild { .. }));
        assert_eq!(
            err.to_string(),
            "\"foo\" already has a child named 'bar'"
        );
    }

    #[test]
    fn test_array_aliases() {
        let mut h = Hierarchy::new();
        let root = h.add_array(None, Some("rootlist")).unwrap();
        let a = h.add_group(Some(root), None).unwrap();
        let b = h.add_group(Some(root), None).unwrap();
        assert_eq!(h.children(root).len(), 2);
        assert_eq!(h.path(a), "rootlist[0]");
        assert_eq!(h.path(b), "rootlist[1]");

        let c = h.add_group(Some(b), Some("foo")).unwrap();
        assert_eq!(h.path(c), "rootlist[1].foo");

        let d = h.add_array(Some(root), None).unwrap();
        let e = h.add_group(Some(d), None).unwrap();
        assert_eq!(h.path(d), "rootlist[2]");
        assert_eq!(h.path(e), "rootlist[2][0]");

        assert_eq!(h.child_at(root, 0).unwrap(), a);
        assert_eq!(h.child_at(root, 1).unwrap(), b);
        assert_eq!(h.child(b, "foo").unwrap(), c);
        assert_eq!(h.child_at(d, 0).unwrap(), e);

        let err = h.add_group(Some(root), Some("bar")).unwrap_err();
        assert!(matches!(err, NodeError::NamedArrayChild { .. }));
    }

    #[test]
    fn test_child_lookup_failures() {
        let mut h = Hierarchy::new();
        let root = h.add_group(None, Some("megacorp")).unwrap();
        let alice = h.add_group(Some(root), Some("alice")).unwrap();
        h.add_group(Some(alice), Some("frank")).unwrap();

        let err = h.child(alice, "jimbob").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"megacorp.alice\" has no child named 'jimbob'"
        );

        let arr = h.add_array(Some(root), Some("list")).unwrap();
        let err = h.child_at(arr, 0).unwrap_err();
        assert!(matches!(err, NodeError::IndexOutOfBounds { len: 0, .. }));
    }

    #[test]
    fn test_port_parent_rejected() {
        let mut h = Hierarchy::new();
        let root = h.add_group(None, Some("root")).unwrap();
        let port = h
            .add_output(Some(root), Some("out"), Payload::Int(1))
            .unwrap();
        let err = h.add_group(Some(port), Some("etc")).unwrap_err();
        assert!(matches!(err, NodeError::NotAContainer { .. }));
    }
}
