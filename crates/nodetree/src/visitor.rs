// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic pre-order traversal over a hierarchy.

use crate::node::{Hierarchy, NodeId, NodeKind};

/// Callbacks fired during a pre-order, depth-first walk.
///
/// Containers fire their enter callback, then their children in the
/// container's own order, then their exit callback. Ports fire exactly one
/// of the leaf callbacks according to their role. Traversal always descends
/// into custom nodes; opaque serialization is an export concern, not a
/// traversal one.
pub trait Visitor {
    /// Error type a callback may abort the walk with.
    type Error;

    /// Entering a named container.
    fn on_group_enter(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }

    /// Leaving a named container after all of its children.
    fn on_group_exit(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }

    /// Entering an indexed container.
    fn on_array_enter(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }

    /// Leaving an indexed container after all of its children.
    fn on_array_exit(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }

    /// An input port found in traversal.
    fn on_input(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }

    /// An output port found in traversal.
    fn on_output(&mut self, hierarchy: &Hierarchy, id: NodeId) -> Result<(), Self::Error> {
        let _ = (hierarchy, id);
        Ok(())
    }
}

/// Walk the subtree rooted at `root` in pre-order.
pub fn visit<V: Visitor>(
    hierarchy: &Hierarchy,
    root: NodeId,
    visitor: &mut V,
) -> Result<(), V::Error> {
    match hierarchy.kind(root) {
        NodeKind::Group { .. } => {
            visitor.on_group_enter(hierarchy, root)?;
            for child in hierarchy.children(root) {
                visit(hierarchy, child, visitor)?;
            }
            visitor.on_group_exit(hierarchy, root)
        }
        NodeKind::Array { .. } => {
            visitor.on_array_enter(hierarchy, root)?;
            for child in hierarchy.children(root) {
                visit(hierarchy, child, visitor)?;
            }
            visitor.on_array_exit(hierarchy, root)
        }
        NodeKind::Input { .. } => visitor.on_input(hierarchy, root),
        NodeKind::Output { .. } => visitor.on_output(hierarchy, root),
    }
}

/// Walk several roots in order with the same visitor.
pub fn visit_all<V: Visitor>(
    hierarchy: &Hierarchy,
    roots: &[NodeId],
    visitor: &mut V,
) -> Result<(), V::Error> {
    for root in roots {
        visit(hierarchy, *root, visitor)?;
    }
    Ok(())
}
