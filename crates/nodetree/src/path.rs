// SPDX-License-Identifier: MIT OR Apache-2.0
//! The dotted-and-bracketed path grammar used to address nodes.
//!
//! Segments are separated by `.`; a segment may be followed by bracketed
//! non-negative integers denoting positional descent, e.g.
//! `root.bar[2][0].etc`.

use crate::node::{Hierarchy, NodeError, NodeId};

/// One component of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named-container descent.
    Name(String),
    /// An indexed-container descent.
    Index(usize),
}

/// Error raised while parsing or resolving a path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// A bracketed token that does not parse as a non-negative integer.
    #[error("invalid index '{token}' in path '{path}'")]
    InvalidIndex {
        /// The offending token.
        token: String,
        /// The full path being parsed.
        path: String,
    },

    /// A segment that does not exist in the hierarchy being resolved.
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Split a path into name and index segments.
///
/// The split is not strict and assumes a well-formed path: tokens are cut
/// on `.` and `[`, and a token starting with a digit is parsed as an index
/// after stripping its trailing `]`.
pub fn split_path(path: &str) -> Result<Vec<PathSegment>, PathError> {
    let mut segments = Vec::new();
    for (i, token) in path.split(['.', '[']).enumerate() {
        // A leading index such as "[0]" yields an empty first token.
        if token.is_empty() && i == 0 {
            continue;
        }
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            let index = token
                .trim_end_matches(']')
                .parse::<usize>()
                .map_err(|_| PathError::InvalidIndex {
                    token: token.to_string(),
                    path: path.to_string(),
                })?;
            segments.push(PathSegment::Index(index));
        } else {
            segments.push(PathSegment::Name(token.to_string()));
        }
    }
    Ok(segments)
}

/// Resolve a path relative to `root`, descending by name or index.
pub fn resolve(hierarchy: &Hierarchy, root: NodeId, path: &str) -> Result<NodeId, PathError> {
    let mut node = root;
    for segment in split_path(path)? {
        node = match segment {
            PathSegment::Name(name) => hierarchy.child(node, &name)?,
            PathSegment::Index(index) => hierarchy.child_at(node, index)?,
        };
    }
    Ok(node)
}
