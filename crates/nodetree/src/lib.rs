// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hierarchical node/value graph with typed port connections and
//! registry-driven JSON round trips.
//!
//! The crate models a forest of named and indexed container nodes holding
//! typed leaf ports, wired together with directional connections, for
//! tool-building domains such as procedural graphs and configuration trees.
//!
//! ## Architecture
//!
//! - [`Hierarchy`]: the ownership arena — named containers, indexed
//!   containers, and input/output ports addressed by [`NodeId`] handles.
//! - Connection semantics: type-checked, single-source wiring from output
//!   ports into input ports ([`Hierarchy::set_source`]).
//! - [`Visitor`]: deterministic pre-order traversal with container
//!   enter/exit and port callbacks.
//! - [`Registry`]: a closed type-name table of built-in scalar port types
//!   plus application-defined node types.
//! - [`Document`]: the three-part (`nodes`/`values`/`sources`) wire form
//!   produced by [`Registry::export`] and consumed by [`Registry::import`].
//!
//! The core is single-threaded and synchronous; it schedules no computation
//! over the connection graph and leaves cycle handling to the application.

pub mod document;
pub mod export;
pub mod import;
pub mod node;
pub mod path;
pub mod port;
pub mod registry;
pub mod visitor;

pub use document::Document;
pub use export::ExportError;
pub use import::{ImportError, ImportResult};
pub use node::{Alias, Hierarchy, NodeError, NodeId};
pub use path::{resolve, split_path, PathError, PathSegment};
pub use port::{Payload, PayloadKind, PortError};
pub use registry::{NodeFactory, NodeTypeDef, Registry};
pub use visitor::{visit, visit_all, Visitor};
