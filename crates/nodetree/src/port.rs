// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed port payloads and directional connection semantics.
//!
//! Ports are leaf nodes owned by a container, holding a scalar payload and a
//! fixed input/output role. An input may be sourced from at most one output;
//! an output may feed any number of inputs. Reading a sourced input refreshes
//! its own payload slot from the source before returning, so clearing the
//! source leaves the payload frozen at its last-read value.

use crate::node::{Hierarchy, NodeError, NodeId, NodeKind};
use serde_json::Value;
use std::fmt;

/// A typed scalar payload held by a port.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Integer payload.
    Int(i64),
    /// Floating point payload.
    Float(f64),
    /// String payload.
    Str(String),
    /// Boolean payload.
    Bool(bool),
    /// Reference to another node in the same hierarchy, if set.
    Ref(Option<NodeId>),
}

/// Field-less mirror of [`Payload`], used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Integer.
    Int,
    /// Floating point.
    Float,
    /// String.
    Str,
    /// Boolean.
    Bool,
    /// Node reference.
    Ref,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Ref => "ref",
        };
        write!(f, "{name}")
    }
}

impl PayloadKind {
    /// Connect-time compatibility: can an input of this kind take values
    /// from an output of `other`? One-directional and slightly widening,
    /// unlike the strict equality used for writes.
    pub fn accepts(self, other: PayloadKind) -> bool {
        self == other
            || matches!(
                (self, other),
                (Self::Int, Self::Bool) | (Self::Float, Self::Int)
            )
    }

    pub(crate) fn input_typename(self) -> &'static str {
        match self {
            Self::Int => "InputInt",
            Self::Float => "InputFloat",
            Self::Str => "InputString",
            Self::Bool => "InputBool",
            Self::Ref => "InputRef",
        }
    }

    pub(crate) fn output_typename(self) -> &'static str {
        match self {
            Self::Int => "OutputInt",
            Self::Float => "OutputFloat",
            Self::Str => "OutputString",
            Self::Bool => "OutputBool",
            Self::Ref => "OutputRef",
        }
    }
}

impl Payload {
    /// The kind tag of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Int(_) => PayloadKind::Int,
            Self::Float(_) => PayloadKind::Float,
            Self::Str(_) => PayloadKind::Str,
            Self::Bool(_) => PayloadKind::Bool,
            Self::Ref(_) => PayloadKind::Ref,
        }
    }

    /// Render as a JSON value for the document `values` map. References
    /// render as null; their identity is carried by `sources` entries.
    pub(crate) fn to_json(&self) -> Value {
        match self {
            Self::Int(v) => Value::Number((*v).into()),
            Self::Float(v) => {
                serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
            }
            Self::Str(v) => Value::String(v.clone()),
            Self::Bool(v) => Value::Bool(*v),
            Self::Ref(_) => Value::Null,
        }
    }

    /// Coerce a JSON value to a payload of the port's declared kind.
    /// Returns `None` when the JSON shape does not fit the kind.
    pub(crate) fn from_json(kind: PayloadKind, value: &Value) -> Option<Payload> {
        match kind {
            PayloadKind::Int => value.as_i64().map(Payload::Int),
            PayloadKind::Float => value.as_f64().map(Payload::Float),
            PayloadKind::Str => value.as_str().map(|s| Payload::Str(s.to_string())),
            PayloadKind::Bool => value.as_bool().map(Payload::Bool),
            PayloadKind::Ref => value.is_null().then_some(Payload::Ref(None)),
        }
    }
}

/// Error raised by port reads, writes and connection changes.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Only outputs can act as a source.
    #[error("cannot source from non-output \"{path}\"")]
    NonOutputSource {
        /// Path of the rejected source node.
        path: String,
    },

    /// Only inputs can be sourced.
    #[error("cannot source non-input \"{path}\"")]
    NonInputTarget {
        /// Path of the rejected target node.
        path: String,
    },

    /// An input keeps its existing source until explicitly cleared.
    #[error("cannot source \"{target}\" from \"{source_path}\" as already connected to \"{existing}\"")]
    AlreadySourced {
        /// Path of the input.
        target: String,
        /// Path of the newly offered output.
        source_path: String,
        /// Path of the output already connected.
        existing: String,
    },

    /// The output's payload kind is not accepted by the input's kind.
    #[error("cannot source \"{target}\" ({target_kind}) from mismatched output \"{source_path}\" ({source_kind})")]
    SourceKindMismatch {
        /// Path of the input.
        target: String,
        /// The input's payload kind.
        target_kind: PayloadKind,
        /// Path of the output.
        source_path: String,
        /// The output's payload kind.
        source_kind: PayloadKind,
    },

    /// Writes require an exact payload kind match.
    #[error("cannot set \"{path}\" ({expected}) to mismatched {found} value")]
    WriteKindMismatch {
        /// Path of the port.
        path: String,
        /// The port's declared kind.
        expected: PayloadKind,
        /// The offered payload's kind.
        found: PayloadKind,
    },

    /// A sourced input cannot be written directly.
    #[error("cannot set \"{path}\" whilst sourced from \"{source_path}\"")]
    WriteWhileSourced {
        /// Path of the input.
        path: String,
        /// Path of its current source.
        source_path: String,
    },

    /// Clearing requires an existing source.
    #[error("cannot clear source on unconnected input \"{path}\"")]
    NotSourced {
        /// Path of the input.
        path: String,
    },

    /// The addressed node is not a port.
    #[error("\"{path}\" is not a value")]
    NotAPort {
        /// Path of the node.
        path: String,
    },
}

impl Hierarchy {
    /// Add an input port holding `payload`.
    pub fn add_input(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
        payload: Payload,
    ) -> Result<NodeId, NodeError> {
        let typename = payload.kind().input_typename();
        let persisted = payload.kind() != PayloadKind::Ref;
        self.attach(
            parent,
            name,
            typename,
            NodeKind::Input {
                payload,
                source: None,
                persisted,
            },
        )
    }

    /// Add an output port holding `payload`.
    pub fn add_output(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
        payload: Payload,
    ) -> Result<NodeId, NodeError> {
        let typename = payload.kind().output_typename();
        let persisted = payload.kind() != PayloadKind::Ref;
        self.attach(
            parent,
            name,
            typename,
            NodeKind::Output { payload, persisted },
        )
    }

    /// Add an output reference port under `parent`, allowing the parent
    /// node itself to be referenced from input refs elsewhere. Not
    /// persisted in `values`: the parent's existence implies it.
    pub fn add_output_ref(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        self.add_output(Some(parent), name, Payload::Ref(Some(parent)))
    }

    /// Add an unset input reference port.
    pub fn add_input_ref(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> Result<NodeId, NodeError> {
        self.add_input(parent, name, Payload::Ref(None))
    }

    /// The payload kind of a port; `None` for containers.
    pub fn payload_kind(&self, id: NodeId) -> Option<PayloadKind> {
        match self.kind(id) {
            NodeKind::Input { payload, .. } | NodeKind::Output { payload, .. } => {
                Some(payload.kind())
            }
            _ => None,
        }
    }

    /// Whether a port's value should appear in an exported `values` map.
    pub fn is_persisted(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Input { persisted, .. } | NodeKind::Output { persisted, .. } => *persisted,
            _ => false,
        }
    }

    /// Whether an input currently has a source. `false` for any other node.
    pub fn is_sourced(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Input { source: Some(_), .. })
    }

    /// The output currently sourcing this input, if any.
    pub fn source(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Input { source, .. } => *source,
            _ => None,
        }
    }

    /// Connect `target` (an input) to read from `source` (an output).
    ///
    /// Fails if `source` is not an output, `target` is not an input,
    /// `target` already has a source, or the payload kinds are incompatible.
    pub fn set_source(&mut self, target: NodeId, source: NodeId) -> Result<(), PortError> {
        let source_kind = match self.kind(source) {
            NodeKind::Output { payload, .. } => payload.kind(),
            _ => {
                return Err(PortError::NonOutputSource {
                    path: self.path(source),
                })
            }
        };
        let target_kind = match self.kind(target) {
            NodeKind::Input {
                payload,
                source: existing,
                ..
            } => {
                if let Some(existing) = existing {
                    return Err(PortError::AlreadySourced {
                        target: self.path(target),
                        source_path: self.path(source),
                        existing: self.path(*existing),
                    });
                }
                payload.kind()
            }
            _ => {
                return Err(PortError::NonInputTarget {
                    path: self.path(target),
                })
            }
        };
        if !target_kind.accepts(source_kind) {
            return Err(PortError::SourceKindMismatch {
                target: self.path(target),
                target_kind,
                source_path: self.path(source),
                source_kind,
            });
        }
        if let NodeKind::Input { source: slot, .. } = self.kind_mut(target) {
            *slot = Some(source);
        }
        Ok(())
    }

    /// Forward convenience: wire `output` into `input`. Identical to
    /// [`set_source`](Self::set_source) with the arguments reordered.
    pub fn connect(&mut self, output: NodeId, input: NodeId) -> Result<(), PortError> {
        self.set_source(input, output)
    }

    /// Disconnect an input from its source. The input's payload stays at
    /// whatever was last read through the connection.
    pub fn clear_source(&mut self, id: NodeId) -> Result<(), PortError> {
        if let NodeKind::Input {
            source: slot @ Some(_),
            ..
        } = self.kind_mut(id)
        {
            *slot = None;
            Ok(())
        } else {
            Err(PortError::NotSourced {
                path: self.path(id),
            })
        }
    }

    /// Current value of a port without touching its cached payload:
    /// sourced inputs report their source's payload, everything else its own.
    pub fn value(&self, id: NodeId) -> Result<Payload, PortError> {
        match self.kind(id) {
            NodeKind::Input {
                source: Some(source),
                ..
            } => self.value(*source),
            NodeKind::Input { payload, .. } | NodeKind::Output { payload, .. } => {
                Ok(payload.clone())
            }
            _ => Err(PortError::NotAPort {
                path: self.path(id),
            }),
        }
    }

    /// Read a port. A sourced input first copies the source's current
    /// payload into its own slot, so the read reflects the upstream value
    /// at time of call.
    pub fn read(&mut self, id: NodeId) -> Result<Payload, PortError> {
        if let NodeKind::Input {
            source: Some(source),
            ..
        } = self.kind(id)
        {
            let upstream = self.value(*source)?;
            if let NodeKind::Input { payload, .. } = self.kind_mut(id) {
                *payload = upstream;
            }
        }
        self.value(id)
    }

    /// Write a port's payload. Fails on sourced inputs and requires the
    /// payload kind to match the port's declared kind exactly.
    pub fn write(&mut self, id: NodeId, payload: Payload) -> Result<(), PortError> {
        let expected = match self.kind(id) {
            NodeKind::Input {
                source: Some(source),
                ..
            } => {
                return Err(PortError::WriteWhileSourced {
                    path: self.path(id),
                    source_path: self.path(*source),
                })
            }
            NodeKind::Input {
                payload: current, ..
            }
            | NodeKind::Output {
                payload: current, ..
            } => current.kind(),
            _ => {
                return Err(PortError::NotAPort {
                    path: self.path(id),
                })
            }
        };
        if expected != payload.kind() {
            return Err(PortError::WriteKindMismatch {
                path: self.path(id),
                expected,
                found: payload.kind(),
            });
        }
        if let NodeKind::Input {
            payload: slot, ..
        }
        | NodeKind::Output {
            payload: slot, ..
        } = self.kind_mut(id)
        {
            *slot = payload;
        }
        Ok(())
    }
}
