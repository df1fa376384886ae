//! Scope tags and field paths.
//!
//! A field path addresses one field class inside a scope root: a root tag
//! (which of the six scope roots) plus one child index per descent level.
//! For structure and variant parents the index is the member or option
//! position; for array and sequence parents it is [`ELEM_INDEX`], since
//! those compounds have a single element class.

use std::fmt;

/// Index stored in a field path when descending into the element class of
/// an array or sequence.
pub const ELEM_INDEX: i64 = -1;

/// One of the six scope roots anchoring a layer's data layout.
///
/// The declaration order is the packet byte order: a field in an earlier
/// scope is decoded before any field in a later scope. `Ord` follows that
/// order, which is what the resolver's cross-scope causality check relies
/// on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Scope {
    /// Trace-level packet header.
    PacketHeader,
    /// Stream-level packet context.
    PacketContext,
    /// Stream-level event header.
    EventHeader,
    /// Stream-level event common context.
    EventCommonContext,
    /// Event-level specific context.
    EventSpecificContext,
    /// Event-level payload.
    EventPayload,
}

impl Scope {
    /// All scopes, in packet byte order.
    pub const ALL: [Scope; 6] = [
        Scope::PacketHeader,
        Scope::PacketContext,
        Scope::EventHeader,
        Scope::EventCommonContext,
        Scope::EventSpecificContext,
        Scope::EventPayload,
    ];

    /// Human-readable scope name, as printed in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Scope::PacketHeader => "packet-header",
            Scope::PacketContext => "packet-context",
            Scope::EventHeader => "event-header",
            Scope::EventCommonContext => "event-common-context",
            Scope::EventSpecificContext => "event-specific-context",
            Scope::EventPayload => "event-payload",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Path to a field class within a scope root.
///
/// Sequence length references and variant tag references resolve to a
/// `FieldPath`; the path is also the only form of back-reference the tree
/// stores, so it must stay valid for as long as the enclosing trace class
/// does (the tree's topology is never mutated after parsing).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldPath {
    root: Scope,
    indices: Vec<i64>,
}

impl FieldPath {
    /// Creates an empty path rooted at `root`.
    pub fn new(root: Scope) -> Self {
        Self {
            root,
            indices: Vec::new(),
        }
    }

    /// Creates a path rooted at `root` with the given child indices.
    pub fn from_parts(root: Scope, indices: impl Into<Vec<i64>>) -> Self {
        Self {
            root,
            indices: indices.into(),
        }
    }

    /// Root scope of this path.
    pub fn root(&self) -> Scope {
        self.root
    }

    /// Appends one child index.
    pub fn push(&mut self, index: i64) {
        self.indices.push(index);
    }

    /// Child indices, outermost first.
    pub fn indices(&self) -> &[i64] {
        &self.indices
    }

    /// Number of descent levels.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the path addresses the scope root itself.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.root)?;
        for (i, index) in self.indices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}
