//! Trace class hierarchy.
//!
//! A trace class owns stream classes, a stream class owns event classes,
//! and each layer owns up to the scope roots defined for it. The
//! `is_translated` flag freezes a layer once its field classes have been
//! emitted downstream; passes skip frozen layers, which makes them
//! idempotent over already-processed input.

use thiserror::Error;

use crate::field_class::FieldClass;
use crate::field_path::{FieldPath, Scope};

/// Error walking a field path through a set of scope roots.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("root scope {0} has no field class")]
    MissingRoot(Scope),

    #[error("no child field class at index {index} (depth {depth})")]
    InvalidIndex { index: i64, depth: usize },
}

/// Trace class: the top layer of the metadata hierarchy.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TraceClass {
    pub packet_header: Option<FieldClass>,
    pub stream_classes: Vec<StreamClass>,
    pub is_translated: bool,
}

impl TraceClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the scope roots visible while resolving within the stream
    /// class at `stream` and the event class at `event`, if given.
    ///
    /// Out-of-range indices simply leave the corresponding slots empty.
    pub fn scope_roots(&self, stream: Option<usize>, event: Option<usize>) -> ScopeRoots<'_> {
        let mut roots = ScopeRoots {
            packet_header: self.packet_header.as_ref(),
            ..ScopeRoots::default()
        };

        let Some(sc) = stream.and_then(|i| self.stream_classes.get(i)) else {
            return roots;
        };
        roots.packet_context = sc.packet_context.as_ref();
        roots.event_header = sc.event_header.as_ref();
        roots.event_common_context = sc.event_common_context.as_ref();

        let Some(ec) = event.and_then(|i| sc.event_classes.get(i)) else {
            return roots;
        };
        roots.event_specific_context = ec.spec_context.as_ref();
        roots.event_payload = ec.payload.as_ref();
        roots
    }
}

/// Stream class: owns the three stream-level scope roots and the event
/// classes of one data stream layout.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreamClass {
    pub id: u64,
    pub packet_context: Option<FieldClass>,
    pub event_header: Option<FieldClass>,
    pub event_common_context: Option<FieldClass>,
    pub event_classes: Vec<EventClass>,
    pub is_translated: bool,
}

impl StreamClass {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            packet_context: None,
            event_header: None,
            event_common_context: None,
            event_classes: Vec::new(),
            is_translated: false,
        }
    }
}

/// Event class: owns the two event-level scope roots.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventClass {
    pub id: u64,
    pub name: String,
    pub spec_context: Option<FieldClass>,
    pub payload: Option<FieldClass>,
    pub is_translated: bool,
}

impl EventClass {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            spec_context: None,
            payload: None,
            is_translated: false,
        }
    }
}

/// Borrowed view of the six scope-root slots visible from one layer.
///
/// Slots for layers that are not in effect (no current stream class, no
/// current event class) are `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeRoots<'a> {
    pub packet_header: Option<&'a FieldClass>,
    pub packet_context: Option<&'a FieldClass>,
    pub event_header: Option<&'a FieldClass>,
    pub event_common_context: Option<&'a FieldClass>,
    pub event_specific_context: Option<&'a FieldClass>,
    pub event_payload: Option<&'a FieldClass>,
}

impl<'a> ScopeRoots<'a> {
    /// Root field class of `scope`, if present.
    pub fn class(&self, scope: Scope) -> Option<&'a FieldClass> {
        match scope {
            Scope::PacketHeader => self.packet_header,
            Scope::PacketContext => self.packet_context,
            Scope::EventHeader => self.event_header,
            Scope::EventCommonContext => self.event_common_context,
            Scope::EventSpecificContext => self.event_specific_context,
            Scope::EventPayload => self.event_payload,
        }
    }

    /// Walks `path` from its root down to the field class it addresses.
    pub fn class_at(&self, path: &FieldPath) -> Result<&'a FieldClass, PathError> {
        let mut fc = self
            .class(path.root())
            .ok_or(PathError::MissingRoot(path.root()))?;
        for (depth, &index) in path.indices().iter().enumerate() {
            fc = fc
                .child(index)
                .ok_or(PathError::InvalidIndex { index, depth })?;
        }
        Ok(fc)
    }
}
