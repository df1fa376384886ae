// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! CTF metadata tree types
//!
//! This crate contains the field-class tree produced by TSDL metadata
//! parsing, the field-path type used to address fields inside the six
//! scope roots, and the trace class hierarchy that owns those roots.

pub mod field_class;
pub mod field_path;
pub mod trace;

// Re-export commonly used types
pub use field_class::{
    ArrayClass, ByteOrder, DisplayBase, Encoding, EnumerationClass, EnumerationMapping,
    EnumerationRange, FieldClass, FloatClass, IntegerClass, SequenceClass, StringClass,
    StructureClass, VariantClass,
};
pub use field_path::{FieldPath, Scope, ELEM_INDEX};
pub use trace::{EventClass, PathError, ScopeRoots, StreamClass, TraceClass};
