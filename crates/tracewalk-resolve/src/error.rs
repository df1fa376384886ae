//! Resolution diagnostics.
//!
//! Every failure is fatal to the enclosing `resolve_trace_class` call.
//! An error is born at the point of detection with a kind and a message,
//! then each propagation boundary appends one cause on the way up, so the
//! caller sees the full chain from the offending reference to the layer
//! that was being resolved. Appending a cause also logs it at error
//! level; nothing is reported twice.

use std::fmt;

use thiserror::Error;
use tracing::error;

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Category of resolution error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed path expression (empty token).
    Lexical,
    /// Required layer absent or already translated, or root class missing.
    ScopePrecondition,
    /// No member, option or enclosing compound matches the expression.
    Lookup,
    /// Target does not precede its source in packet byte order.
    Causality,
    /// Target class is incompatible with the referring class.
    Type,
    /// Invariant breach inside the resolver itself.
    Internal,
}

impl ErrorKind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::ScopePrecondition => "scope precondition",
            ErrorKind::Lookup => "lookup error",
            ErrorKind::Causality => "causality violation",
            ErrorKind::Type => "type mismatch",
            ErrorKind::Internal => "internal resolver error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolution error: kind, primary message and the cause chain
/// accumulated while unwinding.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ResolveError {
    pub kind: ErrorKind,
    pub message: String,
    /// Causes appended while propagating, innermost first.
    pub causes: Vec<String>,
}

impl ResolveError {
    /// Creates a new error and logs its message at error level.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        error!(kind = kind.name(), "{message}");
        Self {
            kind,
            message,
            causes: Vec::new(),
        }
    }

    /// Appends a propagation cause and logs it at error level.
    #[must_use]
    pub fn because(mut self, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        error!(kind = self.kind.name(), "{cause}");
        self.causes.push(cause);
        self
    }
}
