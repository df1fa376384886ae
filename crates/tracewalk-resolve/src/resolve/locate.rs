//! Target location.
//!
//! Turns a path expression into a field path. Absolute expressions start
//! at the scope root named by their prefix, after the layer preconditions
//! pass; relative expressions are retried against each enclosing compound
//! on the descent stack, innermost first, and the successful attempt's
//! tail is stitched onto the stack prefix leading to that compound.

use tracing::debug;
use tracewalk_meta::{FieldClass, FieldPath, Scope, ELEM_INDEX};

use crate::error::{ErrorKind, ResolveError, Result};

use super::path::{absolute_scope_of, prefix_token_count, split_path_tokens};
use super::ResolveContext;

/// Builds a locator failure without the error-level log that
/// [`ResolveError::new`] emits: in relative mode these failures are
/// recoverable (the next enclosing compound is tried), so they only show
/// up at debug level.
fn locate_failure(kind: ErrorKind, message: String) -> ResolveError {
    debug!(kind = kind.name(), "{message}");
    ResolveError {
        kind,
        message,
        causes: Vec::new(),
    }
}

/// Walks `tokens` down from `start`, appending one index per descent to
/// `path`.
///
/// `src_index` is the index of the referring field within `start`, or
/// `i64::MAX` when the referring field is contained deeper. Causality is
/// checked only among the starting compound's own children: once a level
/// has been descended, later lookups ignore `src_index`. Array and
/// sequence levels consume no token and descend into the element class.
fn locate_from(
    tokens: &[String],
    start: &FieldClass,
    src_index: i64,
    path: &mut FieldPath,
) -> Result<()> {
    let mut fc = start;
    let mut cur = 0usize;
    let mut first_level_done = false;

    while cur < tokens.len() {
        let child_index = match fc {
            FieldClass::Array(_) | FieldClass::Sequence(_) => ELEM_INDEX,
            _ => {
                let name = tokens[cur].as_str();
                debug!(token = name, "current path token");
                let Some(index) = fc.child_index(name) else {
                    return Err(locate_failure(
                        ErrorKind::Lookup,
                        format!(
                            "no member or option named `{name}` in {} field class",
                            fc.kind_name()
                        ),
                    ));
                };
                let index = index as i64;
                if index > src_index && !first_level_done {
                    return Err(locate_failure(
                        ErrorKind::Causality,
                        format!(
                            "field `{name}` is located after the referring field: \
                             child-index={index}, source-index={src_index}"
                        ),
                    ));
                }
                cur += 1;
                first_level_done = true;
                index
            }
        };

        path.push(child_index);
        fc = fc.child(child_index).ok_or_else(|| {
            ResolveError::new(
                ErrorKind::Internal,
                format!("compound child vanished during location: index={child_index}"),
            )
        })?;
    }
    Ok(())
}

impl<'a> ResolveContext<'a> {
    /// Converts a path expression into a field path within this context.
    pub(crate) fn field_path_of(&self, pathstr: &str) -> Result<FieldPath> {
        let tokens = split_path_tokens(pathstr).map_err(|e| {
            e.because(format!(
                "cannot convert path string to path tokens: path=`{pathstr}`"
            ))
        })?;

        match absolute_scope_of(pathstr) {
            Some(root) => {
                debug!(path = pathstr, scope = %root, "detected absolute path");
                let mut path = FieldPath::new(root);
                self.absolute_path(&tokens, &mut path).map_err(|e| {
                    e.because(format!(
                        "cannot get absolute field path of path string: \
                         path=`{pathstr}`, root-scope={root}"
                    ))
                })?;
                Ok(path)
            }
            None => {
                debug!(
                    path = pathstr,
                    scope = %self.root_scope,
                    "detected relative path: starting with current root scope"
                );
                let mut path = FieldPath::new(self.root_scope);
                self.relative_path(&tokens, &mut path).map_err(|e| {
                    e.because(format!(
                        "cannot get relative field path of path string: \
                         path=`{pathstr}`, start-scope={}",
                        self.root_scope
                    ))
                })?;
                Ok(path)
            }
        }
    }

    /// Resolves an absolute token list rooted at `path.root()`.
    fn absolute_path(&self, tokens: &[String], path: &mut FieldPath) -> Result<()> {
        let root = path.root();

        // A reference must not reach into an already-translated layer.
        match root {
            Scope::PacketHeader => {
                if self.layers.trace_translated {
                    return Err(ResolveError::new(
                        ErrorKind::ScopePrecondition,
                        format!("trace class is already translated: root-scope={root}"),
                    ));
                }
            }
            Scope::PacketContext | Scope::EventHeader | Scope::EventCommonContext => {
                match self.layers.stream_translated {
                    None => {
                        return Err(ResolveError::new(
                            ErrorKind::ScopePrecondition,
                            format!("no current stream class: root-scope={root}"),
                        ))
                    }
                    Some(true) => {
                        return Err(ResolveError::new(
                            ErrorKind::ScopePrecondition,
                            format!("stream class is already translated: root-scope={root}"),
                        ))
                    }
                    Some(false) => {}
                }
            }
            Scope::EventSpecificContext | Scope::EventPayload => {
                match self.layers.event_translated {
                    None => {
                        return Err(ResolveError::new(
                            ErrorKind::ScopePrecondition,
                            format!("no current event class: root-scope={root}"),
                        ))
                    }
                    Some(true) => {
                        return Err(ResolveError::new(
                            ErrorKind::ScopePrecondition,
                            format!("event class is already translated: root-scope={root}"),
                        ))
                    }
                    Some(false) => {}
                }
            }
        }

        let root_fc = self.scopes.class(root).ok_or_else(|| {
            ResolveError::new(
                ErrorKind::ScopePrecondition,
                format!("root field class is not available: root-scope={root}"),
            )
        })?;

        locate_from(&tokens[prefix_token_count(root)..], root_fc, i64::MAX, path)
    }

    /// Resolves a relative token list by trying each enclosing compound,
    /// innermost first.
    ///
    /// On exhaustion, a causality failure from one of the attempts wins
    /// over plain name misses: the field exists but decodes too late,
    /// which is the more precise diagnosis.
    fn relative_path(&self, tokens: &[String], path: &mut FieldPath) -> Result<()> {
        let mut causality: Option<ResolveError> = None;

        for parent_pos in (0..self.stack.len()).rev() {
            let frame = self.stack.at(parent_pos);
            debug!(
                parent_pos,
                cur_index = frame.index,
                "locating target field class from enclosing compound"
            );

            let mut tail = FieldPath::new(path.root());
            match locate_from(tokens, frame.class, frame.index, &mut tail) {
                Ok(()) => {
                    // Stitch: stack prefix down to the matched compound,
                    // then the located tail.
                    for i in 0..parent_pos {
                        path.push(self.stack.at(i).index);
                    }
                    for &index in tail.indices() {
                        path.push(index);
                    }
                    return Ok(());
                }
                Err(err) => {
                    debug!(kind = err.kind.name(), "not found at this point");
                    if err.kind == ErrorKind::Causality && causality.is_none() {
                        causality = Some(err);
                    }
                }
            }
        }

        match causality {
            Some(err) => {
                Err(err.because("no enclosing compound field class matches the relative path"))
            }
            None => Err(ResolveError::new(
                ErrorKind::Lookup,
                "no enclosing compound field class matches the relative path",
            )),
        }
    }
}
