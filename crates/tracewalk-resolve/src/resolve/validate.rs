//! Target validation.
//!
//! A located target is only usable if it decodes before its source and
//! carries a compatible class: variant tags must be enumerations,
//! sequence lengths must be unsigned integers. Within one root scope,
//! "before" means the two paths share a proper lowest common ancestor
//! and the target's branch comes first; a target that is an ancestor or
//! descendant of its source is rejected.

use tracing::debug;
use tracewalk_meta::{FieldClass, FieldPath};

use crate::error::{ErrorKind, ResolveError, Result};

use super::ResolveContext;

/// Index at which two same-root field paths diverge.
///
/// Fails when one path is a prefix of the other: the paths never split,
/// so one field contains the other and neither can reference the other's
/// decoded value.
fn lca_divergence(target: &FieldPath, source: &FieldPath) -> Result<usize> {
    debug_assert_eq!(target.root(), source.root());
    debug!(target = %target, source = %source, "finding lowest common ancestor");

    let mut lca = 0usize;
    loop {
        if lca == target.len() || lca == source.len() {
            return Err(ResolveError::new(
                ErrorKind::Causality,
                format!(
                    "source field class is an ancestor of target field class or vice versa: \
                     lca-index={lca}, target-field-path={target}, source-field-path={source}"
                ),
            ));
        }
        if target.indices()[lca] != source.indices()[lca] {
            debug!(lca_index = lca, "found lowest common ancestor");
            return Ok(lca);
        }
        lca += 1;
    }
}

impl<'a> ResolveContext<'a> {
    /// Validates `target_path`/`target_fc` as the reference target of the
    /// sequence or variant `source_fc` currently under visit.
    pub(crate) fn validate_target(
        &self,
        source_fc: &FieldClass,
        target_path: &FieldPath,
        target_fc: &FieldClass,
    ) -> Result<()> {
        let source_path = self.stack.field_path(self.root_scope);

        if target_path.is_empty() {
            return Err(ResolveError::new(
                ErrorKind::Causality,
                "target field path's length is 0 (targeting the root)",
            ));
        }

        if target_path.root() > source_path.root() {
            return Err(ResolveError::new(
                ErrorKind::Causality,
                format!(
                    "target field class is located after source field class: \
                     target-root={}, source-root={}",
                    target_path.root(),
                    source_path.root()
                ),
            ));
        }

        if target_path.root() == source_path.root() {
            let lca = lca_divergence(target_path, &source_path)?;
            let target_index = target_path.indices()[lca];
            let source_index = source_path.indices()[lca];
            if target_index >= source_index {
                return Err(ResolveError::new(
                    ErrorKind::Causality,
                    format!(
                        "target field class's index is greater than or equal to \
                         source field class's index in lowest common ancestor: \
                         lca-index={lca}, target-index={target_index}, \
                         source-index={source_index}"
                    ),
                ));
            }
        }

        match source_fc {
            FieldClass::Variant(_) => {
                if !matches!(target_fc, FieldClass::Enumeration(_)) {
                    return Err(ResolveError::new(
                        ErrorKind::Type,
                        format!(
                            "variant field class's tag field class is not an enumeration \
                             field class: tag-fc-type={}",
                            target_fc.kind_name()
                        ),
                    ));
                }
            }
            FieldClass::Sequence(_) => {
                let int = match target_fc {
                    FieldClass::Integer(int) => int,
                    FieldClass::Enumeration(en) => &en.int,
                    _ => {
                        return Err(ResolveError::new(
                            ErrorKind::Type,
                            format!(
                                "sequence field class's length field class is not an \
                                 unsigned integer field class: length-fc-type={}",
                                target_fc.kind_name()
                            ),
                        ))
                    }
                };
                if int.is_signed {
                    return Err(ResolveError::new(
                        ErrorKind::Type,
                        "sequence field class's length field class is not an \
                         unsigned integer field class: length field class is signed",
                    ));
                }
            }
            _ => {
                return Err(ResolveError::new(
                    ErrorKind::Internal,
                    format!(
                        "validating a reference on a {} field class",
                        source_fc.kind_name()
                    ),
                ))
            }
        }
        Ok(())
    }
}
