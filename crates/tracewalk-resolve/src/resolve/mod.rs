//! Reference resolution pass.
//!
//! Resolves every sequence length reference and variant tag reference in
//! a trace class to a validated field path, and stores a snapshot of the
//! target's class next to it.
//!
//! # What This Pass Does
//!
//! 1. **Locates targets** - walks each path expression (absolute or
//!    relative) against the scope roots visible from the referring field
//! 2. **Enforces causality** - a referring field must come after its
//!    target in packet byte order, across scopes and within one scope
//! 3. **Enforces type compatibility** - sequence lengths are unsigned
//!    integers, variant tags are enumerations
//! 4. **Skips translated layers** - already-translated trace, stream and
//!    event classes are frozen, which makes the pass idempotent
//!
//! # Pipeline Position
//!
//! ```text
//! Parse → Resolve → Text Marking → IR Translation
//!           ^^^^^
//! ```
//!
//! # Two Phases Per Root
//!
//! Target lookup reads the same tree that resolution mutates, so each
//! scope root is processed in two phases: a collect phase that walks the
//! root immutably and records, per sequence/variant node, the node's
//! location plus its validated target path and class snapshot; and an
//! apply phase that replays the locations mutably and stores the
//! results. Visit order and the first-error abort are those of a single
//! recursive descent.

mod locate;
mod path;
mod stack;
mod validate;

use tracing::debug;
use tracewalk_meta::{
    EnumerationClass, EventClass, FieldClass, FieldPath, IntegerClass, Scope, ScopeRoots,
    StreamClass, TraceClass, ELEM_INDEX,
};

use crate::error::{ErrorKind, ResolveError, Result};
use stack::ClassStack;

/// Translation state of the layers enclosing the scope under resolution.
/// `None` means the layer is not in effect (no current stream or event
/// class).
#[derive(Clone, Copy, Debug)]
struct Layers {
    trace_translated: bool,
    stream_translated: Option<bool>,
    event_translated: Option<bool>,
}

/// Deferred mutation of one sequence or variant node.
enum PatchUpdate {
    SequenceLength {
        path: FieldPath,
        class: IntegerClass,
    },
    VariantTag {
        path: FieldPath,
        class: EnumerationClass,
    },
}

/// A resolved reference waiting for the apply phase: where the source
/// node lives under its root, and what to store there.
struct Patch {
    location: Vec<i64>,
    update: PatchUpdate,
}

/// Transient state of one collect phase.
pub(crate) struct ResolveContext<'a> {
    scopes: ScopeRoots<'a>,
    layers: Layers,
    root_scope: Scope,
    stack: ClassStack<'a>,
    patches: Vec<Patch>,
}

impl<'a> ResolveContext<'a> {
    fn new(root_scope: Scope, scopes: ScopeRoots<'a>, layers: Layers) -> Self {
        Self {
            scopes,
            layers,
            root_scope,
            stack: ClassStack::new(),
            patches: Vec::new(),
        }
    }

    /// Pre-order visit: resolve this node's reference if it has one, then
    /// descend into children with the stack tracking the way down.
    fn visit(&mut self, fc: &'a FieldClass) -> Result<()> {
        if matches!(fc, FieldClass::Sequence(_) | FieldClass::Variant(_)) {
            self.resolve_reference(fc).map_err(|e| {
                e.because(format!(
                    "cannot resolve {} field class's reference: location={}",
                    fc.kind_name(),
                    self.stack.field_path(self.root_scope),
                ))
            })?;
        }

        if fc.is_compound() {
            self.stack.push(fc);
            for i in 0..fc.child_count() {
                let index = match fc {
                    FieldClass::Array(_) | FieldClass::Sequence(_) => ELEM_INDEX,
                    _ => i as i64,
                };
                self.stack.set_top_index(index);
                let child = fc.child(index).ok_or_else(|| {
                    ResolveError::new(
                        ErrorKind::Internal,
                        format!("compound child vanished during traversal: index={index}"),
                    )
                })?;
                self.visit(child)?;
            }
            self.stack.pop();
        }
        Ok(())
    }

    /// Resolves the reference carried by a sequence or variant node and
    /// records the patch for the apply phase.
    fn resolve_reference(&mut self, fc: &'a FieldClass) -> Result<()> {
        let pathstr = match fc {
            FieldClass::Sequence(seq) => seq.length_ref.as_str(),
            FieldClass::Variant(var) => var.tag_ref.as_str(),
            _ => return Ok(()),
        };
        debug!(path = pathstr, kind = fc.kind_name(), "resolving field reference");

        let target_path = self.field_path_of(pathstr).map_err(|e| {
            e.because(format!(
                "cannot get target field path for path string: path=`{pathstr}`"
            ))
        })?;
        let target_fc = self.scopes.class_at(&target_path).map_err(|e| {
            ResolveError::new(
                ErrorKind::Internal,
                format!(
                    "cannot get target field class for path string: \
                     path=`{pathstr}`, target-field-path={target_path}: {e}"
                ),
            )
        })?;
        self.validate_target(fc, &target_path, target_fc).map_err(|e| {
            e.because(format!(
                "invalid target field path for path string: \
                 path=`{pathstr}`, target-field-path={target_path}"
            ))
        })?;

        let update = match (fc, target_fc) {
            (FieldClass::Sequence(_), FieldClass::Integer(int)) => PatchUpdate::SequenceLength {
                path: target_path,
                class: *int,
            },
            // An enumeration length narrows to its integer part.
            (FieldClass::Sequence(_), FieldClass::Enumeration(en)) => {
                PatchUpdate::SequenceLength {
                    path: target_path,
                    class: en.int,
                }
            }
            (FieldClass::Variant(_), FieldClass::Enumeration(en)) => PatchUpdate::VariantTag {
                path: target_path,
                class: en.clone(),
            },
            _ => {
                return Err(ResolveError::new(
                    ErrorKind::Internal,
                    format!("validated target has unexpected class: path=`{pathstr}`"),
                ))
            }
        };
        self.patches.push(Patch {
            location: self.stack.field_path(self.root_scope).indices().to_vec(),
            update,
        });
        Ok(())
    }
}

/// Collect phase over one scope root. Returns the patches to apply, or
/// nothing when the root class is absent.
fn collect_root(root_scope: Scope, scopes: ScopeRoots<'_>, layers: Layers) -> Result<Vec<Patch>> {
    let Some(root_fc) = scopes.class(root_scope) else {
        return Ok(Vec::new());
    };
    debug!(scope = %root_scope, "resolving root field class");
    let mut ctx = ResolveContext::new(root_scope, scopes, layers);
    ctx.visit(root_fc)?;
    debug_assert!(ctx.stack.is_empty());
    Ok(ctx.patches)
}

/// Apply phase: replay each patch's location against the (now mutable)
/// root and store the resolved path and class snapshot on the node.
fn apply_patches(root: Option<&mut FieldClass>, patches: Vec<Patch>) -> Result<()> {
    if patches.is_empty() {
        return Ok(());
    }
    let root = root.ok_or_else(|| {
        ResolveError::new(
            ErrorKind::Internal,
            "collected patches for an absent root field class",
        )
    })?;
    for patch in patches {
        let mut node = &mut *root;
        for &index in &patch.location {
            node = node.child_mut(index).ok_or_else(|| {
                ResolveError::new(
                    ErrorKind::Internal,
                    format!("resolved node location is unreachable: index={index}"),
                )
            })?;
        }
        match (node, patch.update) {
            (FieldClass::Sequence(seq), PatchUpdate::SequenceLength { path, class }) => {
                seq.length_path = Some(path);
                seq.length_class = Some(class);
            }
            (FieldClass::Variant(var), PatchUpdate::VariantTag { path, class }) => {
                var.tag_path = Some(path);
                var.tag_class = Some(class);
            }
            _ => {
                return Err(ResolveError::new(
                    ErrorKind::Internal,
                    "resolved node location does not name a sequence or variant",
                ))
            }
        }
    }
    Ok(())
}

fn resolve_event_class(
    stream_scopes: ScopeRoots<'_>,
    trace_translated: bool,
    stream_translated: bool,
    ec: &mut EventClass,
) -> Result<()> {
    if ec.is_translated {
        return Ok(());
    }
    let layers = Layers {
        trace_translated,
        stream_translated: Some(stream_translated),
        event_translated: Some(ec.is_translated),
    };

    let patches = collect_root(
        Scope::EventSpecificContext,
        ScopeRoots {
            event_specific_context: ec.spec_context.as_ref(),
            ..stream_scopes
        },
        layers,
    )
    .map_err(|e| e.because("cannot resolve event specific context field class"))?;
    apply_patches(ec.spec_context.as_mut(), patches)?;

    let patches = collect_root(
        Scope::EventPayload,
        ScopeRoots {
            event_specific_context: ec.spec_context.as_ref(),
            event_payload: ec.payload.as_ref(),
            ..stream_scopes
        },
        layers,
    )
    .map_err(|e| e.because("cannot resolve event payload field class"))?;
    apply_patches(ec.payload.as_mut(), patches)?;
    Ok(())
}

fn resolve_stream_class(
    packet_header: Option<&FieldClass>,
    trace_translated: bool,
    sc: &mut StreamClass,
) -> Result<()> {
    let layers = Layers {
        trace_translated,
        stream_translated: Some(sc.is_translated),
        event_translated: None,
    };

    if !sc.is_translated {
        let patches = collect_root(
            Scope::PacketContext,
            ScopeRoots {
                packet_header,
                packet_context: sc.packet_context.as_ref(),
                ..ScopeRoots::default()
            },
            layers,
        )
        .map_err(|e| e.because("cannot resolve packet context field class"))?;
        apply_patches(sc.packet_context.as_mut(), patches)?;

        let patches = collect_root(
            Scope::EventHeader,
            ScopeRoots {
                packet_header,
                packet_context: sc.packet_context.as_ref(),
                event_header: sc.event_header.as_ref(),
                ..ScopeRoots::default()
            },
            layers,
        )
        .map_err(|e| e.because("cannot resolve event header field class"))?;
        apply_patches(sc.event_header.as_mut(), patches)?;

        let patches = collect_root(
            Scope::EventCommonContext,
            ScopeRoots {
                packet_header,
                packet_context: sc.packet_context.as_ref(),
                event_header: sc.event_header.as_ref(),
                event_common_context: sc.event_common_context.as_ref(),
                ..ScopeRoots::default()
            },
            layers,
        )
        .map_err(|e| e.because("cannot resolve event common context field class"))?;
        apply_patches(sc.event_common_context.as_mut(), patches)?;
    }

    // Event payload may reference the stream scopes, so they stay
    // addressable even when the stream class itself is translated.
    let stream_translated = sc.is_translated;
    let StreamClass {
        packet_context,
        event_header,
        event_common_context,
        event_classes,
        ..
    } = sc;
    let stream_scopes = ScopeRoots {
        packet_header,
        packet_context: packet_context.as_ref(),
        event_header: event_header.as_ref(),
        event_common_context: event_common_context.as_ref(),
        ..ScopeRoots::default()
    };

    for ec in event_classes.iter_mut() {
        resolve_event_class(stream_scopes, trace_translated, stream_translated, ec).map_err(
            |e| {
                e.because(format!(
                    "cannot resolve event class's field classes: \
                     event-class-id={}, event-class-name=`{}`",
                    ec.id, ec.name,
                ))
            },
        )?;
    }
    Ok(())
}

/// Resolves every sequence length and variant tag reference of
/// `trace_class`.
///
/// Layers whose `is_translated` flag is set are skipped, so re-invoking
/// the pass on its own translated output is a no-op. On error the trace
/// class may be partially mutated and must be discarded.
pub fn resolve_trace_class(tc: &mut TraceClass) -> Result<()> {
    debug!("resolving trace class field classes");

    if !tc.is_translated {
        let layers = Layers {
            trace_translated: tc.is_translated,
            stream_translated: None,
            event_translated: None,
        };
        let patches = collect_root(
            Scope::PacketHeader,
            ScopeRoots {
                packet_header: tc.packet_header.as_ref(),
                ..ScopeRoots::default()
            },
            layers,
        )
        .map_err(|e| e.because("cannot resolve packet header field class"))?;
        apply_patches(tc.packet_header.as_mut(), patches)?;
    }

    let trace_translated = tc.is_translated;
    let packet_header = tc.packet_header.as_ref();
    for sc in tc.stream_classes.iter_mut() {
        resolve_stream_class(packet_header, trace_translated, sc).map_err(|e| {
            e.because(format!(
                "cannot resolve stream class's field classes: stream-class-id={}",
                sc.id
            ))
        })?;
    }
    Ok(())
}
