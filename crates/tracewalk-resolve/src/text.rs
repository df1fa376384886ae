//! Text array/sequence marking pass.
//!
//! Arrays and sequences whose element is an 8-bit, byte-aligned, UTF-8
//! encoded integer hold text. Marking them lets the decoder read the
//! whole run as a string instead of element by element. Runs after
//! reference resolution, with the same translated-layer skipping.

use tracewalk_meta::{Encoding, FieldClass, TraceClass};

/// Marks every text array and sequence of `trace_class`, skipping
/// translated layers.
pub fn mark_text_array_sequences(tc: &mut TraceClass) {
    if !tc.is_translated {
        mark_root(tc.packet_header.as_mut());
    }

    for sc in &mut tc.stream_classes {
        if !sc.is_translated {
            mark_root(sc.packet_context.as_mut());
            mark_root(sc.event_header.as_mut());
            mark_root(sc.event_common_context.as_mut());
        }

        for ec in &mut sc.event_classes {
            if ec.is_translated {
                continue;
            }
            mark_root(ec.spec_context.as_mut());
            mark_root(ec.payload.as_mut());
        }
    }
}

fn mark_root(fc: Option<&mut FieldClass>) {
    if let Some(fc) = fc {
        mark_class(fc);
    }
}

fn mark_class(fc: &mut FieldClass) {
    match fc {
        FieldClass::Structure(s) => {
            for (_, member) in s.members.iter_mut() {
                mark_class(member);
            }
        }
        FieldClass::Variant(v) => {
            for (_, option) in v.options.iter_mut() {
                mark_class(option);
            }
        }
        FieldClass::Array(a) => {
            a.is_text = elem_is_text(&mut a.elem);
            mark_class(&mut a.elem);
        }
        FieldClass::Sequence(s) => {
            s.is_text = elem_is_text(&mut s.elem);
            mark_class(&mut s.elem);
        }
        _ => {}
    }
}

/// Checks whether `elem` makes its container a text array/sequence and,
/// if so, forces it unsigned so the decoder reads text bytes through a
/// single path.
fn elem_is_text(elem: &mut FieldClass) -> bool {
    let int = match elem {
        FieldClass::Integer(int) => int,
        FieldClass::Enumeration(en) => &mut en.int,
        _ => return false,
    };
    if int.alignment == 8 && int.size == 8 && int.encoding == Encoding::Utf8 {
        int.is_signed = false;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracewalk_meta::{
        ArrayClass, EventClass, IntegerClass, SequenceClass, StreamClass, StructureClass,
    };

    fn utf8_byte() -> FieldClass {
        let mut int = IntegerClass::signed(8);
        int.encoding = Encoding::Utf8;
        FieldClass::Integer(int)
    }

    fn trace_with_payload(payload: FieldClass) -> TraceClass {
        let mut ec = EventClass::new(0, "ev");
        ec.payload = Some(payload);
        let mut sc = StreamClass::new(0);
        sc.event_classes.push(ec);
        let mut tc = TraceClass::new();
        tc.stream_classes.push(sc);
        tc
    }

    #[test]
    fn test_marks_utf8_byte_array_and_forces_unsigned() {
        let payload = FieldClass::Structure(
            StructureClass::new()
                .with_member("name", FieldClass::Array(ArrayClass::new(utf8_byte(), 16))),
        );
        let mut tc = trace_with_payload(payload);
        mark_text_array_sequences(&mut tc);

        let payload = tc.stream_classes[0].event_classes[0].payload.as_ref().unwrap();
        let FieldClass::Array(arr) = payload.child(0).unwrap() else {
            panic!("expected array");
        };
        assert!(arr.is_text);
        assert!(matches!(&*arr.elem, FieldClass::Integer(int) if !int.is_signed));
    }

    #[test]
    fn test_skips_non_text_elements() {
        let payload = FieldClass::Structure(StructureClass::new().with_member(
            "data",
            FieldClass::Sequence(SequenceClass::new(
                FieldClass::Integer(IntegerClass::unsigned(32)),
                "len",
            )),
        ));
        let mut tc = trace_with_payload(payload);
        mark_text_array_sequences(&mut tc);

        let payload = tc.stream_classes[0].event_classes[0].payload.as_ref().unwrap();
        let FieldClass::Sequence(seq) = payload.child(0).unwrap() else {
            panic!("expected sequence");
        };
        assert!(!seq.is_text);
    }

    #[test]
    fn test_translated_event_class_is_skipped() {
        let payload = FieldClass::Structure(
            StructureClass::new()
                .with_member("name", FieldClass::Array(ArrayClass::new(utf8_byte(), 16))),
        );
        let mut tc = trace_with_payload(payload);
        tc.stream_classes[0].event_classes[0].is_translated = true;
        mark_text_array_sequences(&mut tc);

        let payload = tc.stream_classes[0].event_classes[0].payload.as_ref().unwrap();
        let FieldClass::Array(arr) = payload.child(0).unwrap() else {
            panic!("expected array");
        };
        assert!(!arr.is_text, "translated layers are frozen");
    }
}
