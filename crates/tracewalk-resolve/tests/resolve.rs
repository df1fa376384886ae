//! End-to-end resolution tests over hand-built trace classes.

use tracewalk_meta::{
    EnumerationClass, EventClass, FieldClass, FieldPath, IntegerClass, Scope, SequenceClass,
    StreamClass, StructureClass, TraceClass, VariantClass,
};
use tracewalk_resolve::{resolve_trace_class, ErrorKind};

fn uint(size: u32) -> FieldClass {
    FieldClass::Integer(IntegerClass::unsigned(size))
}

fn sint(size: u32) -> FieldClass {
    FieldClass::Integer(IntegerClass::signed(size))
}

fn seq(elem: FieldClass, length_ref: &str) -> FieldClass {
    FieldClass::Sequence(SequenceClass::new(elem, length_ref))
}

fn strukt(members: Vec<(&str, FieldClass)>) -> FieldClass {
    let mut s = StructureClass::new();
    for (name, class) in members {
        s = s.with_member(name, class);
    }
    FieldClass::Structure(s)
}

fn kind_enum(int: IntegerClass) -> FieldClass {
    FieldClass::Enumeration(
        EnumerationClass::new(int)
            .with_mapping("A", 0, 0)
            .with_mapping("B", 1, 1),
    )
}

/// One stream class, one event class, with the given payload.
fn trace_with_payload(payload: FieldClass) -> TraceClass {
    let mut ec = EventClass::new(17, "probe");
    ec.payload = Some(payload);
    let mut sc = StreamClass::new(3);
    sc.event_classes.push(ec);
    let mut tc = TraceClass::new();
    tc.stream_classes.push(sc);
    tc
}

fn payload_of(tc: &TraceClass) -> &FieldClass {
    tc.stream_classes[0].event_classes[0].payload.as_ref().unwrap()
}

#[test]
fn sibling_length_resolves() {
    let mut tc = trace_with_payload(strukt(vec![
        ("len", uint(32)),
        ("data", seq(uint(8), "len")),
    ]));
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(1).unwrap() else {
        panic!("expected sequence");
    };
    assert_eq!(
        data.length_path,
        Some(FieldPath::from_parts(Scope::EventPayload, [0]))
    );
    let length_class = data.length_class.unwrap();
    assert_eq!(length_class.size, 32);
    assert!(!length_class.is_signed);
}

#[test]
fn absolute_cross_scope_variant_tag_resolves() {
    let mut ec = EventClass::new(1, "choice");
    ec.payload = Some(strukt(vec![(
        "value",
        FieldClass::Variant(
            VariantClass::new("stream.event.context.kind")
                .with_option("a", uint(32))
                .with_option("b", uint(64)),
        ),
    )]));
    let mut sc = StreamClass::new(0);
    sc.event_common_context = Some(strukt(vec![(
        "kind",
        kind_enum(IntegerClass::unsigned(8)),
    )]));
    sc.event_classes.push(ec);
    let mut tc = TraceClass::new();
    tc.stream_classes.push(sc);

    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Variant(value) = payload_of(&tc).child(0).unwrap() else {
        panic!("expected variant");
    };
    assert_eq!(
        value.tag_path,
        Some(FieldPath::from_parts(Scope::EventCommonContext, [0]))
    );
    let tag_class = value.tag_class.as_ref().unwrap();
    assert_eq!(tag_class.mappings.len(), 2);
    assert_eq!(tag_class.mappings[0].label, "A");
}

#[test]
fn length_after_sequence_is_a_causality_error() {
    let mut tc = trace_with_payload(strukt(vec![
        ("data", seq(uint(8), "len")),
        ("len", uint(32)),
    ]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    // The sibling exists but decodes after the source.
    assert_eq!(err.kind, ErrorKind::Causality);

    let FieldClass::Sequence(data) = payload_of(&tc).child(0).unwrap() else {
        panic!("expected sequence");
    };
    assert!(data.length_path.is_none(), "failed run must not mutate");
    assert!(data.length_class.is_none());
}

#[test]
fn signed_length_target_is_a_type_error() {
    let mut tc = trace_with_payload(strukt(vec![
        ("len", sint(32)),
        ("data", seq(uint(8), "len")),
    ]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn non_enumeration_variant_tag_is_a_type_error() {
    let mut tc = trace_with_payload(strukt(vec![
        ("kind", uint(8)),
        (
            "value",
            FieldClass::Variant(VariantClass::new("kind").with_option("a", uint(32))),
        ),
    ]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn absolute_stream_reference_without_stream_class_fails() {
    // The packet header is resolved at trace level, before any stream
    // class is in effect.
    let mut tc = TraceClass::new();
    tc.packet_header = Some(strukt(vec![(
        "extra",
        seq(uint(8), "stream.packet.context.x"),
    )]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ScopePrecondition);
}

#[test]
fn nested_relative_reference_resolves_upward() {
    let mut tc = trace_with_payload(strukt(vec![(
        "a",
        strukt(vec![("b", uint(32)), ("c", seq(uint(8), "b"))]),
    )]));
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(c) = payload_of(&tc).child(0).unwrap().child(1).unwrap() else {
        panic!("expected sequence");
    };
    assert_eq!(
        c.length_path,
        Some(FieldPath::from_parts(Scope::EventPayload, [0, 0]))
    );
}

#[test]
fn relative_reference_skips_shadowed_inner_level() {
    // `n` exists both next to the sequence (after it) and one level up
    // (before the enclosing structure). The inner attempt fails on
    // causality and the outer one wins.
    let mut tc = trace_with_payload(strukt(vec![
        ("n", uint(32)),
        (
            "inner",
            strukt(vec![("data", seq(uint(8), "n")), ("n", uint(16))]),
        ),
    ]));
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(1).unwrap().child(0).unwrap() else {
        panic!("expected sequence");
    };
    assert_eq!(
        data.length_path,
        Some(FieldPath::from_parts(Scope::EventPayload, [0]))
    );
    assert_eq!(data.length_class.unwrap().size, 32);
}

#[test]
fn enumeration_length_narrows_to_its_integer() {
    let mut tc = trace_with_payload(strukt(vec![
        ("n", kind_enum(IntegerClass::unsigned(16))),
        ("data", seq(uint(8), "n")),
    ]));
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(1).unwrap() else {
        panic!("expected sequence");
    };
    let length_class = data.length_class.unwrap();
    assert_eq!(length_class.size, 16);
    assert!(!length_class.is_signed);
}

#[test]
fn signed_enumeration_length_is_a_type_error() {
    let mut tc = trace_with_payload(strukt(vec![
        ("n", kind_enum(IntegerClass::signed(16))),
        ("data", seq(uint(8), "n")),
    ]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn target_enclosing_the_source_is_rejected() {
    // The sequence references the structure that contains it.
    let mut tc = trace_with_payload(strukt(vec![(
        "s",
        strukt(vec![("q", seq(uint(8), "s"))]),
    )]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Causality);
}

#[test]
fn self_reference_is_rejected() {
    let mut tc = trace_with_payload(strukt(vec![("data", seq(uint(8), "data"))]));
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Causality);
}

#[test]
fn payload_may_reference_event_specific_context() {
    let mut ec = EventClass::new(2, "ctxref");
    ec.spec_context = Some(strukt(vec![("count", uint(32))]));
    ec.payload = Some(strukt(vec![("data", seq(uint(8), "event.context.count"))]));
    let mut sc = StreamClass::new(0);
    sc.event_classes.push(ec);
    let mut tc = TraceClass::new();
    tc.stream_classes.push(sc);

    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(0).unwrap() else {
        panic!("expected sequence");
    };
    assert_eq!(
        data.length_path,
        Some(FieldPath::from_parts(Scope::EventSpecificContext, [0]))
    );
}

#[test]
fn event_classes_resolve_under_translated_stream_class() {
    // A translated stream class skips its own roots but its event
    // classes may still need resolution.
    let mut tc = trace_with_payload(strukt(vec![
        ("len", uint(32)),
        ("data", seq(uint(8), "len")),
    ]));
    tc.stream_classes[0].is_translated = true;
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(1).unwrap() else {
        panic!("expected sequence");
    };
    assert!(data.length_path.is_some());
}

#[test]
fn absolute_reference_into_translated_stream_fails() {
    let mut ec = EventClass::new(4, "late");
    ec.payload = Some(strukt(vec![(
        "data",
        seq(uint(8), "stream.event.context.len"),
    )]));
    let mut sc = StreamClass::new(1);
    sc.event_common_context = Some(strukt(vec![("len", uint(32))]));
    sc.event_classes.push(ec);
    sc.is_translated = true;
    let mut tc = TraceClass::new();
    tc.stream_classes.push(sc);

    // The reference reaches into the translated stream layer, which the
    // preconditions refuse.
    let err = resolve_trace_class(&mut tc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ScopePrecondition);
}

#[test]
fn translated_event_class_is_skipped() {
    let mut tc = trace_with_payload(strukt(vec![
        ("data", seq(uint(8), "missing")),
    ]));
    tc.stream_classes[0].event_classes[0].is_translated = true;
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(0).unwrap() else {
        panic!("expected sequence");
    };
    assert!(data.length_path.is_none());
}

#[test]
fn resolution_is_idempotent() {
    let mut tc = trace_with_payload(strukt(vec![
        ("len", uint(32)),
        ("data", seq(uint(8), "len")),
    ]));
    resolve_trace_class(&mut tc).unwrap();

    // Re-running over the untranslated tree recomputes the same result.
    let first = tc.clone();
    resolve_trace_class(&mut tc).unwrap();
    assert_eq!(tc, first);

    // A fully translated tree is left alone entirely.
    tc.is_translated = true;
    for sc in &mut tc.stream_classes {
        sc.is_translated = true;
        for ec in &mut sc.event_classes {
            ec.is_translated = true;
        }
    }
    let frozen = tc.clone();
    resolve_trace_class(&mut tc).unwrap();
    assert_eq!(tc, frozen);
}

#[test]
fn error_cause_chain_names_each_layer() {
    let mut tc = trace_with_payload(strukt(vec![
        ("data", seq(uint(8), "len")),
        ("len", uint(32)),
    ]));
    let err = resolve_trace_class(&mut tc).unwrap_err();

    let chain = err.causes.join("\n");
    assert!(chain.contains("path=`len`"), "chain:\n{chain}");
    assert!(chain.contains("event payload"), "chain:\n{chain}");
    assert!(
        chain.contains("event-class-id=17") && chain.contains("event-class-name=`probe`"),
        "chain:\n{chain}"
    );
    assert!(chain.contains("stream-class-id=3"), "chain:\n{chain}");
}

#[test]
fn resolved_paths_are_reachable_through_scope_roots() {
    let mut tc = trace_with_payload(strukt(vec![
        ("len", uint(32)),
        ("data", seq(uint(8), "len")),
    ]));
    resolve_trace_class(&mut tc).unwrap();

    let FieldClass::Sequence(data) = payload_of(&tc).child(1).unwrap() else {
        panic!("expected sequence");
    };
    let roots = tc.scope_roots(Some(0), Some(0));
    let target = roots.class_at(data.length_path.as_ref().unwrap()).unwrap();
    assert!(matches!(target, FieldClass::Integer(int) if !int.is_signed));
}
