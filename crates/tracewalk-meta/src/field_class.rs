//! Field classes.
//!
//! A field class describes the layout of one field in a CTF data stream.
//! The metadata parser produces a tree of these; compound classes
//! (structure, variant, array, sequence) own their children, so the tree
//! is acyclic and fully owned by its enclosing trace class.
//!
//! Sequence and variant classes carry a textual reference (`length_ref`,
//! `tag_ref`) straight out of the metadata text. Resolution fills in the
//! corresponding `length_path`/`tag_path` and a snapshot of the target's
//! class (`length_class`/`tag_class`); until then those slots are `None`.

use indexmap::IndexMap;

use crate::field_path::{FieldPath, ELEM_INDEX};

/// Byte order of a fixed-size field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Preferred display base of an integer field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DisplayBase {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

/// Text encoding tag of an integer or string field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Encoding {
    None,
    Utf8,
}

/// Fixed-size integer field class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntegerClass {
    /// Size in bits.
    pub size: u32,
    /// Alignment in bits.
    pub alignment: u32,
    pub is_signed: bool,
    pub base: DisplayBase,
    pub byte_order: ByteOrder,
    pub encoding: Encoding,
}

impl IntegerClass {
    /// Creates an unsigned integer class of `size` bits with the default
    /// TSDL alignment (byte-aligned when the size is a whole number of
    /// bytes, bit-aligned otherwise).
    pub fn unsigned(size: u32) -> Self {
        Self {
            size,
            alignment: if size % 8 == 0 { 8 } else { 1 },
            is_signed: false,
            base: DisplayBase::Decimal,
            byte_order: ByteOrder::LittleEndian,
            encoding: Encoding::None,
        }
    }

    /// Creates a signed integer class of `size` bits.
    pub fn signed(size: u32) -> Self {
        Self {
            is_signed: true,
            ..Self::unsigned(size)
        }
    }
}

/// One labeled value range of an enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EnumerationRange {
    pub lower: i64,
    pub upper: i64,
}

/// A label of an enumeration and the ranges it covers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EnumerationMapping {
    pub label: String,
    pub ranges: Vec<EnumerationRange>,
}

impl EnumerationMapping {
    pub fn new(label: impl Into<String>, ranges: Vec<EnumerationRange>) -> Self {
        Self {
            label: label.into(),
            ranges,
        }
    }
}

/// Enumeration field class: an integer plus labeled ranges.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EnumerationClass {
    /// The underlying integer class.
    pub int: IntegerClass,
    pub mappings: Vec<EnumerationMapping>,
}

impl EnumerationClass {
    pub fn new(int: IntegerClass) -> Self {
        Self {
            int,
            mappings: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, label: impl Into<String>, lower: i64, upper: i64) -> Self {
        self.mappings.push(EnumerationMapping::new(
            label,
            vec![EnumerationRange { lower, upper }],
        ));
        self
    }
}

/// Floating-point field class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FloatClass {
    /// Size in bits (32 or 64).
    pub size: u32,
    /// Alignment in bits.
    pub alignment: u32,
    pub byte_order: ByteOrder,
}

impl FloatClass {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            alignment: 8,
            byte_order: ByteOrder::LittleEndian,
        }
    }
}

/// Null-terminated string field class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StringClass {
    pub encoding: Encoding,
}

impl Default for StringClass {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
        }
    }
}

/// Structure field class: ordered named members.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructureClass {
    /// Members in declaration order, addressable by name.
    pub members: IndexMap<String, FieldClass>,
}

impl StructureClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member, builder style.
    pub fn with_member(mut self, name: impl Into<String>, class: FieldClass) -> Self {
        self.members.insert(name.into(), class);
        self
    }
}

/// Variant field class: ordered named options selected by a tag field.
///
/// `tag_ref` is the unresolved path expression from the metadata text;
/// `tag_path` and `tag_class` are filled by resolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariantClass {
    /// Options in declaration order, addressable by name.
    pub options: IndexMap<String, FieldClass>,
    /// Unresolved tag reference.
    pub tag_ref: String,
    /// Resolved path to the tag field.
    pub tag_path: Option<FieldPath>,
    /// Snapshot of the resolved tag field class.
    pub tag_class: Option<EnumerationClass>,
}

impl VariantClass {
    pub fn new(tag_ref: impl Into<String>) -> Self {
        Self {
            options: IndexMap::new(),
            tag_ref: tag_ref.into(),
            tag_path: None,
            tag_class: None,
        }
    }

    /// Appends an option, builder style.
    pub fn with_option(mut self, name: impl Into<String>, class: FieldClass) -> Self {
        self.options.insert(name.into(), class);
        self
    }
}

/// Fixed-length array field class.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayClass {
    pub elem: Box<FieldClass>,
    pub length: u64,
    /// Whether the element layout makes this array hold text bytes.
    pub is_text: bool,
}

impl ArrayClass {
    pub fn new(elem: FieldClass, length: u64) -> Self {
        Self {
            elem: Box::new(elem),
            length,
            is_text: false,
        }
    }
}

/// Dynamic-length sequence field class.
///
/// `length_ref` is the unresolved path expression from the metadata text;
/// `length_path` and `length_class` are filled by resolution. A resolved
/// length class is always an unsigned integer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequenceClass {
    pub elem: Box<FieldClass>,
    /// Unresolved length reference.
    pub length_ref: String,
    /// Resolved path to the length field.
    pub length_path: Option<FieldPath>,
    /// Snapshot of the resolved length field class.
    pub length_class: Option<IntegerClass>,
    /// Whether the element layout makes this sequence hold text bytes.
    pub is_text: bool,
}

impl SequenceClass {
    pub fn new(elem: FieldClass, length_ref: impl Into<String>) -> Self {
        Self {
            elem: Box::new(elem),
            length_ref: length_ref.into(),
            length_path: None,
            length_class: None,
            is_text: false,
        }
    }
}

/// A field class.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FieldClass {
    Integer(IntegerClass),
    Enumeration(EnumerationClass),
    Float(FloatClass),
    String(StringClass),
    Structure(StructureClass),
    Variant(VariantClass),
    Array(ArrayClass),
    Sequence(SequenceClass),
}

impl FieldClass {
    /// Short class-kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldClass::Integer(_) => "integer",
            FieldClass::Enumeration(_) => "enumeration",
            FieldClass::Float(_) => "floating-point",
            FieldClass::String(_) => "string",
            FieldClass::Structure(_) => "structure",
            FieldClass::Variant(_) => "variant",
            FieldClass::Array(_) => "array",
            FieldClass::Sequence(_) => "sequence",
        }
    }

    /// Whether this class has child field classes.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            FieldClass::Structure(_)
                | FieldClass::Variant(_)
                | FieldClass::Array(_)
                | FieldClass::Sequence(_)
        )
    }

    /// Number of children: member/option count for structures and
    /// variants, 1 for arrays and sequences, 0 for leaves.
    pub fn child_count(&self) -> usize {
        match self {
            FieldClass::Structure(s) => s.members.len(),
            FieldClass::Variant(v) => v.options.len(),
            FieldClass::Array(_) | FieldClass::Sequence(_) => 1,
            _ => 0,
        }
    }

    /// Child at a field-path index: a member/option position for
    /// structures and variants, [`ELEM_INDEX`] for the element of an
    /// array or sequence.
    pub fn child(&self, index: i64) -> Option<&FieldClass> {
        match self {
            FieldClass::Structure(s) => {
                let index = usize::try_from(index).ok()?;
                s.members.get_index(index).map(|(_, class)| class)
            }
            FieldClass::Variant(v) => {
                let index = usize::try_from(index).ok()?;
                v.options.get_index(index).map(|(_, class)| class)
            }
            FieldClass::Array(a) if index == ELEM_INDEX => Some(&a.elem),
            FieldClass::Sequence(s) if index == ELEM_INDEX => Some(&s.elem),
            _ => None,
        }
    }

    /// Mutable variant of [`FieldClass::child`].
    pub fn child_mut(&mut self, index: i64) -> Option<&mut FieldClass> {
        match self {
            FieldClass::Structure(s) => {
                let index = usize::try_from(index).ok()?;
                s.members.get_index_mut(index).map(|(_, class)| class)
            }
            FieldClass::Variant(v) => {
                let index = usize::try_from(index).ok()?;
                v.options.get_index_mut(index).map(|(_, class)| class)
            }
            FieldClass::Array(a) if index == ELEM_INDEX => Some(&mut a.elem),
            FieldClass::Sequence(s) if index == ELEM_INDEX => Some(&mut s.elem),
            _ => None,
        }
    }

    /// Position of the member or option named `name`, for structures and
    /// variants.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        match self {
            FieldClass::Structure(s) => s.members.get_index_of(name),
            FieldClass::Variant(v) => v.options.get_index_of(name),
            _ => None,
        }
    }

    /// Name of the child at `index`, for structures and variants.
    pub fn child_name(&self, index: usize) -> Option<&str> {
        match self {
            FieldClass::Structure(s) => s.members.get_index(index).map(|(name, _)| name.as_str()),
            FieldClass::Variant(v) => v.options.get_index(index).map(|(name, _)| name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_struct() -> FieldClass {
        FieldClass::Structure(
            StructureClass::new()
                .with_member("id", FieldClass::Integer(IntegerClass::unsigned(16)))
                .with_member("len", FieldClass::Integer(IntegerClass::unsigned(32)))
                .with_member(
                    "data",
                    FieldClass::Sequence(SequenceClass::new(
                        FieldClass::Integer(IntegerClass::unsigned(8)),
                        "len",
                    )),
                ),
        )
    }

    #[test]
    fn test_child_index_by_name() {
        let fc = sample_struct();
        assert_eq!(fc.child_index("id"), Some(0));
        assert_eq!(fc.child_index("data"), Some(2));
        assert_eq!(fc.child_index("nope"), None);
    }

    #[test]
    fn test_child_by_position() {
        let fc = sample_struct();
        assert!(matches!(fc.child(1), Some(FieldClass::Integer(_))));
        assert!(matches!(fc.child(2), Some(FieldClass::Sequence(_))));
        assert!(fc.child(3).is_none());
        assert!(fc.child(ELEM_INDEX).is_none());
    }

    #[test]
    fn test_array_and_sequence_element_child() {
        let arr = FieldClass::Array(ArrayClass::new(
            FieldClass::Integer(IntegerClass::unsigned(8)),
            4,
        ));
        assert_eq!(arr.child_count(), 1);
        assert!(arr.child(ELEM_INDEX).is_some());
        assert!(arr.child(0).is_none());
    }

    #[test]
    fn test_leaves_have_no_children() {
        let fc = FieldClass::String(StringClass::default());
        assert!(!fc.is_compound());
        assert_eq!(fc.child_count(), 0);
        assert!(fc.child(0).is_none());
        assert_eq!(fc.child_index("x"), None);
    }

    #[test]
    fn test_default_integer_alignment() {
        assert_eq!(IntegerClass::unsigned(32).alignment, 8);
        assert_eq!(IntegerClass::unsigned(5).alignment, 1);
        assert!(IntegerClass::signed(8).is_signed);
    }
}
