use crate::Type;
use data_units::{BitUnits, ByteUnits};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::Display;

/// Layout of one struct or union: the total size the compiler chose for it
/// and every named field at the bit offset it was placed at. Fields iterate
/// in declaration order, but equality ignores that order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub size: BitUnits,
    pub fields: IndexMap<String, Field>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub offset: BitUnits,
    pub ty: Type,
}

impl Layout {
    pub fn new(size: BitUnits) -> Self {
        Self {
            size,
            fields: IndexMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Total size in whole bytes, as C `sizeof` would report it. `None`
    /// only for sizes that are not byte-granular.
    pub fn byte_size(&self) -> Option<ByteUnits> {
        self.size.to_bytes()
    }
}

impl Field {
    pub fn new(offset: BitUnits, ty: Type) -> Self {
        Self { offset, ty }
    }

    /// First bit past the field's storage.
    pub fn end(&self) -> BitUnits {
        self.offset + self.ty.size()
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{} bits {{}}", self.size.bits());
        }

        write!(
            f,
            "{} bits {{ {} }}",
            self.size.bits(),
            self.fields
                .iter()
                .map(|(name, field)| format!("{} @ {}: {}", name, field.offset.bits(), field.ty))
                .join(", "),
        )
    }
}

#[cfg(test)]
fn two_field_layout() -> Layout {
    use crate::IntegerSign;

    let mut layout = Layout::new(BitUnits::of(64));
    layout.fields.insert(
        "y".into(),
        Field::new(BitUnits::ZERO, Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed)),
    );
    layout.fields.insert(
        "z".into(),
        Field::new(
            BitUnits::of(32),
            Type::scalar(BitUnits::of(8), "unsigned char", IntegerSign::Unsigned),
        ),
    );
    layout
}

#[test]
fn test_fields_keep_declaration_order() {
    let layout = two_field_layout();

    assert_eq!(layout.fields.keys().collect_vec(), vec!["y", "z"]);
    assert_eq!(layout.field("z").unwrap().offset, BitUnits::of(32));
    assert_eq!(layout.field("z").unwrap().end(), BitUnits::of(40));
    assert!(layout.field("w").is_none());
}

#[test]
fn test_equality_ignores_field_order() {
    use crate::IntegerSign;

    let forward = two_field_layout();

    let mut backward = Layout::new(BitUnits::of(64));
    backward.fields.insert(
        "z".into(),
        Field::new(
            BitUnits::of(32),
            Type::scalar(BitUnits::of(8), "unsigned char", IntegerSign::Unsigned),
        ),
    );
    backward.fields.insert(
        "y".into(),
        Field::new(BitUnits::ZERO, Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed)),
    );

    assert_eq!(forward, backward);

    let mut resized = forward.clone();
    resized.size = BitUnits::of(96);
    assert_ne!(forward, resized);
}

#[test]
fn test_byte_size() {
    let layout = two_field_layout();
    assert_eq!(layout.byte_size(), Some(ByteUnits::of(8)));
    assert_eq!(Layout::new(BitUnits::ZERO).byte_size(), Some(ByteUnits::ZERO));
}

#[test]
fn test_display() {
    assert_eq!(
        two_field_layout().to_string(),
        "64 bits { y @ 0: int, z @ 32: unsigned char }",
    );
    assert_eq!(Layout::new(BitUnits::ZERO).to_string(), "0 bits {}");
}
