use crate::{IntegerSign, InvalidShape};
use data_units::BitUnits;
use derive_more::IsVariant;
use std::fmt::Display;

/// Storage shape of a single C type as placed by the compiler.
///
/// Aggregate-typed members are held by name only (`StructField` /
/// `UnionField`), never by owning the referenced layout, so recursive and
/// mutually recursive aggregates stay finite. The names resolve against the
/// `LayoutTable` that produced them.
#[derive(Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum Type {
    Void,
    Bitfield(BitUnits),
    Scalar(Scalar),
    StructField(AggregateRef),
    UnionField(AggregateRef),
    Function,
    Pointer(Box<Pointer>),
    Array(Box<Array>),
}

/// An arithmetic or enum base type. `name` is the normalized spelling the
/// compiler reports ("signed char" and "unsigned char" rather than plain
/// "char", "long int" rather than "long"); enums carry their tag name,
/// their typedef name when tagless, or "anonymous enum".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scalar {
    pub name: String,
    pub sign: IntegerSign,
    pub width: BitUnits,
}

/// By-name reference to an aggregate in the layout table. Only the name and
/// total size participate in equality; the referenced layout's contents do
/// not, so comparing recursive types terminates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateRef {
    pub name: String,
    pub size: BitUnits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    pub width: BitUnits,
    pub pointee: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Array {
    pub size: BitUnits,
    pub count: u64,
    pub element: Type,
}

impl Type {
    pub fn scalar(width: BitUnits, name: impl Into<String>, sign: IntegerSign) -> Self {
        Self::Scalar(Scalar {
            name: name.into(),
            sign,
            width,
        })
    }

    pub fn struct_field(size: BitUnits, name: impl Into<String>) -> Self {
        Self::StructField(AggregateRef {
            name: name.into(),
            size,
        })
    }

    pub fn union_field(size: BitUnits, name: impl Into<String>) -> Self {
        Self::UnionField(AggregateRef {
            name: name.into(),
            size,
        })
    }

    pub fn pointer(width: BitUnits, pointee: Type) -> Self {
        Self::Pointer(Box::new(Pointer { width, pointee }))
    }

    /// Array of `count` elements. The total size is always the product of
    /// the element size and the count, including zero for flexible and
    /// zero-length array members.
    pub fn array(count: u64, element: Type) -> Result<Self, InvalidShape> {
        let size = element
            .size()
            .checked_mul(count)
            .ok_or(InvalidShape::ArraySizeOverflow {
                count,
                element: element.size(),
            })?;

        Ok(Self::Array(Box::new(Array {
            size,
            count,
            element,
        })))
    }

    /// Array whose total size was stated externally. Fails unless the
    /// stated size is exactly `count` times the element size.
    pub fn array_with_size(
        size: BitUnits,
        count: u64,
        element: Type,
    ) -> Result<Self, InvalidShape> {
        let expected = element
            .size()
            .checked_mul(count)
            .ok_or(InvalidShape::ArraySizeOverflow {
                count,
                element: element.size(),
            })?;

        if expected != size {
            return Err(InvalidShape::ArraySizeMismatch {
                stated: size,
                count,
                element: element.size(),
            });
        }

        Ok(Self::Array(Box::new(Array {
            size,
            count,
            element,
        })))
    }

    /// Storage size in bits. Zero for `void`, functions, and zero-length
    /// arrays.
    pub fn size(&self) -> BitUnits {
        match self {
            Type::Void | Type::Function => BitUnits::ZERO,
            Type::Bitfield(width) => *width,
            Type::Scalar(scalar) => scalar.width,
            Type::StructField(reference) | Type::UnionField(reference) => reference.size,
            Type::Pointer(pointer) => pointer.width,
            Type::Array(array) => array.size,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Bitfield(width) => write!(f, "bitfield<{}>", width.bits()),
            Type::Scalar(scalar) => f.write_str(&scalar.name),
            Type::StructField(reference) => write!(f, "struct<{}>", reference.name),
            Type::UnionField(reference) => write!(f, "union<{}>", reference.name),
            Type::Function => f.write_str("function"),
            Type::Pointer(pointer) => write!(f, "ptr<{}>", pointer.pointee),
            Type::Array(array) => write!(f, "array<{}, {}>", array.count, array.element),
        }
    }
}

#[test]
fn test_equality_is_structural() {
    let int = || Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed);

    assert_eq!(int(), int());
    assert_eq!(Type::pointer(BitUnits::of(64), int()), Type::pointer(BitUnits::of(64), int()));
    assert_eq!(
        Type::struct_field(BitUnits::of(96), "node"),
        Type::struct_field(BitUnits::of(96), "node"),
    );

    assert_ne!(int(), Type::scalar(BitUnits::of(32), "unsigned int", IntegerSign::Unsigned));
    assert_ne!(Type::Bitfield(BitUnits::of(3)), Type::Bitfield(BitUnits::of(4)));
    assert_ne!(
        Type::struct_field(BitUnits::of(64), "u"),
        Type::union_field(BitUnits::of(64), "u"),
    );
    assert_ne!(
        Type::pointer(BitUnits::of(64), Type::Void),
        Type::pointer(BitUnits::of(32), Type::Void),
    );
}

#[test]
fn test_equality_is_an_equivalence() {
    // Three independently built values, nested through the recursive
    // variants.
    let grid = || {
        Type::pointer(
            BitUnits::of(64),
            Type::array(2, Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed)).unwrap(),
        )
    };

    let a = grid();
    let b = grid();
    let c = grid();

    assert!(a == a);
    assert!(a == b && b == a);
    assert!(a == b && b == c && a == c);

    let narrower = Type::pointer(BitUnits::of(32), Type::Void);
    assert!(a != narrower && narrower != a);
}

#[test]
fn test_array_size_is_count_times_element() {
    let int = Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed);

    let five = Type::array(5, int.clone()).unwrap();
    assert_eq!(five.size(), BitUnits::of(160));

    let none = Type::array(0, int.clone()).unwrap();
    assert_eq!(none.size(), BitUnits::ZERO);

    let matrix = Type::array(5, Type::array(2, int.clone()).unwrap()).unwrap();
    assert_eq!(matrix.size(), BitUnits::of(320));

    assert_eq!(Type::array_with_size(BitUnits::of(160), 5, int.clone()), Ok(five));

    assert_eq!(
        Type::array_with_size(BitUnits::of(128), 5, int.clone()),
        Err(InvalidShape::ArraySizeMismatch {
            stated: BitUnits::of(128),
            count: 5,
            element: BitUnits::of(32),
        }),
    );

    assert_eq!(
        Type::array(u64::MAX, int),
        Err(InvalidShape::ArraySizeOverflow {
            count: u64::MAX,
            element: BitUnits::of(32),
        }),
    );
}

#[test]
fn test_describe() {
    let int = Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed);

    assert_eq!(Type::Void.to_string(), "void");
    assert_eq!(Type::Function.to_string(), "function");
    assert_eq!(Type::Bitfield(BitUnits::of(3)).to_string(), "bitfield<3>");
    assert_eq!(int.to_string(), "int");
    assert_eq!(Type::struct_field(BitUnits::of(64), "a").to_string(), "struct<a>");
    assert_eq!(Type::union_field(BitUnits::of(64), "u").to_string(), "union<u>");
    assert_eq!(
        Type::pointer(BitUnits::of(64), Type::pointer(BitUnits::of(64), Type::Void)).to_string(),
        "ptr<ptr<void>>",
    );
    assert_eq!(
        Type::array(5, Type::array(2, int).unwrap()).unwrap().to_string(),
        "array<5, array<2, int>>",
    );
}
