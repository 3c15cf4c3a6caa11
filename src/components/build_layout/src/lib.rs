mod build;
mod emit;
mod error;
mod lexer;
mod location;
mod parse;
mod select;
mod term;
mod token;
mod tool;

pub use build::build;
pub use emit::emit;
pub use error::{IngestError, IngestErrorKind, MalformedDump};
pub use lexer::lex;
pub use location::Location;
pub use parse::parse;
pub use select::select;
pub use term::{Binding, Term, TermKind};
pub use token::{DumpToken, DumpTokenKind};
pub use tool::{LayoutDumper, ToolFailure, ingest_with};

use layout::LayoutTable;

/// Deserializes a layout dump into its layout table. With a target, the
/// result is restricted to the target aggregate and everything it
/// references.
pub fn ingest(dump: &str, target: Option<&str>) -> Result<LayoutTable, IngestError> {
    let tokens = lex(dump)?;
    let bindings = parse(tokens)?;
    let mut table = build(bindings)?;

    if let Some(target) = target {
        select(&mut table, target)
            .map_err(|error| IngestError::from(IngestErrorKind::UnknownReference(error)))?;
    }

    Ok(table)
}

#[cfg(test)]
use data_units::BitUnits;
#[cfg(test)]
use indoc::indoc;
#[cfg(test)]
use layout::{Field, IntegerSign, Type};

#[cfg(test)]
fn int() -> Type {
    Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed)
}

#[test]
fn test_struct_basic() {
    // struct x { int y; unsigned char z; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(64, {'y': (0, Scalar(32, 'int', True)), 'z': (32, Scalar(8, 'unsigned char', False))})
        "},
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.fields.len(), 2);
    assert_eq!(x.field("y").unwrap(), &Field::new(BitUnits::ZERO, int()));
    assert_eq!(
        x.field("z").unwrap(),
        &Field::new(
            BitUnits::of(32),
            Type::scalar(BitUnits::of(8), "unsigned char", IntegerSign::Unsigned),
        ),
    );
}

#[test]
fn test_struct_pointer() {
    // struct x { void *p; void **h; const int ***z; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(192, {'p': (0, Pointer(64, Void())), 'h': (64, Pointer(64, Pointer(64, Void()))), 'z': (128, Pointer(64, Pointer(64, Pointer(64, Scalar(32, 'int', True)))))})
        "},
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.fields.len(), 3);
    assert_eq!(
        x.field("p").unwrap(),
        &Field::new(BitUnits::ZERO, Type::pointer(BitUnits::of(64), Type::Void)),
    );
    assert_eq!(
        x.field("h").unwrap(),
        &Field::new(
            BitUnits::of(64),
            Type::pointer(BitUnits::of(64), Type::pointer(BitUnits::of(64), Type::Void)),
        ),
    );
    assert_eq!(
        x.field("z").unwrap(),
        &Field::new(
            BitUnits::of(128),
            Type::pointer(
                BitUnits::of(64),
                Type::pointer(BitUnits::of(64), Type::pointer(BitUnits::of(64), int())),
            ),
        ),
    );
}

#[test]
fn test_struct_array() {
    // struct x { int arr[5]; void *p[2]; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(320, {'arr': (0, Array(160, 5, Scalar(32, 'int', True))), 'p': (192, Array(128, 2, Pointer(64, Void())))})
        "},
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.fields.len(), 2);
    assert_eq!(
        x.field("arr").unwrap(),
        &Field::new(BitUnits::ZERO, Type::array(5, int()).unwrap()),
    );
    assert_eq!(
        x.field("p").unwrap(),
        &Field::new(
            BitUnits::of(192),
            Type::array(2, Type::pointer(BitUnits::of(64), Type::Void)).unwrap(),
        ),
    );
}

#[test]
fn test_struct_array_two_dimensions() {
    // struct x { int arr[5][2]; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(320, {'arr': (0, Array(320, 5, Array(64, 2, Scalar(32, 'int', True))))})
        "},
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.fields.len(), 1);
    assert_eq!(
        x.field("arr").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::array(5, Type::array(2, int()).unwrap()).unwrap(),
        ),
    );
}

#[test]
fn test_struct_array_flexible_and_zero() {
    // struct x { int arr[0]; };
    let table = ingest(
        "structs = {'x': Struct(0, {'arr': (0, Array(0, 0, Scalar(32, 'int', True)))})}",
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.size, BitUnits::ZERO);
    assert_eq!(x.fields.len(), 1);
    assert_eq!(
        x.field("arr").unwrap(),
        &Field::new(BitUnits::ZERO, Type::array(0, int()).unwrap()),
    );

    // struct x { int y; int arr[]; }; the flexible tail sits after y and
    // takes no storage.
    let table = ingest(
        "structs = {'x': Struct(32, {'y': (0, Scalar(32, 'int', True)), 'arr': (32, Array(0, 0, Scalar(32, 'int', True)))})}",
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();
    assert_eq!(x.fields.len(), 2);
    assert_eq!(x.field("y").unwrap(), &Field::new(BitUnits::ZERO, int()));
    assert_eq!(
        x.field("arr").unwrap(),
        &Field::new(BitUnits::of(32), Type::array(0, int()).unwrap()),
    );
}

#[test]
fn test_struct_struct() {
    // struct a { int x; }; struct b { struct a aa; int xx; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
            structs['b'] = Struct(64, {'aa': (0, StructField(32, 'a')), 'xx': (32, Scalar(32, 'int', True))})
        "},
        Some("b"),
    )
    .unwrap();

    let b = table.get("b").unwrap();
    assert_eq!(b.fields.len(), 2);
    assert_eq!(
        b.field("aa").unwrap(),
        &Field::new(BitUnits::ZERO, Type::struct_field(BitUnits::of(32), "a")),
    );
    assert_eq!(b.field("xx").unwrap(), &Field::new(BitUnits::of(32), int()));
}

#[test]
fn test_struct_union() {
    // union u { int x; signed char c; long l; }; struct c { union u u; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['u'] = Struct(64, {'x': (0, Scalar(32, 'int', True)), 'c': (0, Scalar(8, 'signed char', True)), 'l': (0, Scalar(64, 'long int', True))})
            structs['c'] = Struct(64, {'u': (0, UnionField(64, 'u'))})
        "},
        Some("c"),
    )
    .unwrap();

    let c = table.get("c").unwrap();
    assert_eq!(c.fields.len(), 1);
    assert_eq!(
        c.field("u").unwrap(),
        &Field::new(BitUnits::ZERO, Type::union_field(BitUnits::of(64), "u")),
    );

    let u = table.get("u").unwrap();
    assert_eq!(u.size, BitUnits::of(64));
    assert_eq!(u.fields.len(), 3);
    assert_eq!(u.field("x").unwrap(), &Field::new(BitUnits::ZERO, int()));
    // "signed char", never bare "char", so the comparison is stable across
    // architectures with differing char signedness.
    assert_eq!(
        u.field("c").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::scalar(BitUnits::of(8), "signed char", IntegerSign::Signed),
        ),
    );
    assert_eq!(
        u.field("l").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::scalar(BitUnits::of(64), "long int", IntegerSign::Signed),
        ),
    );
}

#[test]
fn test_struct_anonymous_union() {
    // struct c { union { int x; float f; }; }; the unnamed union's members
    // appear directly in the enclosing struct.
    let table = ingest(
        "structs = {'c': Struct(32, {'x': (0, Scalar(32, 'int', True)), 'f': (0, Scalar(32, 'float', True))})}",
        Some("c"),
    )
    .unwrap();

    let c = table.get("c").unwrap();
    assert_eq!(c.fields.len(), 2);
    assert_eq!(c.field("x").unwrap(), &Field::new(BitUnits::ZERO, int()));
    assert_eq!(
        c.field("f").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::scalar(BitUnits::of(32), "float", IntegerSign::Signed),
        ),
    );
}

#[test]
fn test_struct_recursive_dump() {
    // struct a { int x; }; struct b { struct a a; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
            structs['b'] = Struct(32, {'a': (0, StructField(32, 'a'))})
        "},
        Some("b"),
    )
    .unwrap();

    let b = table.get("b").unwrap();
    assert_eq!(b.fields.len(), 1);

    let Type::StructField(reference) = &b.field("a").unwrap().ty else {
        panic!("expected struct field");
    };

    let a = table.resolve(reference).unwrap();
    assert_eq!(a.fields.len(), 1);
    assert_eq!(a.field("x").unwrap(), &Field::new(BitUnits::ZERO, int()));
}

#[test]
fn test_struct_dump_only_necessary() {
    // struct a { int x; }; struct b { int y; }; filtering on b excludes a.
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
            structs['b'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})
        "},
        Some("b"),
    )
    .unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(
        table.get("b").unwrap().field("y").unwrap(),
        &Field::new(BitUnits::ZERO, int()),
    );
    assert!(!table.contains("a"));
}

#[test]
fn test_struct_dump_all() {
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
            structs['b'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})
        "},
        None,
    )
    .unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_struct_bitfields() {
    // struct x { int bf1: 3; int: 5; int bf2: 1; int n; int bf3: 29; unsigned int bf4: 1; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(96, {'bf1': (0, Bitfield(3, True)), 'bf2': (8, Bitfield(1, True)), 'n': (32, Scalar(32, 'int', True)), 'bf3': (64, Bitfield(29, True)), 'bf4': (93, Bitfield(1, False))})
        "},
        Some("x"),
    )
    .unwrap();

    let x = table.get("x").unwrap();

    // The unnamed `int: 5` member consumed bits 3..8 without producing a
    // field.
    assert_eq!(x.fields.len(), 5);
    assert_eq!(
        x.field("bf1").unwrap(),
        &Field::new(BitUnits::ZERO, Type::Bitfield(BitUnits::of(3))),
    );
    assert_eq!(
        x.field("bf2").unwrap(),
        &Field::new(BitUnits::of(8), Type::Bitfield(BitUnits::of(1))),
    );
    assert_eq!(x.field("n").unwrap(), &Field::new(BitUnits::of(32), int()));
    assert_eq!(
        x.field("bf3").unwrap(),
        &Field::new(BitUnits::of(64), Type::Bitfield(BitUnits::of(29))),
    );
    assert_eq!(
        x.field("bf4").unwrap(),
        &Field::new(BitUnits::of(93), Type::Bitfield(BitUnits::of(1))),
    );
    assert_eq!(x.field("bf4").unwrap().end(), BitUnits::of(94));
}

#[test]
fn test_struct_function_ptrs() {
    // struct x { int (*f)(int); };
    let table = ingest(
        "structs = {'x': Struct(64, {'f': (0, Pointer(64, Function()))})}",
        Some("x"),
    )
    .unwrap();

    let f = table.get("x").unwrap().field("f").unwrap();
    assert!(f.ty.is_pointer());
    assert_eq!(
        f,
        &Field::new(BitUnits::ZERO, Type::pointer(BitUnits::of(64), Type::Function)),
    );
}

#[test]
fn test_struct_anonymous_enum() {
    // struct x { enum { x = 5, } e; };
    let table = ingest(
        "structs = {'x': Struct(32, {'e': (0, Scalar(32, 'anonymous enum', False))})}",
        Some("x"),
    )
    .unwrap();

    assert_eq!(
        table.get("x").unwrap().field("e").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::scalar(BitUnits::of(32), "anonymous enum", IntegerSign::Unsigned),
        ),
    );
}

#[test]
fn test_struct_typedefs() {
    // struct s { int y; }; typedef struct s s_t; struct x { s_t s1; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['s'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})
            structs['x'] = Struct(32, {'s1': (0, StructField(32, 's'))})
        "},
        None,
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(
        table.get("x").unwrap().field("s1").unwrap().ty,
        Type::struct_field(BitUnits::of(32), "s"),
    );
    // keyed by the tag, never the typedef alias
    assert!(table.contains("s"));
    assert!(!table.contains("s_t"));

    // typedef struct { int y; } s_t; struct x { s_t s1; };
    let table = ingest(
        indoc! {r"
            structs = {}
            structs['s_t'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})
            structs['x'] = Struct(32, {'s1': (0, StructField(32, 's_t'))})
        "},
        None,
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(
        table.get("x").unwrap().field("s1").unwrap().ty,
        Type::struct_field(BitUnits::of(32), "s_t"),
    );
    assert!(!table.contains("s"));
    assert!(table.contains("s_t"));

    // typedef enum { y = 1, } e_t; struct x { e_t e1; };
    let table = ingest(
        "structs = {'x': Struct(32, {'e1': (0, Scalar(32, 'e_t', False))})}",
        Some("x"),
    )
    .unwrap();

    assert_eq!(
        table.get("x").unwrap().field("e1").unwrap().ty,
        Type::scalar(BitUnits::of(32), "e_t", IntegerSign::Unsigned),
    );

    // typedef enum e { y = 1, } e_t; struct x { e_t e1; };
    let table = ingest(
        "structs = {'x': Struct(32, {'e1': (0, Scalar(32, 'e', False))})}",
        Some("x"),
    )
    .unwrap();

    assert_eq!(
        table.get("x").unwrap().field("e1").unwrap().ty,
        Type::scalar(BitUnits::of(32), "e", IntegerSign::Unsigned),
    );
}

#[test]
fn test_ingest_unknown_target() {
    use layout::UnknownReference;

    assert_eq!(
        ingest("structs = {'a': Struct(0, {})}", Some("b")).unwrap_err(),
        IngestError::from(IngestErrorKind::UnknownReference(UnknownReference {
            name: "b".into(),
        })),
    );
}
