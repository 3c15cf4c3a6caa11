use itertools::Itertools;
use layout::{Layout, LayoutTable, Type};

/// Renders a layout table in the same form the analysis tool writes it,
/// one `structs[...]` binding per aggregate in declaration order.
pub fn emit(table: &LayoutTable) -> String {
    let mut dump = String::from("structs = {}\n");

    for (name, layout) in table.iter() {
        dump.push_str(&format!(
            "structs[{}] = {}\n",
            quote(name),
            render_layout(layout),
        ));
    }

    dump
}

fn render_layout(layout: &Layout) -> String {
    format!(
        "Struct({}, {{{}}})",
        layout.size.bits(),
        layout
            .fields
            .iter()
            .map(|(name, field)| format!(
                "{}: ({}, {})",
                quote(name),
                field.offset.bits(),
                render_type(&field.ty),
            ))
            .join(", "),
    )
}

fn render_type(ty: &Type) -> String {
    match ty {
        Type::Void => "Void()".into(),
        Type::Function => "Function()".into(),
        Type::Bitfield(width) => format!("Bitfield({})", width.bits()),
        Type::Scalar(scalar) => format!(
            "Scalar({}, {}, {})",
            scalar.width.bits(),
            quote(&scalar.name),
            if scalar.sign.is_signed() { "True" } else { "False" },
        ),
        Type::StructField(reference) => format!(
            "StructField({}, {})",
            reference.size.bits(),
            quote(&reference.name),
        ),
        Type::UnionField(reference) => format!(
            "UnionField({}, {})",
            reference.size.bits(),
            quote(&reference.name),
        ),
        Type::Pointer(pointer) => format!(
            "Pointer({}, {})",
            pointer.width.bits(),
            render_type(&pointer.pointee),
        ),
        Type::Array(array) => format!(
            "Array({}, {}, {})",
            array.size.bits(),
            array.count,
            render_type(&array.element),
        ),
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');

    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\0' => quoted.push_str("\\0"),
            _ => quoted.push(c),
        }
    }

    quoted.push('\'');
    quoted
}

#[test]
fn test_emit_matches_tool_output() {
    use indoc::indoc;

    let dump = indoc! {r"
        structs = {}
        structs['u'] = Struct(64, {'x': (0, Scalar(32, 'int', True)), 'l': (0, Scalar(64, 'long int', True))})
        structs['c'] = Struct(128, {'u': (0, UnionField(64, 'u')), 'z': (64, Scalar(8, 'unsigned char', False))})
    "};

    let table = crate::ingest(dump, None).unwrap();
    assert_eq!(emit(&table), dump);
}

#[test]
fn test_emit_round_trips() {
    use indoc::indoc;

    let table = crate::ingest(
        indoc! {r"
            structs = {}
            structs['x'] = Struct(384, {'arr': (0, Array(320, 5, Array(64, 2, Scalar(32, 'int', True)))), 'f': (320, Pointer(64, Function()))})
            structs['e'] = Struct(0, {})
        "},
        None,
    )
    .unwrap();

    assert_eq!(crate::ingest(&emit(&table), None).unwrap(), table);
}

#[test]
fn test_emit_escapes_names() {
    assert_eq!(quote("it's"), r"'it\'s'");
    assert_eq!(quote("a\nb"), r"'a\nb'");
}
