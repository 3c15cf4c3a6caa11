use layout::{LayoutTable, Type, UnknownReference};
use std::collections::HashSet;

/// Restricts `table` to `target` and every aggregate transitively reachable
/// from it through field references, pointers, and arrays. References to
/// aggregates the dump never defined are left dangling, as usual.
pub fn select(table: &mut LayoutTable, target: &str) -> Result<(), UnknownReference> {
    if !table.contains(target) {
        return Err(UnknownReference {
            name: target.to_string(),
        });
    }

    let mut keep = HashSet::new();
    let mut pending = vec![target.to_string()];

    while let Some(name) = pending.pop() {
        let Some(layout) = table.get(&name) else {
            continue;
        };

        if !keep.insert(name) {
            continue;
        }

        for field in layout.fields.values() {
            collect_references(&field.ty, &mut pending);
        }
    }

    table.retain(|name, _| keep.contains(name));
    Ok(())
}

fn collect_references(ty: &Type, pending: &mut Vec<String>) {
    match ty {
        Type::StructField(reference) | Type::UnionField(reference) => {
            pending.push(reference.name.clone());
        }
        Type::Pointer(pointer) => collect_references(&pointer.pointee, pending),
        Type::Array(array) => collect_references(&array.element, pending),
        Type::Void | Type::Bitfield(_) | Type::Scalar(_) | Type::Function => {}
    }
}

#[cfg(test)]
fn table_of(dump: &str) -> LayoutTable {
    crate::build(crate::parse(crate::lex(dump).unwrap()).unwrap()).unwrap()
}

#[test]
fn test_select_keeps_only_reachable_aggregates() {
    use indoc::indoc;

    // struct a { int x; }; struct b { int y; };
    let mut table = table_of(indoc! {r"
        structs = {}
        structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
        structs['b'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})
    "});

    select(&mut table, "b").unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn test_select_follows_pointers_and_arrays() {
    use indoc::indoc;

    // struct a { int x; }; struct b { struct a (*grid)[2]; }; struct c { int z; };
    let mut table = table_of(indoc! {r"
        structs = {}
        structs['a'] = Struct(32, {'x': (0, Scalar(32, 'int', True))})
        structs['b'] = Struct(64, {'grid': (0, Pointer(64, Array(64, 2, StructField(32, 'a'))))})
        structs['c'] = Struct(32, {'z': (0, Scalar(32, 'int', True))})
    "});

    select(&mut table, "b").unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_select_terminates_on_cycles() {
    use indoc::indoc;

    // struct a { struct b *b; }; struct b { struct a *a; };
    let mut table = table_of(indoc! {r"
        structs = {}
        structs['a'] = Struct(64, {'b': (0, Pointer(64, StructField(64, 'b')))})
        structs['b'] = Struct(64, {'a': (0, Pointer(64, StructField(64, 'a')))})
    "});

    select(&mut table, "a").unwrap();

    assert_eq!(table.len(), 2);
}

#[test]
fn test_select_skips_dangling_references() {
    let mut table =
        table_of("structs = {'a': Struct(64, {'m': (0, StructField(64, 'missing'))})}");

    select(&mut table, "a").unwrap();

    assert_eq!(table.names().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn test_select_unknown_target() {
    let mut table = table_of("structs = {'a': Struct(0, {})}");

    assert_eq!(
        select(&mut table, "zzz"),
        Err(UnknownReference { name: "zzz".into() }),
    );
}
