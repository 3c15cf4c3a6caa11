use crate::{AggregateRef, Layout, UnknownReference};
use indexmap::IndexMap;

/// Every aggregate layout produced by one ingestion, keyed by the aggregate
/// name (struct/union tag, or typedef name for tagless aggregates). The
/// table owns all layouts; `StructField` / `UnionField` values point back
/// into it by name and resolve lazily.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutTable {
    layouts: IndexMap<String, Layout>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    /// Inserts under `name`, returning the layout previously stored there
    /// if any.
    pub fn insert(&mut self, name: impl Into<String>, layout: Layout) -> Option<Layout> {
        self.layouts.insert(name.into(), layout)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Layout)> {
        self.layouts.iter().map(|(name, layout)| (name.as_str(), layout))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Layout) -> bool) {
        self.layouts.retain(|name, layout| keep(name, layout));
    }

    /// Follows a by-name aggregate reference. Dangling names only surface
    /// here, at lookup time, never during construction.
    pub fn resolve(&self, reference: &AggregateRef) -> Result<&Layout, UnknownReference> {
        self.get(&reference.name).ok_or_else(|| UnknownReference {
            name: reference.name.clone(),
        })
    }
}

impl FromIterator<(String, Layout)> for LayoutTable {
    fn from_iter<I: IntoIterator<Item = (String, Layout)>>(iter: I) -> Self {
        Self {
            layouts: IndexMap::from_iter(iter),
        }
    }
}

#[cfg(test)]
use crate::{Field, Type};
#[cfg(test)]
use data_units::BitUnits;

#[cfg(test)]
fn linked_list_table() -> LayoutTable {
    // struct node { struct node *next; }, by way of a 64-bit pointer.
    let mut node = Layout::new(BitUnits::of(64));
    node.fields.insert(
        "next".into(),
        Field::new(
            BitUnits::ZERO,
            Type::pointer(BitUnits::of(64), Type::struct_field(BitUnits::of(64), "node")),
        ),
    );

    let mut table = LayoutTable::new();
    assert!(table.insert("node", node).is_none());
    table
}

#[test]
fn test_resolve_follows_names() {
    let table = linked_list_table();

    let reference = AggregateRef {
        name: "node".into(),
        size: BitUnits::of(64),
    };

    let layout = table.resolve(&reference).unwrap();
    assert_eq!(layout.size, BitUnits::of(64));
    assert!(table.contains("node"));
    assert_eq!(table.names().collect::<Vec<_>>(), vec!["node"]);
}

#[test]
fn test_resolve_dangling_reference() {
    let table = linked_list_table();

    let reference = AggregateRef {
        name: "list".into(),
        size: BitUnits::of(64),
    };

    assert_eq!(
        table.resolve(&reference),
        Err(UnknownReference { name: "list".into() }),
    );
}

#[test]
fn test_insert_reports_previous_entry() {
    let mut table = linked_list_table();
    assert!(table.insert("node", Layout::new(BitUnits::ZERO)).is_some());
    assert_eq!(table.len(), 1);
}

#[test]
fn test_mutually_recursive_references_stay_finite() {
    // struct a { struct b *b; }; struct b { struct a a[2]; };
    let mut a = Layout::new(BitUnits::of(64));
    a.fields.insert(
        "b".into(),
        Field::new(
            BitUnits::ZERO,
            Type::pointer(BitUnits::of(64), Type::struct_field(BitUnits::of(128), "b")),
        ),
    );

    let mut b = Layout::new(BitUnits::of(128));
    b.fields.insert(
        "a".into(),
        Field::new(
            BitUnits::ZERO,
            Type::array(2, Type::struct_field(BitUnits::of(64), "a")).unwrap(),
        ),
    );

    let mut table = LayoutTable::new();
    table.insert("a", a.clone());
    table.insert("b", b.clone());

    let reversed = LayoutTable::from_iter([("b".to_string(), b), ("a".to_string(), a)]);

    assert_eq!(table, reversed);
    assert_eq!(
        table.resolve(&AggregateRef { name: "a".into(), size: BitUnits::of(64) }),
        reversed.resolve(&AggregateRef { name: "a".into(), size: BitUnits::of(64) }),
    );
}
