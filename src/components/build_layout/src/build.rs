use crate::{Binding, IngestError, IngestErrorKind, MalformedDump, Term, TermKind};
use data_units::BitUnits;
use indexmap::IndexMap;
use layout::{Field, IntegerSign, Layout, LayoutTable, Type};

/// Evaluates parsed bindings into the dump's layout table.
///
/// Constructor names map to model builders; nothing in the dump is ever
/// executed. The result is whatever ends up bound to `structs`.
pub fn build(bindings: Vec<Binding>) -> Result<LayoutTable, IngestError> {
    let mut builder = Builder::default();

    for binding in bindings {
        builder.bind(binding)?;
    }

    builder.finish()
}

#[derive(Clone, Debug)]
enum Value {
    Type(Type),
    Layout(Layout),
    Table(LayoutTable),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Type(_) => "a type",
            Value::Layout(_) => "an aggregate layout",
            Value::Table(_) => "a table of layouts",
        }
    }
}

#[derive(Default)]
struct Builder {
    environment: IndexMap<String, Value>,
}

impl Builder {
    fn bind(&mut self, binding: Binding) -> Result<(), IngestError> {
        let value = self.evaluate(&binding.value)?;

        let Some(key) = binding.key else {
            if self
                .environment
                .insert(binding.name.clone(), value)
                .is_some()
            {
                return Err(MalformedDump::DuplicateBinding(binding.name).at(binding.location));
            }
            return Ok(());
        };

        let layout = match value {
            Value::Layout(layout) => layout,
            value => {
                return Err(MalformedDump::ExpectedTerm(
                    "Expected aggregate layout",
                    value.describe(),
                )
                .at(binding.value.location));
            }
        };

        match self.environment.get_mut(&binding.name) {
            Some(Value::Table(table)) => {
                if table.insert(key.clone(), layout).is_some() {
                    return Err(MalformedDump::DuplicateAggregate(key).at(binding.location));
                }
                Ok(())
            }
            Some(_) => Err(MalformedDump::NotATable(binding.name).at(binding.location)),
            None => Err(MalformedDump::UndefinedVariable(binding.name).at(binding.location)),
        }
    }

    fn finish(mut self) -> Result<LayoutTable, IngestError> {
        match self.environment.swap_remove("structs") {
            Some(Value::Table(table)) => Ok(table),
            Some(_) => Err(MalformedDump::NotATable("structs".into()).into()),
            None => Err(MalformedDump::MissingLayoutTable.into()),
        }
    }

    fn evaluate(&self, term: &Term) -> Result<Value, IngestError> {
        match &term.kind {
            TermKind::Call(name, arguments) => self.evaluate_call(name, arguments, term),
            TermKind::Variable(name) => self
                .environment
                .get(name)
                .cloned()
                .ok_or_else(|| MalformedDump::UndefinedVariable(name.clone()).at(term.location)),
            TermKind::Dict(entries) => self.evaluate_table(entries),
            kind => Err(
                MalformedDump::ExpectedTerm("Expected constructor call", kind.describe())
                    .at(term.location),
            ),
        }
    }

    fn evaluate_type(&self, term: &Term) -> Result<Type, IngestError> {
        match self.evaluate(term)? {
            Value::Type(ty) => Ok(ty),
            value => Err(
                MalformedDump::ExpectedTerm("Expected type", value.describe()).at(term.location)
            ),
        }
    }

    fn evaluate_table(&self, entries: &[(String, Term)]) -> Result<Value, IngestError> {
        let mut table = LayoutTable::new();

        for (name, value) in entries {
            let layout = match self.evaluate(value)? {
                Value::Layout(layout) => layout,
                other => {
                    return Err(MalformedDump::ExpectedTerm(
                        "Expected aggregate layout",
                        other.describe(),
                    )
                    .at(value.location));
                }
            };

            if table.insert(name.clone(), layout).is_some() {
                return Err(MalformedDump::DuplicateAggregate(name.clone()).at(value.location));
            }
        }

        Ok(Value::Table(table))
    }

    fn evaluate_call(
        &self,
        name: &str,
        arguments: &[Term],
        term: &Term,
    ) -> Result<Value, IngestError> {
        match name {
            "Void" => match arguments {
                [] => Ok(Value::Type(Type::Void)),
                _ => Err(arity("Void", "0", arguments, term)),
            },
            "Function" => match arguments {
                [] => Ok(Value::Type(Type::Function)),
                _ => Err(arity("Function", "0", arguments, term)),
            },
            "Bitfield" => {
                // Some emitters append the declared sign; the model keeps
                // only the width.
                let width = match arguments {
                    [width] => width,
                    [width, sign] => {
                        boolean(sign, "Expected bit-field sign flag")?;
                        width
                    }
                    _ => return Err(arity("Bitfield", "1 or 2", arguments, term)),
                };

                Ok(Value::Type(Type::Bitfield(bits(
                    width,
                    "Expected bit-field width",
                )?)))
            }
            "Scalar" => match arguments {
                [width, type_name, sign] => Ok(Value::Type(Type::scalar(
                    bits(width, "Expected scalar width")?,
                    string(type_name, "Expected scalar type name")?,
                    IntegerSign::new(boolean(sign, "Expected scalar sign flag")?),
                ))),
                _ => Err(arity("Scalar", "3", arguments, term)),
            },
            "StructField" => match arguments {
                [size, target] => Ok(Value::Type(Type::struct_field(
                    bits(size, "Expected aggregate size")?,
                    string(target, "Expected aggregate name")?,
                ))),
                _ => Err(arity("StructField", "2", arguments, term)),
            },
            "UnionField" => match arguments {
                [size, target] => Ok(Value::Type(Type::union_field(
                    bits(size, "Expected aggregate size")?,
                    string(target, "Expected aggregate name")?,
                ))),
                _ => Err(arity("UnionField", "2", arguments, term)),
            },
            "Pointer" => match arguments {
                [width, pointee] => Ok(Value::Type(Type::pointer(
                    bits(width, "Expected pointer width")?,
                    self.evaluate_type(pointee)?,
                ))),
                _ => Err(arity("Pointer", "2", arguments, term)),
            },
            "Array" => match arguments {
                [size, count, element] => {
                    let size = bits(size, "Expected array size")?;
                    let count = integer(count, "Expected element count")?;
                    let element = self.evaluate_type(element)?;

                    Type::array_with_size(size, count, element)
                        .map(Value::Type)
                        .map_err(|error| IngestErrorKind::InvalidShape(error).at(term.location))
                }
                _ => Err(arity("Array", "3", arguments, term)),
            },
            "Struct" => match arguments {
                [size, fields] => self.evaluate_layout(size, fields).map(Value::Layout),
                _ => Err(arity("Struct", "2", arguments, term)),
            },
            _ => Err(MalformedDump::UnknownConstructor(name.to_string()).at(term.location)),
        }
    }

    fn evaluate_layout(&self, size: &Term, fields: &Term) -> Result<Layout, IngestError> {
        let TermKind::Dict(entries) = &fields.kind else {
            return Err(
                MalformedDump::ExpectedTerm("Expected field table", fields.kind.describe())
                    .at(fields.location),
            );
        };

        let mut layout = Layout::new(bits(size, "Expected aggregate size")?);

        for (name, entry) in entries {
            let TermKind::Tuple(pair) = &entry.kind else {
                return Err(MalformedDump::ExpectedFieldPair.at(entry.location));
            };

            let [offset, ty] = pair.as_slice() else {
                return Err(MalformedDump::ExpectedFieldPair.at(entry.location));
            };

            let field = Field::new(
                bits(offset, "Expected field offset")?,
                self.evaluate_type(ty)?,
            );

            if layout.fields.insert(name.clone(), field).is_some() {
                return Err(MalformedDump::DuplicateField(name.clone()).at(entry.location));
            }
        }

        Ok(layout)
    }
}

fn arity(
    constructor: &'static str,
    expected: &'static str,
    arguments: &[Term],
    term: &Term,
) -> IngestError {
    MalformedDump::ArgumentCount {
        constructor,
        expected,
        got: arguments.len(),
    }
    .at(term.location)
}

fn integer(term: &Term, message: &'static str) -> Result<u64, IngestError> {
    match &term.kind {
        TermKind::Integer(value) => Ok(*value),
        kind => Err(MalformedDump::ExpectedTerm(message, kind.describe()).at(term.location)),
    }
}

fn bits(term: &Term, message: &'static str) -> Result<BitUnits, IngestError> {
    integer(term, message).map(BitUnits::of)
}

fn string(term: &Term, message: &'static str) -> Result<String, IngestError> {
    match &term.kind {
        TermKind::Str(value) => Ok(value.clone()),
        kind => Err(MalformedDump::ExpectedTerm(message, kind.describe()).at(term.location)),
    }
}

fn boolean(term: &Term, message: &'static str) -> Result<bool, IngestError> {
    match &term.kind {
        TermKind::Bool(value) => Ok(*value),
        kind => Err(MalformedDump::ExpectedTerm(message, kind.describe()).at(term.location)),
    }
}

#[cfg(test)]
fn build_dump(dump: &str) -> Result<LayoutTable, IngestError> {
    build(crate::parse(crate::lex(dump).unwrap()).unwrap())
}

#[test]
fn test_build_table() {
    use indoc::indoc;

    let table = build_dump(indoc! {r"
        structs = {}
        structs['x'] = Struct(64, {'y': (0, Scalar(32, 'int', True)), 'z': (32, Scalar(8, 'unsigned char', False))})
    "})
    .unwrap();

    assert_eq!(table.len(), 1);

    let x = table.get("x").unwrap();
    assert_eq!(x.size, BitUnits::of(64));
    assert_eq!(
        x.field("y").unwrap(),
        &Field::new(
            BitUnits::ZERO,
            Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed),
        ),
    );
    assert_eq!(
        x.field("z").unwrap(),
        &Field::new(
            BitUnits::of(32),
            Type::scalar(BitUnits::of(8), "unsigned char", IntegerSign::Unsigned),
        ),
    );
}

#[test]
fn test_build_follows_variables() {
    use indoc::indoc;

    let table = build_dump(indoc! {r"
        inner = Scalar(32, 'int', True)
        structs = {}
        structs['x'] = Struct(64, {'p': (0, Pointer(64, inner))})
    "})
    .unwrap();

    assert_eq!(
        table.get("x").unwrap().field("p").unwrap().ty,
        Type::pointer(
            BitUnits::of(64),
            Type::scalar(BitUnits::of(32), "int", IntegerSign::Signed),
        ),
    );
}

#[test]
fn test_build_accepts_table_literal() {
    let table =
        build_dump("structs = {'a': Struct(32, {'x': (0, Scalar(32, 'int', True))})}").unwrap();

    assert_eq!(table.len(), 1);
    assert!(table.contains("a"));
}

#[test]
fn test_build_bitfield_sign_flag_not_retained() {
    let with_flag = build_dump("structs = {'a': Struct(8, {'b': (0, Bitfield(3, True))})}")
        .unwrap();
    let without_flag = build_dump("structs = {'a': Struct(8, {'b': (0, Bitfield(3))})}").unwrap();

    assert_eq!(with_flag, without_flag);
    assert_eq!(
        with_flag.get("a").unwrap().field("b").unwrap().ty,
        Type::Bitfield(BitUnits::of(3)),
    );

    assert_eq!(
        build_dump("structs = {'a': Struct(8, {'b': (0, Bitfield(3, 5))})}")
            .unwrap_err()
            .kind,
        IngestErrorKind::MalformedDump(MalformedDump::ExpectedTerm(
            "Expected bit-field sign flag",
            "an integer",
        )),
    );
}

#[test]
fn test_build_rejects_wrong_arity() {
    assert_eq!(
        build_dump("structs = {'a': Struct(32, {'x': (0, Scalar(32))})}")
            .unwrap_err()
            .kind,
        IngestErrorKind::MalformedDump(MalformedDump::ArgumentCount {
            constructor: "Scalar",
            expected: "3",
            got: 1,
        }),
    );
}

#[test]
fn test_build_rejects_unknown_constructor() {
    assert_eq!(
        build_dump("structs = {'a': Blob()}").unwrap_err().kind,
        IngestErrorKind::MalformedDump(MalformedDump::UnknownConstructor("Blob".into())),
    );
}

#[test]
fn test_build_rejects_duplicate_field() {
    assert_eq!(
        build_dump("structs = {'a': Struct(64, {'x': (0, Void()), 'x': (32, Void())})}")
            .unwrap_err()
            .kind,
        IngestErrorKind::MalformedDump(MalformedDump::DuplicateField("x".into())),
    );
}

#[test]
fn test_build_rejects_duplicate_aggregate() {
    use indoc::indoc;

    assert_eq!(
        build_dump(indoc! {r"
            structs = {}
            structs['a'] = Struct(0, {})
            structs['a'] = Struct(0, {})
        "})
        .unwrap_err()
        .kind,
        IngestErrorKind::MalformedDump(MalformedDump::DuplicateAggregate("a".into())),
    );
}

#[test]
fn test_build_rejects_rebinding() {
    assert_eq!(
        build_dump("structs = {}\nstructs = {}").unwrap_err().kind,
        IngestErrorKind::MalformedDump(MalformedDump::DuplicateBinding("structs".into())),
    );
}

#[test]
fn test_build_requires_layout_table() {
    assert_eq!(
        build_dump("others = {}").unwrap_err().kind,
        IngestErrorKind::MalformedDump(MalformedDump::MissingLayoutTable),
    );

    assert_eq!(
        build_dump("structs = Void()").unwrap_err().kind,
        IngestErrorKind::MalformedDump(MalformedDump::NotATable("structs".into())),
    );
}

#[test]
fn test_build_rejects_subscript_into_missing_or_non_table() {
    assert_eq!(
        build_dump("structs['a'] = Struct(0, {})").unwrap_err().kind,
        IngestErrorKind::MalformedDump(MalformedDump::UndefinedVariable("structs".into())),
    );

    assert_eq!(
        build_dump("structs = Void()\nstructs['a'] = Struct(0, {})")
            .unwrap_err()
            .kind,
        IngestErrorKind::MalformedDump(MalformedDump::NotATable("structs".into())),
    );
}

#[test]
fn test_build_rejects_corrupt_array_size() {
    use layout::InvalidShape;

    assert_eq!(
        build_dump("structs = {'a': Struct(64, {'x': (0, Array(64, 5, Scalar(32, 'int', True)))})}")
            .unwrap_err()
            .kind,
        IngestErrorKind::InvalidShape(InvalidShape::ArraySizeMismatch {
            stated: BitUnits::of(64),
            count: 5,
            element: BitUnits::of(32),
        }),
    );
}
