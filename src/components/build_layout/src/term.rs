use crate::Location;
use derive_more::IsVariant;

/// One expression from a layout dump, before constructor names are given
/// meaning.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, IsVariant)]
pub enum TermKind {
    Integer(u64),
    Str(String),
    Bool(bool),
    Tuple(Vec<Term>),
    Dict(Vec<(String, Term)>),
    Call(String, Vec<Term>),
    Variable(String),
}

impl TermKind {
    pub fn at(self, location: Location) -> Term {
        Term {
            kind: self,
            location,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TermKind::Integer(_) => "an integer",
            TermKind::Str(_) => "a string",
            TermKind::Bool(_) => "a boolean",
            TermKind::Tuple(_) => "a tuple",
            TermKind::Dict(_) => "a table",
            TermKind::Call(_, _) => "a constructor call",
            TermKind::Variable(_) => "a variable",
        }
    }
}

/// One `name = value` or `name['key'] = value` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub key: Option<String>,
    pub value: Term,
    pub location: Location,
}
