use crate::{DumpTokenKind, Location};
use layout::{InvalidShape, UnknownReference};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
pub struct IngestError {
    pub kind: IngestErrorKind,
    pub location: Option<Location>,
}

impl Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.location {
            Some(location) => write!(f, "<dump>:{}: error: {}", location, self.kind),
            None => write!(f, "error: {}", self.kind),
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Clone, Debug, PartialEq)]
pub enum IngestErrorKind {
    InvalidShape(InvalidShape),
    MalformedDump(MalformedDump),
    UnknownReference(UnknownReference),
    ToolInvocationFailed { output: String },
}

impl IngestErrorKind {
    pub fn at(self, location: Location) -> IngestError {
        IngestError {
            kind: self,
            location: Some(location),
        }
    }
}

impl From<IngestErrorKind> for IngestError {
    fn from(kind: IngestErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }
}

impl Display for IngestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestErrorKind::InvalidShape(error) => error.fmt(f),
            IngestErrorKind::MalformedDump(error) => error.fmt(f),
            IngestErrorKind::UnknownReference(error) => error.fmt(f),
            IngestErrorKind::ToolInvocationFailed { output } => {
                write!(f, "Layout tool failed: {}", output)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MalformedDump {
    UnexpectedCharacter(char),
    UnclosedString,
    UnrecognizedEscape(char),
    UnrepresentableInteger,
    Expected(&'static str, DumpTokenKind),
    UnknownConstructor(String),
    ArgumentCount {
        constructor: &'static str,
        expected: &'static str,
        got: usize,
    },
    ExpectedTerm(&'static str, &'static str),
    ExpectedFieldPair,
    UndefinedVariable(String),
    DuplicateBinding(String),
    DuplicateField(String),
    DuplicateAggregate(String),
    NotATable(String),
    MissingLayoutTable,
}

impl MalformedDump {
    pub fn at(self, location: Location) -> IngestError {
        IngestErrorKind::MalformedDump(self).at(location)
    }
}

impl From<MalformedDump> for IngestError {
    fn from(kind: MalformedDump) -> Self {
        IngestErrorKind::MalformedDump(kind).into()
    }
}

impl Display for MalformedDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedDump::UnexpectedCharacter(c) => write!(f, "Unexpected character '{}'", c),
            MalformedDump::UnclosedString => f.write_str("Unclosed string literal"),
            MalformedDump::UnrecognizedEscape(c) => {
                write!(f, "Unrecognized escape sequence '\\{}'", c)
            }
            MalformedDump::UnrepresentableInteger => {
                f.write_str("Unrepresentable integer literal")
            }
            MalformedDump::Expected(message, got) => write!(f, "{}, got {}", message, got),
            MalformedDump::UnknownConstructor(name) => {
                write!(f, "Unknown constructor '{}'", name)
            }
            MalformedDump::ArgumentCount {
                constructor,
                expected,
                got,
            } => write!(
                f,
                "Constructor '{}' takes {} arguments, got {}",
                constructor, expected, got,
            ),
            MalformedDump::ExpectedTerm(message, got) => write!(f, "{}, got {}", message, got),
            MalformedDump::ExpectedFieldPair => {
                f.write_str("Expected field entry to be an offset and type pair")
            }
            MalformedDump::UndefinedVariable(name) => write!(f, "Undefined variable '{}'", name),
            MalformedDump::DuplicateBinding(name) => write!(f, "Duplicate binding '{}'", name),
            MalformedDump::DuplicateField(name) => write!(f, "Duplicate field '{}'", name),
            MalformedDump::DuplicateAggregate(name) => {
                write!(f, "Duplicate aggregate '{}'", name)
            }
            MalformedDump::NotATable(name) => {
                write!(f, "Binding '{}' is not a table of layouts", name)
            }
            MalformedDump::MissingLayoutTable => f.write_str("Dump has no 'structs' table"),
        }
    }
}

#[test]
fn test_error_rendering() {
    let error =
        MalformedDump::UnknownConstructor("Blob".into()).at(Location { line: 2, column: 14 });
    assert_eq!(
        error.to_string(),
        "<dump>:2:14: error: Unknown constructor 'Blob'",
    );

    let error = IngestError::from(IngestErrorKind::ToolInvocationFailed {
        output: "exit status 1".into(),
    });
    assert_eq!(error.to_string(), "error: Layout tool failed: exit status 1");

    assert_eq!(
        MalformedDump::Expected("Expected '='", DumpTokenKind::Integer(5)).to_string(),
        "Expected '=', got integer literal",
    );
}
