use crate::Location;
use derive_more::{Deref, IsVariant};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, IsVariant)]
pub enum DumpTokenKind {
    EndOfFile,
    Identifier(String),
    Integer(u64),
    String(String),
    True,
    False,
    Assign,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    Comma,
    Colon,
}

impl DumpTokenKind {
    pub fn at(self, location: Location) -> DumpToken {
        DumpToken {
            kind: self,
            location,
        }
    }
}

impl Display for DumpTokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpTokenKind::EndOfFile => write!(f, "<end-of-file>"),
            DumpTokenKind::Identifier(identifier) => write!(f, "identifier '{}'", identifier),
            DumpTokenKind::Integer(_) => write!(f, "integer literal"),
            DumpTokenKind::String(_) => write!(f, "string literal"),
            DumpTokenKind::True => write!(f, "'True'"),
            DumpTokenKind::False => write!(f, "'False'"),
            DumpTokenKind::Assign => write!(f, "'='"),
            DumpTokenKind::OpenParen => write!(f, "'('"),
            DumpTokenKind::CloseParen => write!(f, "')'"),
            DumpTokenKind::OpenBracket => write!(f, "'['"),
            DumpTokenKind::CloseBracket => write!(f, "']'"),
            DumpTokenKind::OpenCurly => write!(f, "'{{'"),
            DumpTokenKind::CloseCurly => write!(f, "'}}'"),
            DumpTokenKind::Comma => write!(f, "','"),
            DumpTokenKind::Colon => write!(f, "':'"),
        }
    }
}

#[derive(Clone, Debug, Deref)]
pub struct DumpToken {
    #[deref]
    pub kind: DumpTokenKind,

    pub location: Location,
}
