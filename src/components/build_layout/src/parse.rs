use crate::{
    Binding, DumpToken, DumpTokenKind, IngestError, Location, MalformedDump, Term, TermKind,
};
use std::borrow::Borrow;

/// Parses a lexed dump into its sequence of bindings.
pub fn parse(tokens: Vec<DumpToken>) -> Result<Vec<Binding>, IngestError> {
    let mut input = Input::new(tokens);
    let mut bindings = Vec::new();

    while !input.peek().is_end_of_file() {
        bindings.push(parse_binding(&mut input)?);
    }

    Ok(bindings)
}

struct Input {
    tokens: Vec<DumpToken>,
    position: usize,
}

impl Input {
    fn new(tokens: Vec<DumpToken>) -> Self {
        assert!(tokens.last().is_some_and(|token| token.is_end_of_file()));

        Self {
            tokens,
            position: 0,
        }
    }

    fn eof(&self) -> &DumpToken {
        self.tokens.last().unwrap()
    }

    fn here(&self) -> Location {
        self.peek().location
    }

    fn peek(&self) -> &DumpToken {
        self.tokens.get(self.position).unwrap_or_else(|| self.eof())
    }

    fn peek_is(&self, kind: impl Borrow<DumpTokenKind>) -> bool {
        self.peek().kind == *kind.borrow()
    }

    fn advance(&mut self) -> DumpToken {
        let token = self.peek().clone();

        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }

        token
    }

    fn eat(&mut self, kind: impl Borrow<DumpTokenKind>) -> bool {
        if self.peek_is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

fn parse_binding(input: &mut Input) -> Result<Binding, IngestError> {
    let location = input.here();
    let name = eat_identifier(input, "Expected binding name")?;

    let key = if input.eat(DumpTokenKind::OpenBracket) {
        let key = eat_string(input, "Expected string key")?;
        expect(input, DumpTokenKind::CloseBracket, "Expected ']'")?;
        Some(key)
    } else {
        None
    };

    expect(input, DumpTokenKind::Assign, "Expected '='")?;
    let value = parse_term(input)?;

    Ok(Binding {
        name,
        key,
        value,
        location,
    })
}

fn parse_term(input: &mut Input) -> Result<Term, IngestError> {
    let location = input.here();

    match input.advance().kind {
        DumpTokenKind::Integer(value) => Ok(TermKind::Integer(value).at(location)),
        DumpTokenKind::String(value) => Ok(TermKind::Str(value).at(location)),
        DumpTokenKind::True => Ok(TermKind::Bool(true).at(location)),
        DumpTokenKind::False => Ok(TermKind::Bool(false).at(location)),
        DumpTokenKind::OpenParen => parse_tuple(input, location),
        DumpTokenKind::OpenCurly => parse_dict(input, location),
        DumpTokenKind::Identifier(name) => {
            if input.eat(DumpTokenKind::OpenParen) {
                let arguments = parse_arguments(input)?;
                Ok(TermKind::Call(name, arguments).at(location))
            } else {
                Ok(TermKind::Variable(name).at(location))
            }
        }
        got => Err(MalformedDump::Expected("Expected value", got).at(location)),
    }
}

fn parse_tuple(input: &mut Input, location: Location) -> Result<Term, IngestError> {
    let mut items = vec![parse_term(input)?];

    while input.eat(DumpTokenKind::Comma) {
        if input.peek_is(DumpTokenKind::CloseParen) {
            break;
        }
        items.push(parse_term(input)?);
    }

    expect(input, DumpTokenKind::CloseParen, "Expected ')'")?;
    Ok(TermKind::Tuple(items).at(location))
}

fn parse_dict(input: &mut Input, location: Location) -> Result<Term, IngestError> {
    let mut entries = Vec::new();

    if input.eat(DumpTokenKind::CloseCurly) {
        return Ok(TermKind::Dict(entries).at(location));
    }

    loop {
        let key = eat_string(input, "Expected string key")?;
        expect(input, DumpTokenKind::Colon, "Expected ':'")?;
        entries.push((key, parse_term(input)?));

        if !input.eat(DumpTokenKind::Comma) {
            break;
        }

        if input.peek_is(DumpTokenKind::CloseCurly) {
            break;
        }
    }

    expect(input, DumpTokenKind::CloseCurly, "Expected '}'")?;
    Ok(TermKind::Dict(entries).at(location))
}

fn parse_arguments(input: &mut Input) -> Result<Vec<Term>, IngestError> {
    let mut arguments = Vec::new();

    if input.eat(DumpTokenKind::CloseParen) {
        return Ok(arguments);
    }

    arguments.push(parse_term(input)?);

    while input.eat(DumpTokenKind::Comma) {
        if input.peek_is(DumpTokenKind::CloseParen) {
            break;
        }
        arguments.push(parse_term(input)?);
    }

    expect(input, DumpTokenKind::CloseParen, "Expected ')'")?;
    Ok(arguments)
}

fn eat_identifier(input: &mut Input, message: &'static str) -> Result<String, IngestError> {
    let location = input.here();

    match input.advance().kind {
        DumpTokenKind::Identifier(name) => Ok(name),
        got => Err(MalformedDump::Expected(message, got).at(location)),
    }
}

fn eat_string(input: &mut Input, message: &'static str) -> Result<String, IngestError> {
    let location = input.here();

    match input.advance().kind {
        DumpTokenKind::String(value) => Ok(value),
        got => Err(MalformedDump::Expected(message, got).at(location)),
    }
}

fn expect(
    input: &mut Input,
    kind: DumpTokenKind,
    message: &'static str,
) -> Result<(), IngestError> {
    if input.eat(&kind) {
        Ok(())
    } else {
        Err(MalformedDump::Expected(message, input.peek().kind.clone()).at(input.here()))
    }
}

#[cfg(test)]
use crate::lex;

#[test]
fn test_parse_bindings() {
    let bindings = parse(lex("structs = {}\nstructs['a'] = Void()").unwrap()).unwrap();

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].name, "structs");
    assert_eq!(bindings[0].key, None);
    assert!(matches!(&bindings[0].value.kind, TermKind::Dict(entries) if entries.is_empty()));

    assert_eq!(bindings[1].name, "structs");
    assert_eq!(bindings[1].key.as_deref(), Some("a"));
    assert!(matches!(
        &bindings[1].value.kind,
        TermKind::Call(name, arguments) if name == "Void" && arguments.is_empty()
    ));
}

#[test]
fn test_parse_call_and_variable() {
    let bindings = parse(lex("x = Pointer(64, inner)").unwrap()).unwrap();

    let TermKind::Call(name, arguments) = &bindings[0].value.kind else {
        panic!("expected call");
    };

    assert_eq!(name, "Pointer");
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[0].kind, TermKind::Integer(64));
    assert_eq!(arguments[1].kind, TermKind::Variable("inner".into()));
}

#[test]
fn test_parse_tuples_and_dicts_allow_trailing_commas() {
    let bindings = parse(lex("x = {'a': (0, Void(),), 'b': (8, True,),}").unwrap()).unwrap();

    let TermKind::Dict(entries) = &bindings[0].value.kind else {
        panic!("expected dict");
    };

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "a");
    assert!(entries[0].1.kind.is_tuple());
    assert_eq!(entries[1].0, "b");
    assert!(entries[1].1.kind.is_tuple());
}

#[test]
fn test_parse_reports_missing_assign() {
    assert_eq!(
        parse(lex("structs 5").unwrap()).unwrap_err(),
        MalformedDump::Expected("Expected '='", DumpTokenKind::Integer(5))
            .at(Location { line: 1, column: 9 }),
    );
}

#[test]
fn test_parse_reports_bad_subscript_key() {
    assert_eq!(
        parse(lex("structs[5] = Void()").unwrap()).unwrap_err(),
        MalformedDump::Expected("Expected string key", DumpTokenKind::Integer(5))
            .at(Location { line: 1, column: 9 }),
    );
}

#[test]
fn test_parse_reports_missing_dict_colon() {
    assert_eq!(
        parse(lex("x = {'a' 1}").unwrap()).unwrap_err(),
        MalformedDump::Expected("Expected ':'", DumpTokenKind::Integer(1))
            .at(Location { line: 1, column: 10 }),
    );
}

#[test]
fn test_parse_reports_truncated_dump() {
    assert_eq!(
        parse(lex("x =").unwrap()).unwrap_err(),
        MalformedDump::Expected("Expected value", DumpTokenKind::EndOfFile)
            .at(Location { line: 1, column: 4 }),
    );
}

#[test]
fn test_parse_rejects_empty_tuple() {
    assert_eq!(
        parse(lex("x = ()").unwrap()).unwrap_err(),
        MalformedDump::Expected("Expected value", DumpTokenKind::CloseParen)
            .at(Location { line: 1, column: 6 }),
    );
}
