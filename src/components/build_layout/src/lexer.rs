use crate::{DumpToken, DumpTokenKind, IngestError, Location, MalformedDump};
use std::iter::Peekable;
use std::str::Chars;

/// Splits a layout dump into tokens. The result always ends with an
/// `EndOfFile` token.
pub fn lex(dump: &str) -> Result<Vec<DumpToken>, IngestError> {
    Lexer::new(dump).lex()
}

struct Lexer<'a> {
    characters: Peekable<Chars<'a>>,
    location: Location,
}

impl<'a> Lexer<'a> {
    fn new(dump: &'a str) -> Self {
        Self {
            characters: dump.chars().peekable(),
            location: Location::START,
        }
    }

    fn next_char(&mut self) -> Option<(char, Location)> {
        let location = self.location;
        let c = self.characters.next()?;
        self.location.advance(c);
        Some((c, location))
    }

    fn lex(mut self) -> Result<Vec<DumpToken>, IngestError> {
        let mut tokens = Vec::new();

        while let Some((c, location)) = self.next_char() {
            let kind = match c {
                ' ' | '\t' | '\r' | '\n' => continue,
                '#' => {
                    while self.characters.peek().is_some_and(|c| *c != '\n') {
                        self.next_char();
                    }
                    continue;
                }
                '=' => DumpTokenKind::Assign,
                '(' => DumpTokenKind::OpenParen,
                ')' => DumpTokenKind::CloseParen,
                '[' => DumpTokenKind::OpenBracket,
                ']' => DumpTokenKind::CloseBracket,
                '{' => DumpTokenKind::OpenCurly,
                '}' => DumpTokenKind::CloseCurly,
                ',' => DumpTokenKind::Comma,
                ':' => DumpTokenKind::Colon,
                '\'' | '"' => self.lex_string(c, location)?,
                '0'..='9' => self.lex_integer(c, location)?,
                _ if c.is_alphabetic() || c == '_' => self.lex_word(c),
                _ => return Err(MalformedDump::UnexpectedCharacter(c).at(location)),
            };

            tokens.push(kind.at(location));
        }

        tokens.push(DumpTokenKind::EndOfFile.at(self.location));
        Ok(tokens)
    }

    fn lex_string(
        &mut self,
        closing_char: char,
        start: Location,
    ) -> Result<DumpTokenKind, IngestError> {
        let mut value = String::new();

        loop {
            let Some((c, c_location)) = self.next_char() else {
                return Err(MalformedDump::UnclosedString.at(start));
            };

            if c == closing_char {
                return Ok(DumpTokenKind::String(value));
            }

            if c == '\n' {
                return Err(MalformedDump::UnclosedString.at(start));
            }

            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some((escaped, _)) = self.next_char() else {
                return Err(MalformedDump::UnclosedString.at(start));
            };

            match escaped {
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                't' => value.push('\t'),
                '0' => value.push('\0'),
                '\\' | '"' | '\'' => value.push(escaped),
                _ => return Err(MalformedDump::UnrecognizedEscape(escaped).at(c_location)),
            }
        }
    }

    fn lex_integer(&mut self, first: char, start: Location) -> Result<DumpTokenKind, IngestError> {
        let mut digits = String::from(first);

        while let Some(c) = self.characters.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.next_char();
        }

        digits
            .parse()
            .map(DumpTokenKind::Integer)
            .map_err(|_| MalformedDump::UnrepresentableInteger.at(start))
    }

    fn lex_word(&mut self, first: char) -> DumpTokenKind {
        let mut word = String::from(first);

        while let Some(c) = self.characters.peek().copied() {
            if !c.is_alphabetic() && !c.is_ascii_digit() && c != '_' {
                break;
            }
            word.push(c);
            self.next_char();
        }

        match word.as_str() {
            "True" => DumpTokenKind::True,
            "False" => DumpTokenKind::False,
            _ => DumpTokenKind::Identifier(word),
        }
    }
}

#[cfg(test)]
fn kinds(dump: &str) -> Vec<DumpTokenKind> {
    lex(dump)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_lex_binding() {
    use DumpTokenKind::*;

    assert_eq!(
        kinds("structs['x'] = Struct(32, {'y': (0, Scalar(32, 'int', True))})"),
        vec![
            Identifier("structs".into()),
            OpenBracket,
            String("x".into()),
            CloseBracket,
            Assign,
            Identifier("Struct".into()),
            OpenParen,
            Integer(32),
            Comma,
            OpenCurly,
            String("y".into()),
            Colon,
            OpenParen,
            Integer(0),
            Comma,
            Identifier("Scalar".into()),
            OpenParen,
            Integer(32),
            Comma,
            String("int".into()),
            Comma,
            True,
            CloseParen,
            CloseParen,
            CloseCurly,
            CloseParen,
            EndOfFile,
        ],
    );
}

#[test]
fn test_lex_skips_comments_and_whitespace() {
    use DumpTokenKind::*;

    assert_eq!(
        kinds("# emitted by the analysis tool\nstructs = {}\n"),
        vec![Identifier("structs".into()), Assign, OpenCurly, CloseCurly, EndOfFile],
    );
}

#[test]
fn test_lex_tracks_locations() {
    let tokens = lex("structs = {}\nstructs['a'] = Void()").unwrap();

    assert_eq!(tokens[0].location, Location { line: 1, column: 1 });
    assert_eq!(tokens[1].location, Location { line: 1, column: 9 });
    assert_eq!(tokens[4].location, Location { line: 2, column: 1 });
    assert_eq!(tokens[5].location, Location { line: 2, column: 8 });
}

#[test]
fn test_lex_string_escapes() {
    assert_eq!(
        kinds(r"'it\'s \\ \n'")[0],
        DumpTokenKind::String("it's \\ \n".into()),
    );

    assert_eq!(
        lex(r"'\q'").unwrap_err(),
        MalformedDump::UnrecognizedEscape('q').at(Location { line: 1, column: 2 }),
    );
}

#[test]
fn test_lex_double_quoted_strings() {
    assert_eq!(
        kinds(r#""he said \"hi\"""#)[0],
        DumpTokenKind::String("he said \"hi\"".into()),
    );

    assert_eq!(
        kinds(r#""col\tumn\0""#)[0],
        DumpTokenKind::String("col\tumn\0".into()),
    );

    // A single quote needs no escape inside double quotes.
    assert_eq!(kinds(r#""it's""#)[0], DumpTokenKind::String("it's".into()));
}

#[test]
fn test_lex_unclosed_string() {
    assert_eq!(
        lex("structs['a").unwrap_err(),
        MalformedDump::UnclosedString.at(Location { line: 1, column: 9 }),
    );
}

#[test]
fn test_lex_rejects_unexpected_characters() {
    assert_eq!(
        lex("structs = {};").unwrap_err(),
        MalformedDump::UnexpectedCharacter(';').at(Location { line: 1, column: 13 }),
    );
}

#[test]
fn test_lex_rejects_unrepresentable_integers() {
    assert_eq!(
        lex("x = 99999999999999999999").unwrap_err(),
        MalformedDump::UnrepresentableInteger.at(Location { line: 1, column: 5 }),
    );
}
