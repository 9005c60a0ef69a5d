use std::fmt;

use crate::error::ConvertError;

/// Comment marker: everything from here to the end of the line is skipped.
pub const COMMENT_MARKER: char = '\'';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Integer literal: `[1-9][0-9]*`
    Int(i64),
    /// Identifier: `[letter_][letter digit _]*`, no reserved words
    Ident(String),
    ArrayOpen,  // <<
    ArrayClose, // >>
    TableOpen,  // {
    TableClose, // }
    Arrow,      // ->
    Dot,
    Semicolon,
    Comma,
    Assign,     // :=
    ConstOpen,  // ?(
    ConstClose, // )
    Eof,
}

/// Payload-free token classification, used in syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Integer,
    Identifier,
    ArrayOpen,
    ArrayClose,
    TableOpen,
    TableClose,
    Arrow,
    Dot,
    Semicolon,
    Comma,
    Assign,
    ConstOpen,
    ConstClose,
    Eof,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Int(_) => TokenKind::Integer,
            Token::Ident(_) => TokenKind::Identifier,
            Token::ArrayOpen => TokenKind::ArrayOpen,
            Token::ArrayClose => TokenKind::ArrayClose,
            Token::TableOpen => TokenKind::TableOpen,
            Token::TableClose => TokenKind::TableClose,
            Token::Arrow => TokenKind::Arrow,
            Token::Dot => TokenKind::Dot,
            Token::Semicolon => TokenKind::Semicolon,
            Token::Comma => TokenKind::Comma,
            Token::Assign => TokenKind::Assign,
            Token::ConstOpen => TokenKind::ConstOpen,
            Token::ConstClose => TokenKind::ConstClose,
            Token::Eof => TokenKind::Eof,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Integer => "integer",
            TokenKind::Identifier => "identifier",
            TokenKind::ArrayOpen => "'<<'",
            TokenKind::ArrayClose => "'>>'",
            TokenKind::TableOpen => "'{'",
            TokenKind::TableClose => "'}'",
            TokenKind::Arrow => "'->'",
            TokenKind::Dot => "'.'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Assign => "':='",
            TokenKind::ConstOpen => "'?('",
            TokenKind::ConstClose => "')'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A token with its literal text and 1-based position (column in chars).
#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl Spanned {
    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }
}

/// Second character required after the first one of a two-character operator.
fn operator_pair(first: char) -> Option<(char, Token)> {
    match first {
        '?' => Some(('(', Token::ConstOpen)),
        '<' => Some(('<', Token::ArrayOpen)),
        '>' => Some(('>', Token::ArrayClose)),
        ':' => Some(('=', Token::Assign)),
        '-' => Some(('>', Token::Arrow)),
        _ => None,
    }
}

fn single_char(c: char) -> Option<Token> {
    match c {
        '{' => Some(Token::TableOpen),
        '}' => Some(Token::TableClose),
        '.' => Some(Token::Dot),
        ';' => Some(Token::Semicolon),
        ',' => Some(Token::Comma),
        ')' => Some(Token::ConstClose),
        _ => None,
    }
}

/// Line terminators: `\n`, `\r\n`, a lone `\r`, U+2028 and U+2029.
/// For `\r\n` only the `\n` ends the line.
fn is_line_break(chars: &[char], pos: usize) -> bool {
    match chars[pos] {
        '\n' | '\u{2028}' | '\u{2029}' => true,
        '\r' => chars.get(pos + 1) != Some(&'\n'),
        _ => false,
    }
}

/// Scan `src` into tokens, terminated by a single `Eof` token.
/// Stops at the first character that cannot start a token.
///
/// Positions are 1-based; columns count chars and restart after `\n`,
/// `\r\n`, a lone `\r`, U+2028 or U+2029.
pub fn lex(src: &str) -> Result<Vec<Spanned>, ConvertError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut line_start = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        // Comment: the newline itself is left for the whitespace branch
        if c == COMMENT_MARKER {
            while pos < chars.len() && !is_line_break(&chars, pos) {
                pos += 1;
            }
            continue;
        }

        if c.is_whitespace() {
            if is_line_break(&chars, pos) {
                line += 1;
                line_start = pos + 1;
            }
            pos += 1;
            continue;
        }

        let column = (pos - line_start) as u32 + 1;

        // Integer: a leading zero never starts a literal
        if matches!(c, '1'..='9') {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let n: i64 = text.parse().map_err(|_| {
                ConvertError::lex(
                    line,
                    column,
                    format!("integer literal '{}' out of range", text),
                )
            })?;
            tokens.push(Spanned {
                token: Token::Int(n),
                text,
                line,
                column,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Ident(word.clone()),
                text: word,
                line,
                column,
            });
            continue;
        }

        if let Some((second, token)) = operator_pair(c) {
            if chars.get(pos + 1) == Some(&second) {
                tokens.push(Spanned {
                    token,
                    text: [c, second].iter().collect(),
                    line,
                    column,
                });
                pos += 2;
                continue;
            }
            // No partial-operator fallback: a lone prefix is an unknown symbol
            return Err(ConvertError::lex(
                line,
                column,
                format!("unexpected character '{}'", c),
            ));
        }

        if let Some(token) = single_char(c) {
            tokens.push(Spanned {
                token,
                text: c.to_string(),
                line,
                column,
            });
            pos += 1;
            continue;
        }

        return Err(ConvertError::lex(
            line,
            column,
            format!("unexpected character '{}'", c),
        ));
    }

    tokens.push(Spanned {
        token: Token::Eof,
        text: String::new(),
        line,
        column: (pos - line_start) as u32 + 1,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().iter().map(Spanned::kind).collect()
    }

    #[test]
    fn scans_every_operator() {
        assert_eq!(
            kinds("<< >> { } -> . ; , := ?( )"),
            vec![
                TokenKind::ArrayOpen,
                TokenKind::ArrayClose,
                TokenKind::TableOpen,
                TokenKind::TableClose,
                TokenKind::Arrow,
                TokenKind::Dot,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Assign,
                TokenKind::ConstOpen,
                TokenKind::ConstClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_and_identifier_payloads() {
        let tokens = lex("port_2 8080").unwrap();
        assert_eq!(tokens[0].token, Token::Ident("port_2".to_owned()));
        assert_eq!(tokens[1].token, Token::Int(8080));
        assert_eq!(tokens[1].text, "8080");
    }

    #[test]
    fn comments_produce_no_tokens() {
        let src = "' whole line comment\n123 ' trailing\n' last line without newline";
        let tokens = lex(src).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token, Token::Int(123));
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].token, Token::Eof);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = lex("a := 1;\n  { b -> 2 }").unwrap();
        let brace = &tokens[4];
        assert_eq!(brace.token, Token::TableOpen);
        assert_eq!((brace.line, brace.column), (2, 3));
        let two = &tokens[7];
        assert_eq!(two.token, Token::Int(2));
        assert_eq!((two.line, two.column), (2, 10));
    }

    #[test]
    fn unicode_identifiers_are_accepted() {
        let tokens = lex("порт_1").unwrap();
        assert_eq!(tokens[0].token, Token::Ident("порт_1".to_owned()));
    }

    #[test]
    fn leading_zero_is_unexpected_character() {
        let err = lex("{ a -> 0 }").unwrap_err();
        assert_eq!(
            err,
            ConvertError::lex(1, 8, "unexpected character '0'")
        );
    }

    #[test]
    fn operator_prefix_without_second_char_is_fatal() {
        for (src, ch) in [("?x", '?'), ("< 1", '<'), ("1 >", '>'), ("a : 1", ':'), ("-1", '-')] {
            match lex(src) {
                Err(ConvertError::Lex { message, .. }) => {
                    assert_eq!(message, format!("unexpected character '{}'", ch), "{}", src)
                }
                other => panic!("expected lex error for {:?}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn string_literal_is_rejected() {
        let err = lex("{ host -> \"localhost\" }").unwrap_err();
        assert_eq!(err, ConvertError::lex(1, 11, "unexpected character '\"'"));
    }

    #[test]
    fn overflowing_integer_is_lex_error() {
        let err = lex("99999999999999999999").unwrap_err();
        assert_eq!(
            err,
            ConvertError::lex(1, 1, "integer literal '99999999999999999999' out of range")
        );
    }

    #[test]
    fn every_line_terminator_starts_a_new_line() {
        for src in ["1\n2", "1\r\n2", "1\r2", "1\u{2028}2", "1\u{2029}2", "1 ' note\r2"] {
            let tokens = lex(src).unwrap();
            assert_eq!((tokens[1].line, tokens[1].column), (2, 1), "{:?}", src);
        }
    }

    #[test]
    fn lone_carriage_return_keeps_error_columns_accurate() {
        let err = lex("{ a -> 1 }\r  $").unwrap_err();
        assert_eq!(err, ConvertError::lex(2, 3, "unexpected character '$'"));
    }

    #[test]
    fn eof_carries_final_position() {
        let tokens = lex("1\n").unwrap();
        let eof = tokens.last().unwrap();
        assert_eq!((eof.line, eof.column), (2, 1));
    }
}
