//! Recursive-descent parser. LL(1) everywhere except the top level, where an
//! identifier followed by `:=` starts a constant declaration.
//!
//! ```text
//! Program   := (ConstDecl | Value)*
//! ConstDecl := IDENTIFIER ':=' Value ';'
//! Value     := INTEGER | ConstRef | Array | Table
//! ConstRef  := '?(' IDENTIFIER ')'
//! Array     := '<<' (Value (',' Value)*)? '>>'
//! Table     := '{' (Entry ('.' Entry)*)? '}'
//! Entry     := IDENTIFIER '->' Value
//! ```

use std::borrow::Cow;

use crate::ast::{Node, TableEntry};
use crate::error::{ConvertError, Expected};
use crate::lexer::{Spanned, Token, TokenKind};

/// Deepest allowed nesting of arrays and tables. The parser, the resolver
/// and the serializer all recurse once per level.
pub const MAX_NESTING_DEPTH: usize = 256;

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    /// Containers currently open.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn cur(&self) -> &'a Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &'a Token {
        &self.cur().token
    }

    /// Token after the current one; `Eof` once past the end.
    fn peek_next(&self) -> &'a Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> &'a Spanned {
        let t = self.cur();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, expected: Expected) -> ConvertError {
        let cur = self.cur();
        ConvertError::Syntax {
            expected,
            found: cur.kind(),
            line: cur.line,
            column: cur.column,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Spanned, ConvertError> {
        if self.cur().kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.err(Expected::Token(kind)))
        }
    }

    /// Open a container at the current token, or fail if that would exceed
    /// [`MAX_NESTING_DEPTH`].
    fn open(&mut self, kind: TokenKind) -> Result<(), ConvertError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(self.err(Expected::NestingAtMost(MAX_NESTING_DEPTH)));
        }
        self.expect(kind)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, kind: TokenKind) -> Result<(), ConvertError> {
        self.expect(kind)?;
        self.depth -= 1;
        Ok(())
    }

    fn take_ident(&mut self) -> Result<String, ConvertError> {
        if let Token::Ident(name) = self.peek() {
            self.advance();
            Ok(name.clone())
        } else {
            Err(self.err(Expected::Token(TokenKind::Identifier)))
        }
    }

    // -- Program ---------------------------------------------------

    fn parse_program(&mut self) -> Result<Vec<Node>, ConvertError> {
        let mut nodes = Vec::new();
        while self.peek() != &Token::Eof {
            let node = if matches!(self.peek(), Token::Ident(_)) && self.peek_next() == &Token::Assign
            {
                self.parse_const_declaration()?
            } else {
                self.parse_value()?
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    fn parse_const_declaration(&mut self) -> Result<Node, ConvertError> {
        let name = self.take_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_value()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Node::ConstDeclaration {
            name,
            value: Box::new(value),
        })
    }

    // -- Values ----------------------------------------------------

    fn parse_value(&mut self) -> Result<Node, ConvertError> {
        match self.peek() {
            Token::Int(n) => {
                let n = *n;
                self.advance();
                Ok(Node::Integer(n))
            }
            Token::ConstOpen => self.parse_const_reference(),
            Token::ArrayOpen => self.parse_array(),
            Token::TableOpen => self.parse_table(),
            _ => Err(self.err(Expected::Value)),
        }
    }

    fn parse_const_reference(&mut self) -> Result<Node, ConvertError> {
        self.expect(TokenKind::ConstOpen)?;
        let name = self.take_ident()?;
        self.expect(TokenKind::ConstClose)?;
        Ok(Node::ConstReference(name))
    }

    fn parse_array(&mut self) -> Result<Node, ConvertError> {
        self.open(TokenKind::ArrayOpen)?;
        let mut elements = Vec::new();
        if self.peek() != &Token::ArrayClose {
            elements.push(self.parse_value()?);
            while self.peek() == &Token::Comma {
                self.advance();
                elements.push(self.parse_value()?);
            }
        }
        self.close(TokenKind::ArrayClose)?;
        Ok(Node::Array(elements))
    }

    fn parse_table(&mut self) -> Result<Node, ConvertError> {
        self.open(TokenKind::TableOpen)?;
        let mut entries = Vec::new();
        if self.peek() != &Token::TableClose {
            entries.push(self.parse_entry()?);
            while self.peek() == &Token::Dot {
                self.advance();
                entries.push(self.parse_entry()?);
            }
        }
        self.close(TokenKind::TableClose)?;
        Ok(Node::Table(entries))
    }

    fn parse_entry(&mut self) -> Result<TableEntry, ConvertError> {
        let key = self.take_ident()?;
        self.expect(TokenKind::Arrow)?;
        let value = self.parse_value()?;
        Ok(TableEntry { key, value })
    }
}

/// Parse a token stream (as produced by [`crate::lexer::lex`]) into the
/// ordered list of top-level nodes. A stream without a trailing `Eof` is
/// treated as if one followed its last token.
pub fn parse(tokens: &[Spanned]) -> Result<Vec<Node>, ConvertError> {
    let tokens = terminated(tokens);
    let mut p = Parser::new(&tokens);
    p.parse_program()
}

fn terminated(tokens: &[Spanned]) -> Cow<'_, [Spanned]> {
    match tokens.last() {
        Some(last) if last.token == Token::Eof => Cow::Borrowed(tokens),
        last => {
            let (line, column) = last.map_or((1, 1), |t| {
                (t.line, t.column + t.text.chars().count() as u32)
            });
            let mut owned = tokens.to_vec();
            owned.push(Spanned {
                token: Token::Eof,
                text: String::new(),
                line,
                column,
            });
            Cow::Owned(owned)
        }
    }
}
