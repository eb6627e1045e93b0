//! Parser for type expressions written as text.
//!
//! Template headers are parsed elsewhere; this parser exists for callers that
//! only hold a type string, such as validators checking the declared
//! signatures of externally supplied functions.
//!
//! Grammar:
//!
//! ```text
//! type     := primary ('|' primary)*
//! primary  := NAME ('<' (type (',' type)*)? '>')?
//!           | '?'
//!           | '[' (field (',' field)*)? ']'
//!           | '{' (field (',' field)*)? '}'
//! field    := NAME ':' type
//! NAME     := [A-Za-z_][A-Za-z0-9_.]*
//! ```

use soy_core::{SoyError, Span};

use crate::type_ast::{RecordProperty, TypeNode};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Question,
    Lt,
    Gt,
    Comma,
    Pipe,
    Colon,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("'{name}'"),
            Token::Question => "'?'".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Pipe => "'|'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(Token, Span)>, SoyError> {
    let mut tokens = Vec::new();
    let mut line = 1u32;
    let mut col = 1u32;
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch == '\n' {
            chars.next();
            line += 1;
            col = 1;
            continue;
        }
        if ch.is_whitespace() {
            chars.next();
            col += ch.len_utf8() as u32;
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = col;
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                    name.push(c);
                    chars.next();
                    col += 1;
                } else {
                    break;
                }
            }
            let len = name.len() as u32;
            tokens.push((Token::Name(name), Span::new(line, start, len)));
            continue;
        }
        let token = match ch {
            '?' => Token::Question,
            '<' => Token::Lt,
            '>' => Token::Gt,
            ',' => Token::Comma,
            '|' => Token::Pipe,
            ':' => Token::Colon,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            other => {
                return Err(SoyError::Syntax {
                    message: format!("unexpected character '{other}' in type expression"),
                    span: Span::new(line, col, other.len_utf8() as u32),
                });
            }
        };
        tokens.push((token, Span::new(line, col, 1)));
        chars.next();
        col += 1;
    }

    tokens.push((Token::Eof, Span::point(line, col)));
    Ok(tokens)
}

/// Deepest nesting of generics, unions and records accepted.
pub const MAX_NESTING_DEPTH: usize = 64;

struct TypeParser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    depth: usize,
}

impl TypeParser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> (Token, Span) {
        let current = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        current
    }

    fn unexpected(&self, expected: &str) -> SoyError {
        SoyError::Syntax {
            message: format!("expected {expected}, found {}", self.peek().describe()),
            span: self.peek_span(),
        }
    }

    fn expect(&mut self, token: Token) -> Result<Span, SoyError> {
        if *self.peek() == token {
            Ok(self.advance().1)
        } else {
            Err(self.unexpected(&token.describe()))
        }
    }

    fn parse_type(&mut self) -> Result<TypeNode, SoyError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(SoyError::Syntax {
                message: format!("type expression nested deeper than {MAX_NESTING_DEPTH} levels"),
                span: self.peek_span(),
            });
        }
        self.depth += 1;
        let node = self.parse_union();
        self.depth -= 1;
        node
    }

    fn parse_union(&mut self) -> Result<TypeNode, SoyError> {
        let first = self.parse_primary()?;
        if *self.peek() != Token::Pipe {
            return Ok(first);
        }

        let mut candidates = vec![first];
        while *self.peek() == Token::Pipe {
            self.advance();
            candidates.push(self.parse_primary()?);
        }
        let span = candidates[0].span().merge(candidates[candidates.len() - 1].span());
        Ok(TypeNode::Union { candidates, span })
    }

    fn parse_primary(&mut self) -> Result<TypeNode, SoyError> {
        match self.peek().clone() {
            Token::Name(name) => {
                let (_, name_span) = self.advance();
                if *self.peek() == Token::Lt {
                    self.parse_generic(name, name_span)
                } else {
                    Ok(TypeNode::Named {
                        name,
                        span: name_span,
                    })
                }
            }
            Token::Question => {
                let (_, span) = self.advance();
                Ok(TypeNode::named("?", span))
            }
            Token::LBracket => self.parse_record(Token::RBracket),
            Token::LBrace => self.parse_record(Token::RBrace),
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_generic(&mut self, name: String, name_span: Span) -> Result<TypeNode, SoyError> {
        self.expect(Token::Lt)?;
        let mut arguments = Vec::new();
        if *self.peek() != Token::Gt {
            arguments.push(self.parse_type()?);
            while *self.peek() == Token::Comma {
                self.advance();
                arguments.push(self.parse_type()?);
            }
        }
        let close = self.expect(Token::Gt)?;
        Ok(TypeNode::Generic {
            name,
            arguments,
            span: name_span.merge(close),
            close,
        })
    }

    fn parse_record(&mut self, close: Token) -> Result<TypeNode, SoyError> {
        let (_, open_span) = self.advance();
        let mut properties = Vec::new();
        if *self.peek() != close {
            loop {
                let (name, name_span) = match self.peek().clone() {
                    Token::Name(name) => (name, self.advance().1),
                    _ => return Err(self.unexpected("a field name")),
                };
                self.expect(Token::Colon)?;
                let ty = self.parse_type()?;
                properties.push(RecordProperty {
                    name,
                    name_span,
                    ty,
                });
                if *self.peek() != Token::Comma {
                    break;
                }
                self.advance();
            }
        }
        let close_span = self.expect(close)?;
        Ok(TypeNode::Record {
            properties,
            span: open_span.merge(close_span),
        })
    }
}

/// Parse a complete type expression.
pub fn parse_type_expression(text: &str) -> Result<TypeNode, SoyError> {
    let mut parser = TypeParser {
        tokens: tokenize(text)?,
        pos: 0,
        depth: 0,
    };
    let node = parser.parse_type()?;
    if *parser.peek() != Token::Eof {
        return Err(parser.unexpected("end of type expression"));
    }
    Ok(node)
}
