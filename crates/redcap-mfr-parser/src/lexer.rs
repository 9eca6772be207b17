//! Tokenizer for branching-logic strings

use redcap_mfr_diagnostics::{LogicError, Span};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A lexed token kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier: field name, event name, function name or keyword
    Ident(String),
    /// Numeric literal
    Number(Decimal),
    /// Quoted string literal (single or double quotes, quotes stripped)
    Text(String),
    /// `=`
    Eq,
    /// `<>` or `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
}

impl TokenKind {
    /// Short human-readable description for expected-vs-found messages
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Number(n) => format!("number {n}"),
            Self::Text(_) => "string literal".to_string(),
            Self::Eq => "'='".to_string(),
            Self::Ne => "'<>'".to_string(),
            Self::Lt => "'<'".to_string(),
            Self::Le => "'<='".to_string(),
            Self::Gt => "'>'".to_string(),
            Self::Ge => "'>='".to_string(),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
        }
    }

    /// Match a keyword case-insensitively
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Self::Ident(name) if name.eq_ignore_ascii_case(kw))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token kind
    pub kind: TokenKind,
    /// Byte span in the logic string
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenize a logic string.
///
/// Fails with [`LogicError::Lex`] on the first unrecognized character; this
/// is recoverable at field granularity.
pub fn lex(input: &str) -> Result<Vec<Token>, LogicError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let ch = input[pos..]
            .chars()
            .next()
            .ok_or_else(|| LogicError::lex(pos, '\u{fffd}'))?;

        match ch {
            c if c.is_whitespace() => {
                pos += c.len_utf8();
            }
            '[' => {
                tokens.push(Token::new(TokenKind::LBracket, Span::single(start)));
                pos += 1;
            }
            ']' => {
                tokens.push(Token::new(TokenKind::RBracket, Span::single(start)));
                pos += 1;
            }
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, Span::single(start)));
                pos += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, Span::single(start)));
                pos += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenKind::Comma, Span::single(start)));
                pos += 1;
            }
            '=' => {
                tokens.push(Token::new(TokenKind::Eq, Span::single(start)));
                pos += 1;
            }
            '+' => {
                tokens.push(Token::new(TokenKind::Plus, Span::single(start)));
                pos += 1;
            }
            '-' => {
                tokens.push(Token::new(TokenKind::Minus, Span::single(start)));
                pos += 1;
            }
            '*' => {
                tokens.push(Token::new(TokenKind::Star, Span::single(start)));
                pos += 1;
            }
            '/' => {
                tokens.push(Token::new(TokenKind::Slash, Span::single(start)));
                pos += 1;
            }
            '<' => {
                pos += 1;
                match bytes.get(pos) {
                    Some(b'>') => {
                        pos += 1;
                        tokens.push(Token::new(TokenKind::Ne, Span::new(start, pos)));
                    }
                    Some(b'=') => {
                        pos += 1;
                        tokens.push(Token::new(TokenKind::Le, Span::new(start, pos)));
                    }
                    _ => tokens.push(Token::new(TokenKind::Lt, Span::single(start))),
                }
            }
            '>' => {
                pos += 1;
                if bytes.get(pos) == Some(&b'=') {
                    pos += 1;
                    tokens.push(Token::new(TokenKind::Ge, Span::new(start, pos)));
                } else {
                    tokens.push(Token::new(TokenKind::Gt, Span::single(start)));
                }
            }
            '!' => {
                // `!=` is accepted as a spelling of `<>`; a bare `!` is not
                pos += 1;
                if bytes.get(pos) == Some(&b'=') {
                    pos += 1;
                    tokens.push(Token::new(TokenKind::Ne, Span::new(start, pos)));
                } else {
                    return Err(LogicError::lex(start, '!'));
                }
            }
            '\'' | '"' => {
                pos += ch.len_utf8();
                let content_start = pos;
                loop {
                    match input[pos..].chars().next() {
                        Some(c) if c == ch => {
                            let text = input[content_start..pos].to_string();
                            pos += c.len_utf8();
                            tokens.push(Token::new(
                                TokenKind::Text(text),
                                Span::new(start, pos),
                            ));
                            break;
                        }
                        Some(c) => pos += c.len_utf8(),
                        // Unterminated literal: report the opening quote
                        None => return Err(LogicError::lex(start, ch)),
                    }
                }
            }
            c if c.is_ascii_digit() => {
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                if bytes.get(pos) == Some(&b'.') {
                    pos += 1;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
                let text = &input[start..pos];
                let number = Decimal::from_str(text)
                    .map_err(|_| LogicError::lex(start, c))?;
                tokens.push(Token::new(TokenKind::Number(number), Span::new(start, pos)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let name = input[start..pos].to_string();
                tokens.push(Token::new(TokenKind::Ident(name), Span::new(start, pos)));
            }
            other => return Err(LogicError::lex(start, other)),
        }
    }

    Ok(tokens)
}
