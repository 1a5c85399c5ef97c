use crate::messages::{MessageKind, Payload};
use crate::types::{Envelope, FieldDecodeError};
use std::str::FromStr;

/// Decoder for the kind-specific fields of one message type.
///
/// Implementations read positionally from [`Fields`]; the dispatcher has
/// already removed the tag and the trailing envelope, and rejects any tokens
/// the parser leaves unread.
pub trait MessageParser: Send + Sync {
    /// Returns the name of this parser, used in logs
    fn name(&self) -> &'static str;

    fn kind(&self) -> MessageKind;

    fn parse(&self, fields: &mut Fields<'_>, envelope: &Envelope) -> Result<Payload, FieldDecodeError>;
}

/// Positional cursor over the tokens between the tag and the envelope.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Fields<'a> {
    pub fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn next_str(&mut self, field: &'static str) -> Result<&'a str, FieldDecodeError> {
        let tokens = self.tokens;
        let token = *tokens.get(self.pos).ok_or(FieldDecodeError::Missing { field })?;
        self.pos += 1;
        Ok(token)
    }

    pub fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, FieldDecodeError> {
        let token = self.next_str(field)?;
        token.parse().map_err(|_| FieldDecodeError::InvalidNumber {
            field,
            value: token.to_string(),
        })
    }

    pub fn f64(&mut self, field: &'static str) -> Result<f64, FieldDecodeError> {
        self.number(field)
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, FieldDecodeError> {
        self.number(field)
    }

    pub fn char(&mut self, field: &'static str) -> Result<char, FieldDecodeError> {
        let token = self.next_str(field)?;
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(FieldDecodeError::InvalidChar {
                field,
                value: token.to_string(),
            }),
        }
    }

    /// Reads a count field and checks it against the tokens left on the line.
    pub fn count(&mut self, field: &'static str) -> Result<usize, FieldDecodeError> {
        let declared: usize = self.number(field)?;
        let remaining = self.remaining();
        if declared > remaining {
            return Err(FieldDecodeError::CountMismatch {
                field,
                declared,
                remaining,
            });
        }
        Ok(declared)
    }

    /// Count-prefixed array: `<n> v1 .. vn`.
    pub fn counted<T: FromStr>(&mut self, field: &'static str) -> Result<Vec<T>, FieldDecodeError> {
        let len = self.count(field)?;
        (0..len).map(|_| self.number(field)).collect()
    }

    /// Takes every token left.
    pub fn rest(&mut self) -> &'a [&'a str] {
        let tokens = self.tokens;
        let start = self.pos;
        self.pos = tokens.len();
        &tokens[start..]
    }

    pub fn finish(&self) -> Result<(), FieldDecodeError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(FieldDecodeError::TrailingTokens { count }),
        }
    }
}

/// Comment lines start with `#` after optional leading whitespace.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}
