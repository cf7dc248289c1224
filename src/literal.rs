//! Restricted literal grammar for auxiliary metrics
//!
//! Candidate programs report extra metrics as `# name = <literal>` lines using
//! Python literal syntax. This module parses that syntax into a tagged
//! [`Literal`] value without evaluating anything:
//!
//! - numbers: `42`, `-7`, `1.5e-3`, `0x1f`, `1_000`
//! - strings: `'abc'`, `"a\tb"`
//! - constants: `True`, `False`, `None` (and `true`, `false`, `null`)
//! - containers: `[1, 2]`, `(1, 2)`, `{'k': [1, 2]}`
//!
//! Names, calls, attribute access and operators other than a leading sign are
//! rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// A parsed literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Map(BTreeMap<String, Literal>),
}

impl Literal {
    /// Numeric value, if this literal is an integer or a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Key under which this literal is stored when used as a mapping key
    fn to_key(&self) -> Option<String> {
        match self {
            Literal::Str(s) => Some(s.clone()),
            Literal::Null | Literal::Bool(_) | Literal::Int(_) | Literal::Float(_) => {
                Some(self.to_string())
            }
            Literal::List(_) | Literal::Map(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Literal::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Error produced when a literal cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parse a complete literal. Leading and trailing whitespace is allowed,
/// anything else after the value is an error.
pub fn parse_literal(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Stored results are JSON, which cannot hold inf or nan
fn finite_float(value: f64, offset: usize) -> Result<Literal, LiteralError> {
    if value.is_finite() {
        Ok(Literal::Float(value))
    } else {
        Err(LiteralError {
            offset,
            message: "number out of range".to_string(),
        })
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        match self.peek() {
            None => Err(self.error("expected a literal")),
            Some('[') => self.nested(|p| p.parse_sequence(']')),
            Some('(') => self.nested(|p| p.parse_tuple()),
            Some('{') => self.nested(|p| p.parse_mapping()),
            Some('\'') | Some('"') => self.parse_string().map(Literal::Str),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => {
                self.parse_number()
            }
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(self.error(format!("unexpected character {:?}", c))),
        }
    }

    fn nested<F>(&mut self, f: F) -> Result<Literal, LiteralError>
    where
        F: FnOnce(&mut Self) -> Result<Literal, LiteralError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_word(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::Null),
            word => Err(LiteralError {
                offset: start,
                message: format!("names are not allowed: {}", word),
            }),
        }
    }

    fn parse_number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_ws();

        if self.peek() == Some('0') {
            let radix = match self.peek_second() {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits = self.take_digits(|c| c.is_digit(radix));
                if digits.is_empty() {
                    return Err(LiteralError {
                        offset: start,
                        message: "invalid integer literal".to_string(),
                    });
                }
                let signed = if negative {
                    format!("-{}", digits)
                } else {
                    digits.clone()
                };
                if let Ok(value) = i64::from_str_radix(&signed, radix) {
                    return Ok(Literal::Int(value));
                }
                // Too wide for i64, same fallback as decimal integers
                let magnitude = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
                return finite_float(if negative { -magnitude } else { magnitude }, start);
            }
        }

        let mut text = String::new();
        if negative {
            text.push('-');
        }
        let int_part = self.take_digits(|c| c.is_ascii_digit());
        text.push_str(&int_part);
        let mut is_float = false;
        let mut has_digits = !int_part.is_empty();

        if self.eat('.') {
            is_float = true;
            let frac = self.take_digits(|c| c.is_ascii_digit());
            has_digits |= !frac.is_empty();
            text.push('.');
            text.push_str(&frac);
        }
        if !has_digits {
            return Err(LiteralError {
                offset: start,
                message: "expected digits".to_string(),
            });
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.bump();
            text.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.bump();
                text.push(sign);
            }
            let exp = self.take_digits(|c| c.is_ascii_digit());
            if exp.is_empty() {
                return Err(self.error("expected exponent digits"));
            }
            text.push_str(&exp);
        }

        if !is_float {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(Literal::Int(value));
            }
        }
        let value = text.parse::<f64>().map_err(|_| LiteralError {
            offset: start,
            message: "invalid number".to_string(),
        })?;
        finite_float(value, start)
    }

    /// Digits with `_` separators removed
    fn take_digits(&mut self, is_digit: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if is_digit(c) {
                digits.push(c);
            } else if c != '_' {
                break;
            }
            self.bump();
        }
        digits
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or(LiteralError {
                offset: start,
                message: "unterminated string".to_string(),
            })?;
            match c {
                c if c == quote => return Ok(out),
                '\n' => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string".to_string(),
                    })
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' => out.push(c),
            'x' | 'u' => {
                let len = if c == 'x' { 2 } else { 4 };
                let end = self.pos + len;
                let hex = self
                    .src
                    .get(self.pos..end)
                    .ok_or_else(|| self.error("truncated escape"))?;
                if !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    return Err(self.error("invalid escape"));
                }
                let code = u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("invalid escape"))?;
                out.push(code);
                self.pos = end;
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Comma-separated values up to `close`; a trailing comma is allowed
    fn parse_items(&mut self, close: char) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            if !self.eat(',') {
                return Err(self.error(format!("expected ',' or '{}'", close)));
            }
        }
    }

    fn parse_sequence(&mut self, close: char) -> Result<Literal, LiteralError> {
        self.bump();
        self.parse_items(close).map(Literal::List)
    }

    fn parse_tuple(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_ws();
        if self.eat(')') {
            return Ok(Literal::List(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_ws();
        // `(x)` is just a parenthesized value
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.error("expected ',' or ')'"));
        }
        let mut items = vec![first];
        items.extend(self.parse_items(')')?);
        Ok(Literal::List(items))
    }

    fn parse_mapping(&mut self) -> Result<Literal, LiteralError> {
        self.bump();
        self.skip_ws();
        if self.eat('}') {
            return Ok(Literal::Map(BTreeMap::new()));
        }

        let key_offset = self.pos;
        let first = self.parse_value()?;
        self.skip_ws();
        if !self.eat(':') {
            // `{a, b}` is a set display, kept as a list
            let mut items = vec![first];
            if self.eat('}') {
                return Ok(Literal::List(items));
            }
            if !self.eat(',') {
                return Err(self.error("expected ':', ',' or '}'"));
            }
            items.extend(self.parse_items('}')?);
            return Ok(Literal::List(items));
        }

        let mut entries = BTreeMap::new();
        let mut key = first;
        let mut key_offset = key_offset;
        loop {
            let key_text = key.to_key().ok_or(LiteralError {
                offset: key_offset,
                message: "mapping keys must be scalars".to_string(),
            })?;
            self.skip_ws();
            let value = self.parse_value()?;
            entries.insert(key_text, value);
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Map(entries));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Map(entries));
            }
            key_offset = self.pos;
            key = self.parse_value()?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':'"));
            }
        }
    }
}
