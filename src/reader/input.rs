//! Low-level input handling for the event reader.
//!
//! [`Input`] wraps the source text and tracks the position (line, column,
//! byte offset) while offering the small set of primitives the reader is
//! built from: peeking, advancing, lookahead, name and reference parsing.

use crate::error::{ParseError, SourceLocation};
use crate::util::qname::{is_name_char, is_name_start_char};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: usize = 256;

/// Default maximum length (in bytes) of an element or attribute name.
const MAX_NAME_LENGTH: usize = 50_000;

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// A position that can be returned to after a failed lookahead.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

/// The source text and a cursor into it.
#[derive(Debug)]
pub(crate) struct Input<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Input<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.column = mark.column;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.text.get(self.pos..)?.chars().next()
    }

    /// Advances past one character, updating line and column.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Advances past `count` ASCII bytes.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek_char() {
                Some(ch) => self.advance_char(ch),
                None => break,
            }
        }
    }

    /// Consumes the next character with `\r\n` normalization and character
    /// validation.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        Ok(ch)
    }

    pub fn looking_at(&self, s: &str) -> bool {
        self.text
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(s))
    }

    pub fn expect_str(&mut self, expected: &str) -> Result<(), ParseError> {
        if !self.looking_at(expected) {
            return Err(self.fatal(format!("expected '{expected}'")));
        }
        self.advance(expected.chars().count());
        Ok(())
    }

    /// Skips whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance(1);
        }
        self.pos > start
    }

    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    /// Consumes characters up to (not including) `delimiter` and returns
    /// them, line endings normalized.
    pub fn take_until(&mut self, delimiter: &str, what: &str) -> Result<String, ParseError> {
        let mut out = String::new();
        while !self.looking_at(delimiter) {
            if self.at_end() {
                return Err(self.fatal(format!("unterminated {what}")));
            }
            out.push(self.next_char()?);
        }
        Ok(out)
    }

    /// Parses an XML `Name`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);
        while let Some(ch) = self.peek_char() {
            if !is_name_char(ch) {
                break;
            }
            self.advance_char(ch);
        }
        let len = self.pos - start;
        if len > MAX_NAME_LENGTH {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({MAX_NAME_LENGTH})"
            )));
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// Parses the rest of a character reference after `&#`.
    pub fn parse_char_reference(&mut self) -> Result<char, ParseError> {
        let hex = self.peek() == Some(b'x');
        if hex {
            self.advance(1);
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        {
            self.advance(1);
        }
        let digits = &self.text[start..self.pos];
        if digits.is_empty() {
            return Err(self.fatal("empty character reference"));
        }
        let value = u32::from_str_radix(digits, if hex { 16 } else { 10 })
            .map_err(|_| self.fatal("invalid character reference"))?;
        self.expect_str(";")?;
        char::from_u32(value)
            .filter(|&c| is_xml_char(c))
            .ok_or_else(|| {
                self.fatal(format!(
                    "character reference &#x{value:X}; does not refer to a valid XML character"
                ))
            })
    }

    /// Parses a quoted literal without reference expansion (system and
    /// public identifiers, declaration pseudo-attributes).
    pub fn parse_quoted(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return Err(self.fatal("expected quoted string")),
        };
        self.advance(1);
        let value = self.take_until(if quote == '"' { "\"" } else { "'" }, "literal")?;
        self.advance(1);
        Ok(value)
    }

    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }
}

/// Maps a predefined entity name to its replacement character.
pub(crate) fn predefined_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_tracking() {
        let mut input = Input::new("ab\ncd");
        input.advance(3);
        let loc = input.location();
        assert_eq!((loc.line, loc.column, loc.byte_offset), (2, 1, 3));
    }

    #[test]
    fn test_next_char_normalizes_crlf() {
        let mut input = Input::new("\r\nx");
        assert_eq!(input.next_char().unwrap(), '\n');
        assert_eq!(input.next_char().unwrap(), 'x');
        assert!(input.next_char().is_err());
    }

    #[test]
    fn test_parse_name_and_mark() {
        let mut input = Input::new("foo:bar baz");
        let mark = input.mark();
        assert_eq!(input.parse_name().unwrap(), "foo:bar");
        input.reset(mark);
        assert_eq!(input.parse_name().unwrap(), "foo:bar");
        assert!(Input::new("1abc").parse_name().is_err());
    }

    #[test]
    fn test_char_references() {
        assert_eq!(Input::new("x41;").parse_char_reference().unwrap(), 'A');
        assert_eq!(Input::new("65;").parse_char_reference().unwrap(), 'A');
        assert!(Input::new("0;").parse_char_reference().is_err());
        assert!(Input::new(";").parse_char_reference().is_err());
    }

    #[test]
    fn test_take_until_reports_unterminated() {
        let mut input = Input::new("abc");
        let err = input.take_until("-->", "comment").unwrap_err();
        assert_eq!(err.message, "unterminated comment");
        assert_eq!(err.location.byte_offset, 3);
    }
}
