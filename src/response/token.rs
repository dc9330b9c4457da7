//! Single-pass byte-level JSON token reader
//!
//! Yields field-name and value tokens over a complete page body without
//! building a document tree. A frame stack tracks container context; the
//! caller can capture the byte span of a whole subtree with
//! [`TokenReader::finish_container`], which is how matched records are
//! sliced out without recursing the scanner into them.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// One token of the JSON stream
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// Object field name, before its value
    FieldName(Cow<'a, str>),
    /// String scalar value
    String(Cow<'a, str>),
    /// Number scalar value, kept as source text
    Number(&'a str),
    /// Boolean scalar value
    Bool(bool),
    /// Null scalar value
    Null,
}

impl Token<'_> {
    /// Whether this token begins a value (scalar or container)
    #[inline]
    pub fn is_value_start(&self) -> bool {
        !matches!(
            self,
            Self::FieldName(_) | Self::EndObject | Self::EndArray
        )
    }
}

/// Container frame on the reader's stack
#[derive(Debug, Clone, Copy)]
struct Frame {
    is_object: bool,
    /// An object key has been read and its value is next
    awaiting_value: bool,
    /// At least one entry has been consumed, so a comma must precede the next
    saw_entry: bool,
}

/// Pull-based token reader over one page body
#[derive(Debug)]
pub struct TokenReader<'a> {
    data: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
    root_seen: bool,
    token_start: usize,
}

impl<'a> TokenReader<'a> {
    /// Create a reader over a complete page body
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            stack: Vec::with_capacity(8),
            root_seen: false,
            token_start: 0,
        }
    }

    /// Byte offset where the most recent token started
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Byte offset just past the most recent token
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next token, or `None` once the document is exhausted
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        self.skip_whitespace();

        let Some(frame_index) = self.stack.len().checked_sub(1) else {
            if self.root_seen {
                if self.pos < self.data.len() {
                    return Err(self.err("trailing characters after document"));
                }
                return Ok(None);
            }
            if self.pos >= self.data.len() {
                return Err(self.err("unexpected end of input"));
            }
            self.root_seen = true;
            self.token_start = self.pos;
            return self.read_value().map(Some);
        };

        if self.stack[frame_index].is_object {
            if self.stack[frame_index].awaiting_value {
                self.stack[frame_index].awaiting_value = false;
                self.token_start = self.pos;
                return self.read_value().map(Some);
            }
            match self.peek()? {
                b'}' => {
                    self.pos += 1;
                    self.token_start = self.pos - 1;
                    self.stack.pop();
                    return Ok(Some(Token::EndObject));
                }
                _ => {
                    if self.stack[frame_index].saw_entry {
                        self.expect(b',')?;
                        self.skip_whitespace();
                    }
                    if self.peek()? != b'"' {
                        return Err(self.err("expected field name"));
                    }
                    self.token_start = self.pos;
                    let name = self.read_string_contents()?;
                    self.skip_whitespace();
                    self.expect(b':')?;
                    self.stack[frame_index].saw_entry = true;
                    self.stack[frame_index].awaiting_value = true;
                    return Ok(Some(Token::FieldName(name)));
                }
            }
        }

        // Array frame
        match self.peek()? {
            b']' => {
                self.pos += 1;
                self.token_start = self.pos - 1;
                self.stack.pop();
                Ok(Some(Token::EndArray))
            }
            _ => {
                if self.stack[frame_index].saw_entry {
                    self.expect(b',')?;
                    self.skip_whitespace();
                }
                self.stack[frame_index].saw_entry = true;
                self.token_start = self.pos;
                self.read_value().map(Some)
            }
        }
    }

    /// Consume tokens until the container opened by the previous
    /// `StartObject`/`StartArray` token closes; returns the byte offset
    /// just past its closing bracket
    pub fn finish_container(&mut self) -> Result<usize> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                Some(Token::StartObject | Token::StartArray) => depth += 1,
                Some(Token::EndObject | Token::EndArray) => depth -= 1,
                Some(_) => {}
                None => return Err(self.err("unexpected end of input inside value")),
            }
        }
        Ok(self.pos)
    }

    fn read_value(&mut self) -> Result<Token<'a>> {
        match self.peek()? {
            b'{' => {
                self.pos += 1;
                self.stack.push(Frame {
                    is_object: true,
                    awaiting_value: false,
                    saw_entry: false,
                });
                Ok(Token::StartObject)
            }
            b'[' => {
                self.pos += 1;
                self.stack.push(Frame {
                    is_object: false,
                    awaiting_value: false,
                    saw_entry: false,
                });
                Ok(Token::StartArray)
            }
            b'"' => Ok(Token::String(self.read_string_contents()?)),
            b't' => {
                self.expect_literal(b"true")?;
                Ok(Token::Bool(true))
            }
            b'f' => {
                self.expect_literal(b"false")?;
                Ok(Token::Bool(false))
            }
            b'n' => {
                self.expect_literal(b"null")?;
                Ok(Token::Null)
            }
            b'-' | b'0'..=b'9' => self.read_number(),
            _ => Err(self.err("expected a JSON value")),
        }
    }

    fn read_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E' => self.pos += 1,
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| Error::parse(start, "invalid number"))?;
        Ok(Token::Number(text))
    }

    /// Read a string starting at the opening quote, decoding escapes only
    /// when present
    fn read_string_contents(&mut self) -> Result<Cow<'a, str>> {
        debug_assert_eq!(self.data.get(self.pos), Some(&b'"'));
        self.pos += 1;
        let start = self.pos;
        let mut has_escapes = false;

        loop {
            let Some(&byte) = self.data.get(self.pos) else {
                return Err(self.err("unterminated string"));
            };
            match byte {
                b'"' => break,
                b'\\' => {
                    has_escapes = true;
                    self.pos += 2;
                    if self.pos > self.data.len() {
                        return Err(self.err("unterminated string"));
                    }
                }
                b if b < 0x20 => return Err(self.err("raw control character in string")),
                _ => self.pos += 1,
            }
        }
        let end = self.pos;
        self.pos += 1; // closing quote

        let raw = &self.data[start..end];
        if !has_escapes {
            let text = std::str::from_utf8(raw)
                .map_err(|_| Error::parse(start, "invalid UTF-8 in string"))?;
            return Ok(Cow::Borrowed(text));
        }
        decode_escaped(raw, start).map(Cow::Owned)
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<()> {
        if self.data[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.err("invalid literal"))
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek()? == byte {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(&format!("expected '{}'", byte as char)))
        }
    }

    fn peek(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.err("unexpected end of input"))
    }

    fn skip_whitespace(&mut self) {
        while let Some(&byte) = self.data.get(self.pos) {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn err(&self, message: &str) -> Error {
        Error::parse(self.pos, message)
    }
}

/// Decode a string slice known to contain at least one backslash escape
fn decode_escaped(raw: &[u8], offset: usize) -> Result<String> {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&escape) = raw.get(i) else {
            return Err(Error::parse(offset + i, "dangling escape"));
        };
        i += 1;
        match escape {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let high = read_hex4(raw, &mut i, offset)?;
                let ch = if (0xD800..=0xDBFF).contains(&high) {
                    // Surrogate pair: the low half must follow immediately.
                    if raw.get(i) != Some(&b'\\') || raw.get(i + 1) != Some(&b'u') {
                        return Err(Error::parse(offset + i, "unpaired surrogate"));
                    }
                    i += 2;
                    let low = read_hex4(raw, &mut i, offset)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(Error::parse(offset + i, "invalid low surrogate"));
                    }
                    let code =
                        0x10000 + (((high - 0xD800) as u32) << 10) + (low - 0xDC00) as u32;
                    char::from_u32(code)
                        .ok_or_else(|| Error::parse(offset + i, "invalid surrogate pair"))?
                } else {
                    char::from_u32(high as u32)
                        .ok_or_else(|| Error::parse(offset + i, "invalid unicode escape"))?
                };
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            _ => return Err(Error::parse(offset + i, "unknown escape")),
        }
    }
    String::from_utf8(out).map_err(|_| Error::parse(offset, "invalid UTF-8 in string"))
}

fn read_hex4(raw: &[u8], i: &mut usize, offset: usize) -> Result<u16> {
    let end = *i + 4;
    if end > raw.len() {
        return Err(Error::parse(offset + *i, "truncated unicode escape"));
    }
    let hex = std::str::from_utf8(&raw[*i..end])
        .map_err(|_| Error::parse(offset + *i, "invalid unicode escape"))?;
    let value = u16::from_str_radix(hex, 16)
        .map_err(|_| Error::parse(offset + *i, "invalid unicode escape"))?;
    *i = end;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut reader = TokenReader::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(token) = reader.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn scans_flat_object() {
        assert_eq!(
            tokens(r#"{"a": 1, "b": "x", "c": true, "d": null}"#),
            vec![
                Token::StartObject,
                Token::FieldName("a".into()),
                Token::Number("1"),
                Token::FieldName("b".into()),
                Token::String("x".into()),
                Token::FieldName("c".into()),
                Token::Bool(true),
                Token::FieldName("d".into()),
                Token::Null,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn scans_nested_arrays() {
        assert_eq!(
            tokens(r#"{"a": [1, [2], {"b": 3}]}"#),
            vec![
                Token::StartObject,
                Token::FieldName("a".into()),
                Token::StartArray,
                Token::Number("1"),
                Token::StartArray,
                Token::Number("2"),
                Token::EndArray,
                Token::StartObject,
                Token::FieldName("b".into()),
                Token::Number("3"),
                Token::EndObject,
                Token::EndArray,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(
            tokens(r#"{"a": "x\n\"y\" é"}"#),
            vec![
                Token::StartObject,
                Token::FieldName("a".into()),
                Token::String("x\n\"y\" é".into()),
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn decodes_surrogate_pairs() {
        assert_eq!(
            tokens(r#"{"a": "😀"}"#),
            vec![
                Token::StartObject,
                Token::FieldName("a".into()),
                Token::String("😀".into()),
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn truncated_input_is_a_parse_error() {
        let mut reader = TokenReader::new(br#"{"a": [1, 2"#);
        let mut last = reader.next_token();
        while let Ok(Some(_)) = last {
            last = reader.next_token();
        }
        assert!(matches!(last, Err(Error::Parse { .. })));
    }

    #[test]
    fn trailing_garbage_is_a_parse_error() {
        let mut reader = TokenReader::new(b"{} x");
        assert!(matches!(
            reader.next_token().unwrap(),
            Some(Token::StartObject)
        ));
        assert!(matches!(
            reader.next_token().unwrap(),
            Some(Token::EndObject)
        ));
        assert!(reader.next_token().is_err());
    }

    #[test]
    fn finish_container_returns_span_end() {
        let input = br#"{"skip": {"deep": [1, 2, {"x": "}"}]}, "after": 1}"#;
        let mut reader = TokenReader::new(input);
        assert!(matches!(
            reader.next_token().unwrap(),
            Some(Token::StartObject)
        ));
        assert!(matches!(
            reader.next_token().unwrap(),
            Some(Token::FieldName(_))
        ));
        let start = {
            let token = reader.next_token().unwrap();
            assert!(matches!(token, Some(Token::StartObject)));
            reader.token_start()
        };
        let end = reader.finish_container().unwrap();
        let slice = &input[start..end];
        assert_eq!(slice, br#"{"deep": [1, 2, {"x": "}"}]}"#);
        assert!(matches!(
            reader.next_token().unwrap(),
            Some(Token::FieldName(_))
        ));
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        let mut reader = TokenReader::new(b"   ");
        assert!(reader.next_token().is_err());
    }
}
