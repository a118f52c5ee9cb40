//! Recursive-descent JSON parser: bytes in, owned [`Value`] tree out.
//!
//! The input is a length-bounded byte slice (no terminator needed) holding
//! exactly one JSON value, optionally surrounded by whitespace. Anything else
//! after that value is an error.
//!
//! # Key design decisions
//!
//! - **Integer vs real**: a number literal without a fraction or exponent
//!   becomes [`Value::Integer`]; with either it becomes [`Value::Real`].
//!   `17` is an integer, `17.0` and `17e0` are reals. Integer literals that do
//!   not fit in `i64` are rejected rather than silently widened.
//! - **Depth bound**: containers nest at most [`MAX_DEPTH`] levels by default
//!   (the outermost container is level 1). Going one level deeper fails with
//!   [`JsonError::DepthExceeded`]. This bounds recursion on hostile input.
//! - **No partial trees**: every node is owned by a local or by its parent
//!   under construction, so returning `Err` drops whatever was built.
//! - **Binary-safe strings**: bytes ≥ 0x20 other than `"` and `\` are copied
//!   verbatim, UTF-8 or not. `\uXXXX` escapes (including surrogate pairs) are
//!   decoded to UTF-8. Raw control bytes are rejected.

use crate::array::Array;
use crate::error::{JsonError, Result};
use crate::value::{Object, Value, OBJECT_CAPACITY};

/// Default maximum container nesting accepted by [`parse`].
pub const MAX_DEPTH: usize = 7;

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest container nesting accepted; the outermost container is depth 1.
    /// Parsing recurses once per level, so very large values trade the
    /// stack-safety bound away.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parse one JSON document with the default options.
///
/// # Errors
///
/// [`JsonError::Malformed`] for grammar violations and trailing content,
/// [`JsonError::DepthExceeded`] past [`MAX_DEPTH`], and
/// [`JsonError::OutOfMemory`] if the tree cannot be allocated.
pub fn parse(input: &[u8]) -> Result<Value> {
    parse_with(input, ParseOptions::default())
}

/// Parse one JSON document with explicit options.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_with(input: &[u8], options: ParseOptions) -> Result<Value> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
        max_depth: options.max_depth,
    };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(parser.malformed("trailing characters after value"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn malformed(&self, message: &str) -> JsonError {
        malformed_at(self.pos, message)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Dispatch on the first significant byte of a value.
    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.malformed("unexpected end of input")),
            Some(b'n') => self.parse_literal(b"null", Value::Null),
            Some(b't') => self.parse_literal(b"true", Value::Boolean(true)),
            Some(b'f') => self.parse_literal(b"false", Value::Boolean(false)),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.malformed("unexpected character")),
        }
    }

    fn parse_literal(&mut self, literal: &[u8], value: Value) -> Result<Value> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(value)
        } else {
            Err(self.malformed("invalid literal"))
        }
    }

    /// Step into a container, enforcing the depth bound.
    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(JsonError::DepthExceeded {
                offset: self.pos,
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        self.pos += 1; // opening bracket
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.enter()?;
        let mut items = Array::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }

        loop {
            let item = self.parse_value()?;
            items.push(item)?;

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.malformed("unterminated array")),
                Some(_) => return Err(self.malformed("expected ',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.enter()?;
        let mut map = Object::with_capacity(OBJECT_CAPACITY)?;

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'"') => {}
                None => return Err(self.malformed("unterminated object")),
                Some(_) => return Err(self.malformed("expected string key")),
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return Err(self.malformed("expected ':' after key"));
            }
            self.pos += 1;

            let value = self.parse_value()?;
            // Duplicate keys: the last occurrence wins, earlier values drop here.
            map.insert(&key, value)?;

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.malformed("unterminated object")),
                Some(_) => return Err(self.malformed("expected ',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    /// Parse a quoted string starting at the opening quote and return its
    /// decoded bytes.
    fn parse_string(&mut self) -> Result<Vec<u8>> {
        let open = self.pos;
        self.pos += 1;
        let mut out = Vec::new();

        loop {
            let run_start = self.pos;
            while let Some(b) = self.peek() {
                if b == b'"' || b == b'\\' || b < 0x20 {
                    break;
                }
                self.pos += 1;
            }
            let run = &self.input[run_start..self.pos];
            out.try_reserve(run.len())?;
            out.extend_from_slice(run);

            match self.peek() {
                None => return Err(malformed_at(open, "unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.parse_escape(&mut out)?;
                }
                Some(_) => return Err(self.malformed("control character in string")),
            }
        }
    }

    /// Decode one escape sequence; `pos` is just past the backslash.
    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.malformed("unterminated escape sequence"));
        };
        let decoded = match b {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                self.pos += 1;
                let ch = self.parse_unicode_escape()?;
                let mut buf = [0u8; 4];
                let encoded = ch.encode_utf8(&mut buf).as_bytes();
                out.try_reserve(encoded.len())?;
                out.extend_from_slice(encoded);
                return Ok(());
            }
            _ => return Err(self.malformed("invalid escape sequence")),
        };
        self.pos += 1;
        out.try_reserve(1)?;
        out.push(decoded);
        Ok(())
    }

    /// Decode the `XXXX` of `\uXXXX`, pulling in a following `\uXXXX` low
    /// surrogate when the first unit is a high surrogate.
    fn parse_unicode_escape(&mut self) -> Result<char> {
        let start = self.pos;
        let unit = self.parse_hex4()?;
        let code = match unit {
            0xD800..=0xDBFF => {
                if !self.input[self.pos..].starts_with(b"\\u") {
                    return Err(malformed_at(start, "unpaired high surrogate"));
                }
                self.pos += 2;
                let low = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(malformed_at(start, "invalid low surrogate"));
                }
                0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(malformed_at(start, "unpaired low surrogate")),
            _ => unit,
        };
        char::from_u32(code).ok_or_else(|| malformed_at(start, "invalid code point"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.malformed("truncated \\u escape"))?;
        let mut unit = 0u32;
        for &d in digits {
            let nibble = char::from(d)
                .to_digit(16)
                .ok_or_else(|| self.malformed("invalid hex digit in \\u escape"))?;
            unit = (unit << 4) | nibble;
        }
        self.pos += 4;
        Ok(unit)
    }

    /// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`
    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.malformed("expected digit")),
        }

        let mut is_real = false;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.require_digits("expected digit after decimal point")?;
            is_real = true;
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            self.require_digits("expected digit in exponent")?;
            is_real = true;
        }

        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| malformed_at(start, "invalid number"))?;
        if is_real {
            let n: f64 = text
                .parse()
                .map_err(|_| malformed_at(start, "invalid number"))?;
            if !n.is_finite() {
                return Err(malformed_at(start, "number out of range"));
            }
            Ok(Value::Real(n))
        } else {
            text.parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| malformed_at(start, "integer out of range"))
        }
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn require_digits(&mut self, message: &str) -> Result<()> {
        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.malformed(message));
        }
        self.skip_digits();
        Ok(())
    }
}

fn malformed_at(offset: usize, message: &str) -> JsonError {
    JsonError::Malformed {
        offset,
        message: message.to_string(),
    }
}
