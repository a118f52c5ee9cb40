//! Two-phase serializer: [`size`] measures, [`dump`] writes.
//!
//! Callers size a buffer exactly with `size`, then `dump` into it. Both walk
//! the tree the same way and format numbers through the same helper, so
//! `dump` always writes exactly `size` bytes.
//!
//! Canonical form:
//!
//! - objects as `{"key":value,...}` in hash-table iteration order
//! - arrays as `[value,...]`
//! - strings quoted, escaping `"`, `\` and bytes below 0x20 (`\b \f \n \r \t`
//!   where JSON has a short form, `\u00XX` otherwise); every other byte is
//!   written verbatim
//! - integers in plain decimal
//! - reals in the shortest form that reads back to the same `f64` and always
//!   carries a `.` or an exponent, so they parse back as reals
//! - `null`, `true`, `false`; non-finite reals are written as `null`
//!
//! No whitespace is emitted anywhere.

use std::fmt::{self, Write as _};

use crate::error::{JsonError, Result};
use crate::value::Value;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Exact number of bytes [`dump`] writes for `value`.
pub fn size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Boolean(true) => 4,
        Value::Boolean(false) => 5,
        Value::Integer(n) => NumberText::integer(*n).len,
        Value::Real(n) => match NumberText::real(*n) {
            Some(text) => text.len,
            None => 4,
        },
        Value::String(bytes) => string_size(bytes),
        Value::Array(items) => {
            let separators = items.len().saturating_sub(1);
            2 + separators + items.iter().map(size).sum::<usize>()
        }
        Value::Object(map) => {
            let separators = map.len().saturating_sub(1);
            2 + separators
                + map
                    .iter()
                    .map(|(key, value)| string_size(key) + 1 + size(value))
                    .sum::<usize>()
        }
    }
}

/// Serialize `value` into the start of `dest`, returning the byte count.
///
/// Nothing past `dest[..returned]` is touched.
///
/// # Errors
///
/// [`JsonError::BufferTooSmall`] if `dest` is shorter than [`size`] of
/// `value`. Bytes already written stay inside `dest`.
pub fn dump(dest: &mut [u8], value: &Value) -> Result<usize> {
    let mut out = SliceWriter { buf: dest, pos: 0 };
    write_value(&mut out, value)?;
    Ok(out.pos)
}

/// Size of `bytes` as a quoted, escaped JSON string.
pub fn string_size(bytes: &[u8]) -> usize {
    2 + bytes.iter().map(|&b| escaped_len(b)).sum::<usize>()
}

/// Write `bytes` as a quoted, escaped JSON string at the start of `dest`.
///
/// # Errors
///
/// [`JsonError::BufferTooSmall`] if `dest` is shorter than
/// [`string_size`] of `bytes`.
pub fn string_dump(dest: &mut [u8], bytes: &[u8]) -> Result<usize> {
    let mut out = SliceWriter { buf: dest, pos: 0 };
    write_string(&mut out, bytes)?;
    Ok(out.pos)
}

/// Serialize into a freshly allocated buffer of exactly [`size`] bytes.
///
/// # Errors
///
/// [`JsonError::OutOfMemory`] if the buffer cannot be allocated.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let len = size(value);
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0);
    let written = dump(&mut buf, value)?;
    debug_assert_eq!(written, len, "size and dump disagree");
    Ok(buf)
}

fn write_value(out: &mut SliceWriter<'_>, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.put(b"null"),
        Value::Boolean(true) => out.put(b"true"),
        Value::Boolean(false) => out.put(b"false"),
        Value::Integer(n) => out.put(NumberText::integer(*n).as_bytes()),
        Value::Real(n) => match NumberText::real(*n) {
            Some(text) => out.put(text.as_bytes()),
            None => out.put(b"null"),
        },
        Value::String(bytes) => write_string(out, bytes),
        Value::Array(items) => {
            out.put(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.put(b",")?;
                }
                write_value(out, item)?;
            }
            out.put(b"]")
        }
        Value::Object(map) => {
            out.put(b"{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.put(b",")?;
                }
                write_string(out, key)?;
                out.put(b":")?;
                write_value(out, item)?;
            }
            out.put(b"}")
        }
    }
}

fn write_string(out: &mut SliceWriter<'_>, bytes: &[u8]) -> Result<()> {
    out.put(b"\"")?;
    let mut run_start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped_len(b) == 1 {
            continue;
        }
        out.put(&bytes[run_start..i])?;
        run_start = i + 1;
        match short_escape(b) {
            Some(esc) => out.put(&[b'\\', esc])?,
            None => out.put(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0xf)],
            ])?,
        }
    }
    out.put(&bytes[run_start..])?;
    out.put(b"\"")
}

/// The letter after the backslash for bytes with a two-character escape.
fn short_escape(b: u8) -> Option<u8> {
    match b {
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        0x08 => Some(b'b'),
        0x0c => Some(b'f'),
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        b'\t' => Some(b't'),
        _ => None,
    }
}

fn escaped_len(b: u8) -> usize {
    if short_escape(b).is_some() {
        2
    } else if b < 0x20 {
        6
    } else {
        1
    }
}

/// Bounds-checked cursor over the caller's buffer.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl SliceWriter<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        let available = self.buf.len();
        let dst = self
            .buf
            .get_mut(self.pos..end)
            .ok_or(JsonError::BufferTooSmall {
                needed: end,
                available,
            })?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

/// Decimal text of a number, formatted on the stack so `size` and `dump`
/// see identical bytes.
struct NumberText {
    buf: [u8; 32],
    len: usize,
}

impl NumberText {
    fn integer(n: i64) -> Self {
        let mut text = Self::empty();
        let _ = write!(text, "{n}");
        text
    }

    /// `None` for NaN and infinities, which JSON cannot express.
    fn real(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        // `Debug` prints the shortest round-trip form and keeps a `.0` or an
        // exponent on integral values.
        let mut text = Self::empty();
        let _ = write!(text, "{n:?}");
        Some(text)
    }

    fn empty() -> Self {
        Self {
            buf: [0; 32],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for NumberText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        let dst = self.buf.get_mut(self.len..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
