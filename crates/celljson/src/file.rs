//! Persistence adapter: documents to and from files and byte streams.
//!
//! This is the only module in the library that performs I/O. It reads the
//! whole input into memory before parsing and serializes into an exactly
//! sized buffer before writing, so the codec itself never touches a file.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::parser::{parse_with, ParseOptions};
use crate::serializer::to_vec;
use crate::value::Value;

/// Read and parse the document at `path` with default options.
///
/// # Errors
///
/// [`JsonError::Io`](crate::JsonError::Io) if the file cannot be read, or any
/// parse error.
pub fn load(path: impl AsRef<Path>) -> Result<Value> {
    load_with(path, ParseOptions::default())
}

/// Read and parse the document at `path`.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with(path: impl AsRef<Path>, options: ParseOptions) -> Result<Value> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read document");
    parse_with(&bytes, options).inspect_err(|e| {
        warn!(path = %path.display(), error = %e, "rejected document");
    })
}

/// Serialize `value` and write it to `path`.
///
/// The bytes go to a uniquely named temporary file in the same directory,
/// which is then renamed over `path`. An interrupted save leaves the previous
/// file intact, and a failed one removes its temporary file.
///
/// # Errors
///
/// [`JsonError::OutOfMemory`](crate::JsonError::OutOfMemory) or
/// [`JsonError::Io`](crate::JsonError::Io).
pub fn save(path: impl AsRef<Path>, value: &Value) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_vec(value)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}

/// Read `reader` to the end and parse what it produced.
///
/// # Errors
///
/// [`JsonError::Io`](crate::JsonError::Io) or any parse error.
pub fn from_reader(mut reader: impl Read, options: ParseOptions) -> Result<Value> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    debug!(bytes = bytes.len(), "read document from stream");
    parse_with(&bytes, options)
}

/// Serialize `value` into `writer`, returning the number of bytes written.
///
/// # Errors
///
/// [`JsonError::OutOfMemory`](crate::JsonError::OutOfMemory) or
/// [`JsonError::Io`](crate::JsonError::Io).
pub fn to_writer(mut writer: impl Write, value: &Value) -> Result<usize> {
    let bytes = to_vec(value)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}
