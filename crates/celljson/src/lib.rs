//! # celljson
//!
//! Owned JSON document trees with a hand-built object map, a depth-bounded
//! parser, and a serializer that measures before it writes.
//!
//! ## Quick start
//!
//! ```rust
//! use celljson::{dump, parse, size, Value};
//!
//! let doc = parse(br#"{"key":"value"}"#).unwrap();
//! assert_eq!(doc.get("key").and_then(Value::as_str), Some("value"));
//!
//! let mut buf = vec![0u8; size(&doc)];
//! let written = dump(&mut buf, &doc).unwrap();
//! assert_eq!(written, buf.len());
//! assert_eq!(buf, br#"{"key":"value"}"#);
//! ```
//!
//! ## Modules
//!
//! - [`value`] — `Value` node enum, `Kind`, and `Object`
//! - [`array`] — `Array`, the growable element store
//! - [`hashmap`] — byte-keyed chained hash map backing `Object`
//! - [`parser`] — bytes → `Value`
//! - [`serializer`] — `size` / `dump` and string escaping
//! - [`file`] — load/save documents from files and streams
//! - [`error`] — `JsonError` and `Rejected`

pub mod array;
pub mod error;
pub mod file;
pub mod hashmap;
pub mod parser;
pub mod serializer;
pub mod value;

pub use array::Array;
pub use error::{JsonError, Rejected, Result};
pub use hashmap::HashMap;
pub use parser::{parse, parse_with, ParseOptions, MAX_DEPTH};
pub use serializer::{dump, size, string_dump, string_size, to_vec};
pub use value::{Kind, Object, Value};
