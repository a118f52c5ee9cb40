//! The document model: one [`Value`] per node, containers own their children.
//!
//! Nodes are built with the constructors on [`Value`], grown through
//! [`Array::push`] / [`Object::insert`], and released by `Drop`: dropping a
//! root drops the whole tree exactly once. Insertions move the child into its
//! container; an insertion that fails hands the child back in
//! [`Rejected`] so it is never silently lost.
//!
//! Integers and reals are distinct variants and stay distinct through
//! parse → dump → parse.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::array::Array;
use crate::error::{JsonError, Rejected, Result};
use crate::hashmap::{self, HashMap};

/// Initial slot count for objects created by [`Value::object`] and the parser.
pub const OBJECT_CAPACITY: usize = 8;

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Integer,
    Real,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Real => "real",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON document node.
#[derive(Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Binary-safe string contents (already unescaped).
    String(Vec<u8>),
    Array(Array),
    Object(Object),
}

impl Value {
    pub const fn null() -> Value {
        Value::Null
    }

    pub const fn boolean(b: bool) -> Value {
        Value::Boolean(b)
    }

    pub const fn integer(n: i64) -> Value {
        Value::Integer(n)
    }

    pub const fn real(n: f64) -> Value {
        Value::Real(n)
    }

    /// Create a string node holding a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`] if the copy cannot be allocated.
    pub fn string(bytes: impl AsRef<[u8]>) -> Result<Value> {
        copy_bytes(bytes.as_ref()).map(Value::String)
    }

    /// Create an empty array node.
    pub fn array() -> Value {
        Value::Array(Array::new())
    }

    /// Create an empty object node with [`OBJECT_CAPACITY`] slots.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`] if the slot table cannot be allocated.
    pub fn object() -> Result<Value> {
        Object::with_capacity(OBJECT_CAPACITY).map(Value::Object)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Boolean(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::Real(_) => Kind::Real,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Append `value` to this array node.
    ///
    /// # Errors
    ///
    /// [`JsonError::UnexpectedType`] if `self` is not an array, or
    /// [`JsonError::OutOfMemory`]. Either way `value` is handed back.
    pub fn array_insert(&mut self, value: Value) -> std::result::Result<(), Rejected<Value>> {
        match self {
            Value::Array(items) => items.push(value),
            other => Err(Rejected::new(mismatch(Kind::Array, other), value)),
        }
    }

    /// Insert `value` under `key` in this object node. A value already stored
    /// under `key` is dropped; use [`Object::insert`] to get it back instead.
    ///
    /// # Errors
    ///
    /// [`JsonError::UnexpectedType`] if `self` is not an object, or
    /// [`JsonError::OutOfMemory`]. Either way `value` is handed back.
    pub fn object_insert(
        &mut self,
        key: impl AsRef<[u8]>,
        value: Value,
    ) -> std::result::Result<(), Rejected<Value>> {
        match self {
            Value::Object(map) => map.insert(key, value).map(drop),
            other => Err(Rejected::new(mismatch(Kind::Object, other), value)),
        }
    }

    /// Deep copy of the whole tree.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`]; whatever was cloned so far is dropped.
    pub fn try_clone(&self) -> Result<Value> {
        Ok(match self {
            Value::Null => Value::Null,
            Value::Boolean(b) => Value::Boolean(*b),
            Value::Integer(n) => Value::Integer(*n),
            Value::Real(n) => Value::Real(*n),
            Value::String(bytes) => Value::String(copy_bytes(bytes)?),
            Value::Array(items) => Value::Array(items.try_clone()?),
            Value::Object(map) => Value::Object(map.try_clone()?),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The payload of an `Integer` node. Reals are not converted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric payload of an `Integer` or `Real` node.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// String contents, if this is a string node holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Member `key` of an object node; `None` for other kinds.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Element `index` of an array node; `None` for other kinds.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    pub fn require_bool(&self) -> Result<bool> {
        self.as_bool().ok_or_else(|| mismatch(Kind::Boolean, self))
    }

    pub fn require_i64(&self) -> Result<i64> {
        self.as_i64().ok_or_else(|| mismatch(Kind::Integer, self))
    }

    /// Like [`Value::as_f64`]: integers are accepted and widened.
    pub fn require_f64(&self) -> Result<f64> {
        self.as_f64().ok_or_else(|| mismatch(Kind::Real, self))
    }

    pub fn require_bytes(&self) -> Result<&[u8]> {
        self.as_bytes().ok_or_else(|| mismatch(Kind::String, self))
    }

    pub fn require_str(&self) -> Result<&str> {
        std::str::from_utf8(self.require_bytes()?).map_err(|_| JsonError::InvalidUtf8)
    }

    pub fn require_array(&self) -> Result<&Array> {
        self.as_array().ok_or_else(|| mismatch(Kind::Array, self))
    }

    pub fn require_object(&self) -> Result<&Object> {
        self.as_object().ok_or_else(|| mismatch(Kind::Object, self))
    }
}

fn mismatch(expected: Kind, found: &Value) -> JsonError {
    JsonError::UnexpectedType {
        expected,
        found: found.kind(),
    }
}

fn copy_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(out)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<Array> for Value {
    fn from(items: Array) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(map)
    }
}

// ============================================================================
// Object
// ============================================================================

/// A JSON object: unique byte-string keys mapped to owned [`Value`]s.
///
/// Iteration order follows the underlying hash table and is unspecified.
#[derive(Debug, Default, PartialEq)]
pub struct Object {
    map: HashMap<Value>,
}

impl Object {
    /// An empty object with the hash map's default slot count.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`] if the slot table cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            map: HashMap::with_capacity(capacity)?,
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
        self.map.get(key.as_ref())
    }

    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut Value> {
        self.map.get_mut(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.map.contains_key(key.as_ref())
    }

    /// Insert or replace; returns the value previously stored under `key`.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`], with `value` handed back.
    pub fn insert(
        &mut self,
        key: impl AsRef<[u8]>,
        value: Value,
    ) -> std::result::Result<Option<Value>, Rejected<Value>> {
        self.map.insert(key.as_ref(), value)
    }

    /// Insert a key known to be absent. See [`HashMap::insert_fast`].
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`], with `value` handed back.
    pub fn insert_fast(
        &mut self,
        key: impl AsRef<[u8]>,
        value: Value,
    ) -> std::result::Result<(), Rejected<Value>> {
        self.map.insert_fast(key.as_ref(), value)
    }

    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<Value> {
        self.map.remove(key.as_ref())
    }

    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`].
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.map.reserve(additional)
    }

    pub fn iter(&self) -> hashmap::Iter<'_, Value> {
        self.map.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.map.values()
    }

    /// Exclusive cursor; see [`hashmap::Cursor`].
    pub fn cursor(&mut self) -> hashmap::Cursor<'_, Value> {
        self.map.cursor()
    }

    /// The backing hash map.
    pub fn as_map(&self) -> &HashMap<Value> {
        &self.map
    }

    pub(crate) fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            map: self.map.try_clone_with(Value::try_clone)?,
        })
    }

    /// Member `key`, or [`JsonError::MissingField`].
    pub fn field(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| JsonError::MissingField(key.to_string()))
    }

    pub fn bool_field(&self, key: &str) -> Result<bool> {
        self.field(key)?.require_bool()
    }

    pub fn i64_field(&self, key: &str) -> Result<i64> {
        self.field(key)?.require_i64()
    }

    pub fn f64_field(&self, key: &str) -> Result<f64> {
        self.field(key)?.require_f64()
    }

    pub fn str_field(&self, key: &str) -> Result<&str> {
        self.field(key)?.require_str()
    }

    pub fn array_field(&self, key: &str) -> Result<&Array> {
        self.field(key)?.require_array()
    }

    pub fn object_field(&self, key: &str) -> Result<&Object> {
        self.field(key)?.require_object()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a [u8], &'a Value);
    type IntoIter = hashmap::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

// ============================================================================
// serde
// ============================================================================

/// Strings and object keys always serialize as strings; invalid UTF-8 is
/// replaced with U+FFFD.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Real(n) => serializer.serialize_f64(*n),
            Value::String(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            out.serialize_entry(&String::from_utf8_lossy(key), value)?;
        }
        out.end()
    }
}
