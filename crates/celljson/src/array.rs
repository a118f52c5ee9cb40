//! Growable, owning sequence of document nodes, the storage behind JSON arrays.
//!
//! Capacity starts at [`MIN_GROWTH`] and doubles whenever a push finds the
//! buffer full. Growth is fallible: a push that cannot allocate returns the
//! value to the caller instead of aborting.

use std::ops::Index;

use crate::error::{Rejected, Result};
use crate::value::Value;

/// Capacity of the first allocation made by `push` on an empty array.
pub const MIN_GROWTH: usize = 4;

/// An ordered sequence of [`Value`]s. Dropping the array drops its elements.
#[derive(Debug, Default, PartialEq)]
pub struct Array {
    items: Vec<Value>,
}

impl Array {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an array with room for exactly `capacity` elements.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`](crate::JsonError::OutOfMemory).
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the array can hold before it grows again.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Append `value`, doubling capacity if the buffer is full.
    ///
    /// # Errors
    ///
    /// On allocation failure the array is unchanged and `value` comes back
    /// inside [`Rejected`].
    pub fn push(&mut self, value: Value) -> std::result::Result<(), Rejected<Value>> {
        if self.items.len() == self.items.capacity() {
            let target = (self.items.capacity() * 2).max(MIN_GROWTH);
            if let Err(e) = self.items.try_reserve_exact(target - self.items.len()) {
                return Err(Rejected::new(e.into(), value));
            }
        }
        self.items.push(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.items.iter_mut()
    }

    /// Deep copy; a failure part-way drops the elements cloned so far.
    pub(crate) fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::with_capacity(self.items.len())?;
        for item in &self.items {
            copy.items.push(item.try_clone()?);
        }
        Ok(copy)
    }
}

impl Index<usize> for Array {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
