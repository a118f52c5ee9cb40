//! Chained hash map keyed by raw bytes, the storage behind JSON objects.
//!
//! The slot table always has a power-of-two length, so a key's bucket is
//! `hash & (capacity - 1)`. Each slot holds a chain of entries; an entry owns
//! a copy of its key bytes and remembers the key's 32-bit FNV-1a hash, which
//! is what `resize` uses to redistribute entries without touching key bytes.
//!
//! # Key design decisions
//!
//! - **Binary keys**: keys are `&[u8]` compared by length and bytes. Embedded
//!   NULs and non-UTF-8 bytes are ordinary key content.
//! - **Fallible allocation**: the slot table, key copies, and chain growth go
//!   through `try_reserve*`, so allocation failure surfaces as
//!   [`JsonError::OutOfMemory`] instead of aborting. A failed insert hands the
//!   value back inside [`Rejected`] and leaves the map as it was.
//! - **Growth**: `reserve` doubles the table until it covers the requested
//!   count. Inserting a new key into a full table (`len == capacity`) also
//!   tries to double first; if that fails the entry goes into the existing
//!   chains anyway.
//! - **Traversal and mutation**: [`Iter`] holds a shared borrow, [`Cursor`] an
//!   exclusive one. The cursor's `remove_entry` is the only way to remove
//!   while walking the map; anything else is rejected by the borrow checker.

use std::fmt;
use std::iter::FusedIterator;
use std::mem;

use crate::error::{JsonError, Rejected, Result};

/// Slot count used by [`HashMap::new`].
pub const DEFAULT_CAPACITY: usize = 32;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over raw bytes.
#[inline]
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

struct Entry<V> {
    key: Box<[u8]>,
    hash: u32,
    value: V,
}

type Chain<V> = Vec<Entry<V>>;

/// Byte-key → `V` map with chained buckets.
pub struct HashMap<V> {
    slots: Vec<Chain<V>>,
    len: usize,
}

impl<V> HashMap<V> {
    /// Create a map with [`DEFAULT_CAPACITY`] slots.
    ///
    /// Uses the global allocator's infallible path; use
    /// [`HashMap::with_capacity`] when allocation failure must be reported.
    pub fn new() -> Self {
        Self {
            slots: (0..DEFAULT_CAPACITY).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    /// Create a map with `capacity` slots, rounded up to a power of two.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`] if the slot table cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1).checked_next_power_of_two().ok_or(JsonError::OutOfMemory)?;
        Ok(Self {
            slots: alloc_slots(capacity)?,
            len: 0,
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table (always a power of two).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot_index(&self, hash: u32) -> usize {
        hash as usize & (self.slots.len() - 1)
    }

    /// Locate `key` as `(slot, position in chain)`.
    fn find(&self, key: &[u8], hash: u32) -> Option<(usize, usize)> {
        let slot = self.slot_index(hash);
        self.slots[slot]
            .iter()
            .position(|e| e.hash == hash && *e.key == *key)
            .map(|pos| (slot, pos))
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.get_entry(key).map(|(_, v)| v)
    }

    /// Look up `key`, returning the stored key bytes alongside the value.
    pub fn get_entry(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        let (slot, pos) = self.find(key, fnv1a(key))?;
        let entry = &self.slots[slot][pos];
        Some((&entry.key[..], &entry.value))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let (slot, pos) = self.find(key, fnv1a(key))?;
        Some(&mut self.slots[slot][pos].value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key, fnv1a(key)).is_some()
    }

    /// Insert `value` under `key`, replacing any existing value.
    ///
    /// Returns the previous value when the key was already present, so the
    /// caller decides what happens to it. `len` only grows for new keys.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`] wrapped in [`Rejected`], which returns
    /// `value` untouched. The map is unchanged.
    pub fn insert(&mut self, key: &[u8], value: V) -> std::result::Result<Option<V>, Rejected<V>> {
        let hash = fnv1a(key);
        if let Some((slot, pos)) = self.find(key, hash) {
            return Ok(Some(mem::replace(&mut self.slots[slot][pos].value, value)));
        }
        self.insert_new(key, hash, value).map(|()| None)
    }

    /// Insert a key the caller knows is not in the map yet, skipping the
    /// duplicate scan. Inserting an existing key this way leaves two entries
    /// with the same key; debug builds assert against it.
    ///
    /// # Errors
    ///
    /// Same as [`HashMap::insert`].
    pub fn insert_fast(&mut self, key: &[u8], value: V) -> std::result::Result<(), Rejected<V>> {
        let hash = fnv1a(key);
        debug_assert!(self.find(key, hash).is_none(), "insert_fast on existing key");
        self.insert_new(key, hash, value)
    }

    fn insert_new(&mut self, key: &[u8], hash: u32, value: V) -> std::result::Result<(), Rejected<V>> {
        let stored = match copy_key(key) {
            Ok(stored) => stored,
            Err(e) => return Err(Rejected::new(e, value)),
        };
        if self.len >= self.slots.len() {
            // A failed grow keeps the current table; chains absorb the load.
            let _ = self.resize(self.slots.len() * 2);
        }
        let slot = self.slot_index(hash);
        let chain = &mut self.slots[slot];
        if let Err(e) = chain.try_reserve(1) {
            return Err(Rejected::new(e.into(), value));
        }
        chain.push(Entry {
            key: stored,
            hash,
            value,
        });
        self.len += 1;
        Ok(())
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the owned key bytes and value.
    pub fn remove_entry(&mut self, key: &[u8]) -> Option<(Box<[u8]>, V)> {
        let (slot, pos) = self.find(key, fnv1a(key))?;
        let entry = self.slots[slot].remove(pos);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Make room for `additional` more entries without further growth.
    ///
    /// Doubles the slot table until it has at least `len + additional`
    /// slots. Does nothing when the table is already large enough.
    ///
    /// # Errors
    ///
    /// [`JsonError::OutOfMemory`]; the map keeps its old table.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self.len.checked_add(additional).ok_or(JsonError::OutOfMemory)?;
        let mut capacity = self.slots.len();
        if needed <= capacity {
            return Ok(());
        }
        while capacity < needed {
            capacity = capacity.checked_mul(2).ok_or(JsonError::OutOfMemory)?;
        }
        self.resize(capacity)
    }

    /// Rebuild the slot table with `capacity` slots.
    ///
    /// Every chain in the new table is reserved before any entry moves, so a
    /// failure leaves the map untouched.
    fn resize(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity.is_power_of_two());
        let mask = capacity - 1;

        let mut counts: Vec<usize> = Vec::new();
        counts.try_reserve_exact(capacity)?;
        counts.resize(capacity, 0);
        for entry in self.slots.iter().flatten() {
            counts[entry.hash as usize & mask] += 1;
        }

        let mut slots = alloc_slots(capacity)?;
        for (chain, &count) in slots.iter_mut().zip(&counts) {
            if count > 0 {
                chain.try_reserve_exact(count)?;
            }
        }

        let old = mem::replace(&mut self.slots, slots);
        for entry in old.into_iter().flatten() {
            self.slots[entry.hash as usize & mask].push(entry);
        }
        Ok(())
    }

    /// Remove every entry, keeping the slot table.
    pub fn clear(&mut self) {
        for chain in &mut self.slots {
            chain.clear();
        }
        self.len = 0;
    }

    /// Entries in bucket order, then chain order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            chain: [].iter(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Exclusive cursor that can remove the entry it last yielded.
    pub fn cursor(&mut self) -> Cursor<'_, V> {
        Cursor {
            map: self,
            slot: 0,
            pos: 0,
            last: None,
        }
    }

    /// Deep copy with a fallible value cloner. Keeps the slot count so the
    /// copy iterates in the same order.
    pub(crate) fn try_clone_with<F>(&self, mut clone_value: F) -> Result<Self>
    where
        F: FnMut(&V) -> Result<V>,
    {
        let mut slots = alloc_slots(self.slots.len())?;
        for (dst, src) in slots.iter_mut().zip(&self.slots) {
            dst.try_reserve_exact(src.len())?;
            for entry in src {
                dst.push(Entry {
                    key: copy_key(&entry.key)?,
                    hash: entry.hash,
                    value: clone_value(&entry.value)?,
                });
            }
        }
        Ok(Self {
            slots,
            len: self.len,
        })
    }

    #[cfg(test)]
    fn chain_lengths(&self) -> Vec<usize> {
        self.slots.iter().map(Vec::len).collect()
    }
}

fn alloc_slots<V>(capacity: usize) -> Result<Vec<Chain<V>>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, Vec::new);
    Ok(slots)
}

fn copy_key(key: &[u8]) -> Result<Box<[u8]>> {
    let mut stored = Vec::new();
    stored.try_reserve_exact(key.len())?;
    stored.extend_from_slice(key);
    Ok(stored.into_boxed_slice())
}

impl<V> Default for HashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for HashMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}

/// Two maps are equal when they hold the same keys with equal values,
/// regardless of slot count or iteration order.
impl<V: PartialEq> PartialEq for HashMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<'a, V> IntoIterator for &'a HashMap<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Shared iterator over a [`HashMap`].
pub struct Iter<'a, V> {
    slots: std::slice::Iter<'a, Chain<V>>,
    chain: std::slice::Iter<'a, Entry<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.next() {
                self.remaining -= 1;
                return Some((&entry.key[..], &entry.value));
            }
            self.chain = self.slots.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// Exclusive cursor over a [`HashMap`].
///
/// Walks entries in the same order as [`Iter`]. While the cursor lives the
/// map can only be changed through it: values via the `&mut V` from
/// [`Cursor::next_entry`], removal via [`Cursor::remove_entry`].
pub struct Cursor<'a, V> {
    map: &'a mut HashMap<V>,
    slot: usize,
    pos: usize,
    last: Option<(usize, usize)>,
}

impl<V> Cursor<'_, V> {
    /// Advance to the next entry.
    pub fn next_entry(&mut self) -> Option<(&[u8], &mut V)> {
        while self.slot < self.map.slots.len() {
            if self.pos < self.map.slots[self.slot].len() {
                let (slot, pos) = (self.slot, self.pos);
                self.pos += 1;
                self.last = Some((slot, pos));
                let entry = &mut self.map.slots[slot][pos];
                return Some((&entry.key[..], &mut entry.value));
            }
            self.slot += 1;
            self.pos = 0;
        }
        self.last = None;
        None
    }

    /// Remove the entry most recently returned by `next_entry`.
    ///
    /// Returns `None` if nothing was yielded since the last removal (or at
    /// all). The following `next_entry` continues with the entry after the
    /// removed one.
    pub fn remove_entry(&mut self) -> Option<(Box<[u8]>, V)> {
        let (slot, pos) = self.last.take()?;
        let entry = self.map.slots[slot].remove(pos);
        self.map.len -= 1;
        self.pos = pos;
        Some((entry.key, entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(HashMap::<u8>::with_capacity(0).unwrap().capacity(), 1);
        assert_eq!(HashMap::<u8>::with_capacity(5).unwrap().capacity(), 8);
        assert_eq!(HashMap::<u8>::with_capacity(32).unwrap().capacity(), 32);
        assert_eq!(HashMap::<u8>::new().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn entries_sit_in_the_slot_their_hash_selects() {
        let mut map = HashMap::with_capacity(4).unwrap();
        for i in 0..40u32 {
            map.insert(&i.to_le_bytes(), i).unwrap();
        }
        let mask = map.capacity() - 1;
        for (slot, chain) in map.slots.iter().enumerate() {
            for entry in chain {
                assert_eq!(entry.hash as usize & mask, slot);
                assert_eq!(entry.hash, fnv1a(&entry.key));
            }
        }
        assert_eq!(map.chain_lengths().iter().sum::<usize>(), 40);
    }

    #[test]
    fn full_table_doubles_on_insert() {
        let mut map = HashMap::with_capacity(2).unwrap();
        map.insert(b"a", 1).unwrap();
        map.insert(b"b", 2).unwrap();
        assert_eq!(map.capacity(), 2);
        map.insert(b"c", 3).unwrap();
        assert_eq!(map.capacity(), 4);
    }

    #[test]
    fn replacing_a_key_does_not_grow() {
        let mut map = HashMap::with_capacity(1).unwrap();
        map.insert(b"k", 1).unwrap();
        assert_eq!(map.insert(b"k", 2).unwrap(), Some(1));
        assert_eq!(map.capacity(), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn reserve_is_a_no_op_when_room_exists() {
        let mut map: HashMap<u8> = HashMap::with_capacity(16).unwrap();
        map.reserve(10).unwrap();
        assert_eq!(map.capacity(), 16);
        map.reserve(17).unwrap();
        assert_eq!(map.capacity(), 32);
    }

    #[test]
    fn cursor_remove_resumes_at_following_entry() {
        let mut map = HashMap::with_capacity(1).unwrap();
        for (i, k) in [b"a", b"b", b"c"].iter().enumerate() {
            map.insert_fast(*k, i).unwrap();
        }
        assert_eq!(map.capacity(), 4, "table doubles as entries arrive");

        let mut seen = Vec::new();
        let mut cursor = map.cursor();
        while let Some((k, v)) = cursor.next_entry() {
            seen.push(k.to_vec());
            if *v == 1 {
                let (key, value) = cursor.remove_entry().unwrap();
                assert_eq!(&*key, b"b");
                assert_eq!(value, 1);
                assert!(cursor.remove_entry().is_none());
            }
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(b"b"));
    }
}
