//! Open-addressing hash table keyed by byte strings.
//!
//! Slot index is `strhash(key) % nslots`; collisions probe linearly (+1, wrap).
//! The table grows by doubling (minimum 2 slots) before a new key would push
//! the load to one half, so `len() * 2 < capacity()` holds after every `put`
//! and every probe chain ends at an empty slot.
//!
//! There is no removal. Entries live as long as the table, which keeps probe
//! chains free of tombstones. Iteration walks the slot array, so its order
//! depends on the hashes and the current capacity, not on insertion order.

use crate::utils::strhash;
use std::borrow::Borrow;

/// Value stored by the key dictionary: an owned name or a 32-bit id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableValue {
    Text(Box<[u8]>),
    Int(i32),
}

impl TableValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            TableValue::Int(i) => Some(*i),
            TableValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            TableValue::Text(s) => Some(s),
            TableValue::Int(_) => None,
        }
    }
}

#[inline]
fn bytes_of<K: Borrow<[u8]>>(k: &K) -> &[u8] { k.borrow() }

pub struct HashTable<K = Box<[u8]>, V = TableValue> {
    slots: Vec<Option<(K, V)>>,
    nused: usize,
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self { Self { slots: Vec::new(), nused: 0 } }
}

impl<K: Borrow<[u8]>, V> HashTable<K, V> {
    pub fn new() -> Self { Self::default() }

    /// Occupied slots.
    pub fn len(&self) -> usize { self.nused }
    pub fn is_empty(&self) -> bool { self.nused == 0 }
    /// Total slots.
    pub fn capacity(&self) -> usize { self.slots.len() }

    // Index of the slot holding `key`, or of the empty slot ending its chain.
    fn find(&self, key: &[u8]) -> Option<usize> {
        let nslots = self.slots.len();
        if nslots == 0 { return None; }
        let mut idx = strhash(key) as usize % nslots;
        loop {
            match &self.slots[idx] {
                Some((k, _)) if bytes_of(k) != key => idx = (idx + 1) % nslots,
                _ => return Some(idx),
            }
        }
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let idx = self.find(key)?;
        self.slots[idx].as_ref().map(|(_, v)| v)
    }

    /// Inserts or overwrites. Returns the previous value for an existing key.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(idx) = self.find(bytes_of(&key)) {
            if let Some((_, v)) = self.slots[idx].as_mut() {
                return Some(std::mem::replace(v, value));
            }
        }
        while (self.nused + 1) * 2 >= self.slots.len() {
            self.grow();
        }
        let idx = match self.find(bytes_of(&key)) {
            Some(idx) => idx,
            None => unreachable!("grown table has slots"),
        };
        self.slots[idx] = Some((key, value));
        self.nused += 1;
        None
    }

    fn grow(&mut self) {
        let nslots = if self.slots.is_empty() { 2 } else { self.slots.len() * 2 };
        let old = std::mem::replace(&mut self.slots, Vec::new());
        self.slots.resize_with(nslots, || None);
        for (k, v) in old.into_iter().flatten() {
            // reinsert directly; nused is unchanged and capacity is already sufficient
            let idx = match self.find(bytes_of(&k)) {
                Some(idx) => idx,
                None => unreachable!("grown table has slots"),
            };
            self.slots[idx] = Some((k, v));
        }
    }

    /// Entries in slot order. The shared borrow rules out mutation while iterating.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.slots.iter() }
    }
}

pub struct Iter<'a, K, V> {
    slots: std::slice::Iter<'a, Option<(K, V)>>,
}

impl<'a, K: Borrow<[u8]>, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a [u8], &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        self.slots.by_ref().flatten().next().map(|(k, v)| (bytes_of(k), v))
    }
}

impl<'a, K: Borrow<[u8]>, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
