//! Dense key mapping for categorical ids.

use std::collections::HashMap;
use std::hash::Hash;

/// Key reserved for values never seen during fitting.
pub const UNKNOWN_KEY: u32 = 0;

/// Maps raw ids to dense keys `1..=n` in first-occurrence order.
///
/// The mapping is frozen once built; ids outside the fitted vocabulary encode to
/// [`UNKNOWN_KEY`] instead of failing.
///
/// # Example
///
/// ```
/// use movierec::{KeyEncoder, UNKNOWN_KEY};
///
/// let encoder = KeyEncoder::fit([10u32, 20, 10, 30]);
/// assert_eq!(encoder.encode(&10), 1);
/// assert_eq!(encoder.encode(&30), 3);
/// assert_eq!(encoder.encode(&99), UNKNOWN_KEY);
/// assert_eq!(encoder.n_keys(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct KeyEncoder<K> {
    /// Values in key order; `keys[i]` has key `i + 1`.
    keys: Vec<K>,
    index: HashMap<K, u32>,
}

impl<K: Clone + Eq + Hash> KeyEncoder<K> {
    /// Build the mapping from every id in `values`.
    pub fn fit(values: impl IntoIterator<Item = K>) -> Self {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        for value in values {
            index.entry(value).or_insert_with_key(|v| {
                keys.push(v.clone());
                keys.len() as u32
            });
        }
        Self { keys, index }
    }

    /// Rebuild an encoder from a stored key order.
    ///
    /// Returns `None` if `keys` contains duplicates.
    pub fn from_keys(keys: Vec<K>) -> Option<Self> {
        let mut index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if index.insert(key.clone(), i as u32 + 1).is_some() {
                return None;
            }
        }
        Some(Self { keys, index })
    }

    /// Dense key of `value`, or [`UNKNOWN_KEY`] if it was not seen during fitting.
    #[inline]
    pub fn encode(&self, value: &K) -> u32 {
        self.index.get(value).copied().unwrap_or(UNKNOWN_KEY)
    }

    /// Raw value for a dense key. `None` for [`UNKNOWN_KEY`] and out-of-range keys.
    pub fn decode(&self, key: u32) -> Option<&K> {
        (key as usize).checked_sub(1).and_then(|i| self.keys.get(i))
    }

    /// Values in key order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Number of fitted values (excluding the unknown key).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Size of a table indexed by key, including the unknown slot.
    pub fn n_keys(&self) -> usize {
        self.keys.len() + 1
    }
}

impl<K: PartialEq> PartialEq for KeyEncoder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}
