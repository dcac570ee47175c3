use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};

/// Occurrence counts keyed by a time bucket.
///
/// Entries keep the order in which their keys were first observed, which is
/// the order used for display and for breaking ties in [`FrequencyTable::peak`].
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    entries: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`, inserting it with a count of 1 if unseen.
    pub fn observe(&mut self, key: K) {
        self.add(key, 1);
    }

    fn add(&mut self, key: K, count: u64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += count,
            None => self.insert_count(key, count),
        }
    }

    fn insert_count(&mut self, key: K, count: u64) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, count));
    }

    /// The key with the highest count. The first such key in iteration order
    /// wins a tie.
    pub fn peak(&self) -> Result<&K> {
        let mut best: Option<&(K, u64)> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key).ok_or(Error::EmptyTable)
    }

    /// Every key sharing the highest count, in iteration order.
    pub fn peaks(&self) -> Vec<&K> {
        let Some(max) = self.entries.iter().map(|(_, count)| *count).max() else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|(_, count)| *count == max)
            .map(|(key, _)| key)
            .collect()
    }

    /// Add every count of `other` into this table. Keys new to this table are
    /// appended in `other`'s order.
    pub fn merge(&mut self, other: FrequencyTable<K>) {
        for (key, count) in other.entries {
            self.add(key, count);
        }
    }

    /// Rewrite every key through `f`, keeping counts and order. Fails on the
    /// first key `f` rejects.
    pub fn try_map_keys<L, F>(self, mut f: F) -> Result<FrequencyTable<L>>
    where
        L: Eq + Hash + Clone,
        F: FnMut(K) -> Result<L>,
    {
        let mut mapped = FrequencyTable::new();
        for (key, count) in self.entries {
            mapped.add(f(key)?, count);
        }
        Ok(mapped)
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.observe(key);
        }
        table
    }
}
