use crate::api::Merge;
use serde::Serialize;
use std::collections::hash_map::{Entry, HashMap};

/// Running statistics for one key. All values are fixed-point tenths; the sum is widened so it
/// stays exact for any number of records a file can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub sum: i128,
    pub count: u64,
    pub min: i64,
    pub max: i64,
}

impl Aggregate {
    pub fn new(value: i64) -> Self { Self { sum: value as i128, count: 1, min: value, max: value } }

    #[inline]
    pub fn add(&mut self, value: i64) {
        self.sum += value as i128;
        self.count += 1;
        if value < self.min { self.min = value; }
        if value > self.max { self.max = value; }
    }
}

impl Merge for Aggregate {
    #[inline]
    fn merge(&mut self, other: Self) {
        self.sum += other.sum;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Per-key aggregates keyed by the raw key bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateMap {
    inner: HashMap<Vec<u8>, Aggregate>,
}

impl AggregateMap {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(capacity: usize) -> Self { Self { inner: HashMap::with_capacity(capacity) } }

    /// Folds one record in; the key is only copied the first time it is seen.
    #[inline]
    pub fn add(&mut self, key: &[u8], value: i64) {
        match self.inner.get_mut(key) {
            Some(agg) => agg.add(value),
            None => { self.inner.insert(key.to_vec(), Aggregate::new(value)); }
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&Aggregate> { self.inner.get(key) }
    pub fn len(&self) -> usize { self.inner.len() }
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
    pub fn records(&self) -> u64 { self.inner.values().map(|a| a.count).sum() }

    /// Entries in ascending byte order of their keys.
    pub fn sorted(&self) -> Vec<(&[u8], &Aggregate)> {
        let mut entries: Vec<(&[u8], &Aggregate)> = self.inner.iter().map(|(k, v)| (k.as_slice(), v)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl Merge for AggregateMap {
    fn merge(&mut self, other: Self) {
        // fold the smaller map into the larger one
        let (mut into, from) = if self.inner.len() >= other.inner.len() {
            (std::mem::take(&mut self.inner), other.inner)
        } else {
            (other.inner, std::mem::take(&mut self.inner))
        };
        for (key, agg) in from {
            match into.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().merge(agg),
                Entry::Vacant(e) => { e.insert(agg); }
            }
        }
        self.inner = into;
    }
}

impl FromIterator<(Vec<u8>, i64)> for AggregateMap {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, i64)>>(iter: I) -> Self {
        let mut map = AggregateMap::new();
        for (key, value) in iter { map.add(&key, value); }
        map
    }
}
