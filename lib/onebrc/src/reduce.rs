use crate::aggregate::{Aggregate, AggregateMap};
use crate::api::Merge;
use crate::reconcile::BoundaryRecords;
use crate::worker::PartialResult;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceStrategy {
    /// Left fold on the calling thread.
    Sequential,
    /// Pairwise reduction on the rayon pool.
    Tree,
}

/// All statistics of a run, keyed by raw key bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalResult {
    aggregates: AggregateMap,
}

impl GlobalResult {
    pub fn new(aggregates: AggregateMap) -> Self { Self { aggregates } }
    pub fn get(&self, key: &[u8]) -> Option<&Aggregate> { self.aggregates.get(key) }
    pub fn len(&self) -> usize { self.aggregates.len() }
    pub fn is_empty(&self) -> bool { self.aggregates.is_empty() }
    pub fn records(&self) -> u64 { self.aggregates.records() }

    /// Entries in ascending byte order of their keys.
    pub fn sorted(&self) -> Vec<(&[u8], &Aggregate)> { self.aggregates.sorted() }
}

pub fn fold_sequential<T, I>(items: I) -> T
where
    T: Merge + Default,
    I: IntoIterator<Item = T>,
{
    items.into_iter().fold(T::default(), |acc, item| acc.merged(item))
}

pub fn tree_reduce<T>(items: Vec<T>) -> T
where
    T: Merge + Default + Send,
{
    items.into_par_iter().reduce(T::default, |a, b| a.merged(b))
}

/// Combines every worker map with the reconciled boundary records into one result.
pub fn merge_all(partials: Vec<PartialResult>, boundary: BoundaryRecords, strategy: ReduceStrategy) -> GlobalResult {
    let maps: Vec<AggregateMap> = partials
        .into_iter()
        .map(|p| p.aggregates)
        .chain(std::iter::once(boundary.aggregates))
        .collect();
    let merged = match strategy {
        ReduceStrategy::Sequential => fold_sequential(maps),
        ReduceStrategy::Tree => tree_reduce(maps),
    };
    GlobalResult::new(merged)
}
