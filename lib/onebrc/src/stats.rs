use crate::reconcile::BoundaryStats;
use crate::reduce::ReduceStrategy;
use crate::worker::ScanStats;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Default, Clone, Debug, Serialize)]
pub struct ScanPhaseStats {
    pub ranges: usize,
    pub total_bytes: u64,
    pub total_records: u64,
    pub total_skipped: u64,
    pub unterminated_ranges: usize,
    pub min_range_ms: u64,
    pub max_range_ms: u64,
    pub wall_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReducePhaseStats {
    pub strategy: ReduceStrategy,
    pub maps: usize,
    pub keys: usize,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct RunStats {
    pub input_bytes: u64,
    pub threads: usize,
    pub chunk_bytes: usize,
    pub scan: Option<ScanPhaseStats>,
    pub reconcile: Option<BoundaryStats>,
    pub reduce: Option<ReducePhaseStats>,
    pub total_ms: u64,
}

impl RunStats {
    pub fn new(input_bytes: u64, threads: usize, chunk_bytes: usize) -> Self {
        Self { input_bytes, threads, chunk_bytes, ..Self::default() }
    }

    pub fn record_scan(&mut self, per_range: &[ScanStats], unterminated_ranges: usize, wall_ms: u64) {
        self.scan = Some(ScanPhaseStats {
            ranges: per_range.len(),
            total_bytes: per_range.iter().map(|s| s.bytes).sum(),
            total_records: per_range.iter().map(|s| s.records).sum(),
            total_skipped: per_range.iter().map(|s| s.skipped).sum(),
            unterminated_ranges,
            min_range_ms: per_range.iter().map(|s| s.wall_ms).min().unwrap_or(0),
            max_range_ms: per_range.iter().map(|s| s.wall_ms).max().unwrap_or(0),
            wall_ms,
        });
    }

    pub fn record_reconcile(&mut self, stats: BoundaryStats) { self.reconcile = Some(stats); }

    pub fn record_reduce(&mut self, strategy: ReduceStrategy, maps: usize, keys: usize, wall_ms: u64) {
        self.reduce = Some(ReducePhaseStats { strategy, maps, keys, wall_ms });
    }

    /// Records counted across workers and boundaries.
    pub fn total_records(&self) -> u64 {
        self.scan.as_ref().map(|s| s.total_records).unwrap_or(0) + self.reconcile.as_ref().map(|r| r.records).unwrap_or(0)
    }

    pub fn total_skipped(&self) -> u64 {
        self.scan.as_ref().map(|s| s.total_skipped).unwrap_or(0) + self.reconcile.as_ref().map(|r| r.skipped).unwrap_or(0)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serialize run stats")?;
        std::fs::write(path, json).with_context(|| format!("write stats {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_combine_scan_and_boundaries() {
        let mut stats = RunStats::new(100, 2, 50);
        let per_range = vec![
            ScanStats { range_index: 0, bytes: 50, records: 6, skipped: 1, keys: 3, wall_ms: 4 },
            ScanStats { range_index: 1, bytes: 50, records: 5, skipped: 0, keys: 2, wall_ms: 9 },
        ];
        stats.record_scan(&per_range, 0, 10);
        stats.record_reconcile(BoundaryStats { boundaries: 1, records: 2, skipped: 1, wall_ms: 0 });
        assert_eq!(stats.total_records(), 13);
        assert_eq!(stats.total_skipped(), 2);
        let scan = stats.scan.as_ref().unwrap();
        assert_eq!((scan.min_range_ms, scan.max_range_ms), (4, 9));
    }

    #[test]
    fn writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let mut stats = RunStats::new(0, 1, 1);
        stats.record_reduce(ReduceStrategy::Tree, 3, 7, 1);
        stats.write_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["reduce"]["strategy"], "tree");
        assert_eq!(value["reduce"]["keys"], 7);
        assert!(value["scan"].is_null());
    }
}
