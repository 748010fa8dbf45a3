use crate::config::RunConfig;
use crate::constants::{DEFAULT_INPUT_PATH, TREE_REDUCE_MIN_MAPS};
use crate::error::{CalcError, Result as CalcResult};
use crate::io::open_input;
use crate::planner::{auto_chunk_bytes, plan_ranges, ByteRange};
use crate::reconcile::reconcile;
use crate::reduce::{merge_all, GlobalResult, ReduceStrategy};
use crate::stats::RunStats;
use crate::worker::{scan_range, PartialResult, ScanStats};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct RunOutcome {
    pub result: GlobalResult,
    pub stats: RunStats,
}

pub struct RuntimePipeline {
    input: Option<PathBuf>,
    config: RunConfig,
}

impl RuntimePipeline {
    pub fn new() -> Self { Self { input: None, config: RunConfig::from_env() } }

    pub fn with_config(config: RunConfig) -> Self { Self { input: None, config } }

    pub fn add_input(&mut self, input_path: impl Into<PathBuf>) { self.input = Some(input_path.into()); }

    /// Maps the input, aggregates it and returns the global result with run statistics.
    pub fn run(&self) -> Result<RunOutcome> {
        let path = self.input.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH));
        let started = Instant::now();
        let raw = open_input(&path).with_context(|| format!("open input {}", path.display()))?;
        info!(path = %path.display(), bytes = raw.len(), mapped = raw.is_mapped(), "input opened");
        // the mapping outlives every worker: it is only dropped after aggregation returns
        let mut outcome = aggregate_bytes(&raw, &self.config).with_context(|| format!("aggregate {}", path.display()))?;
        outcome.stats.total_ms = started.elapsed().as_millis() as u64;
        Ok(outcome)
    }
}

impl Default for RuntimePipeline { fn default() -> Self { Self::new() } }

/// Aggregates an in-memory input, planning ranges from the configured or derived chunk size.
pub fn aggregate_bytes(bytes: &[u8], config: &RunConfig) -> CalcResult<RunOutcome> {
    config.validate()?;
    let threads = config.effective_threads();
    let chunk_bytes = config.chunk_bytes.unwrap_or_else(|| auto_chunk_bytes(bytes.len(), threads));
    let ranges = plan_ranges(bytes.len(), chunk_bytes)?;
    aggregate_ranges(bytes, ranges, config)
}

/// Aggregates `bytes` over an explicit plan. `ranges` must cover the input exactly, in order.
/// The chunk size reported in the stats is the length of the largest range.
pub fn aggregate_ranges(bytes: &[u8], ranges: Vec<ByteRange>, config: &RunConfig) -> CalcResult<RunOutcome> {
    config.validate()?;
    check_plan(&ranges, bytes.len())?;
    let threads = config.effective_threads();
    let chunk_bytes = ranges.iter().map(ByteRange::len).max().unwrap_or(0);
    let run_start = Instant::now();
    let mut stats = RunStats::new(bytes.len() as u64, threads, chunk_bytes);
    info!(bytes = bytes.len(), ranges = ranges.len(), threads, chunk_bytes, policy = ?config.malformed, "starting scan phase");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("onebrc-worker-{}", i))
        .build()
        .map_err(|e| CalcError::Config(format!("worker pool: {}", e)))?;

    // Scan
    let scan_start = Instant::now();
    let partials = pool.install(|| scan_all(bytes, &ranges, config))?;
    let scan_ms = scan_start.elapsed().as_millis() as u64;
    let per_range: Vec<ScanStats> = partials.iter().map(|p| p.stats.clone()).collect();
    let unterminated = partials.iter().filter(|p| !p.terminated).count();
    stats.record_scan(&per_range, unterminated, scan_ms);
    if let Some(scan) = &stats.scan {
        info!(phase = "scan", ranges = scan.ranges, total_records = scan.total_records, total_skipped = scan.total_skipped,
              min_range_ms = scan.min_range_ms, max_range_ms = scan.max_range_ms, wall_ms = scan_ms, "Scan phase complete");
    }

    // Reconcile
    let boundary = reconcile(&partials, config.malformed)?;
    info!(phase = "reconcile", boundaries = boundary.stats.boundaries, records = boundary.stats.records,
          skipped = boundary.stats.skipped, wall_ms = boundary.stats.wall_ms, "Reconcile phase complete");
    stats.record_reconcile(boundary.stats.clone());

    // Reduce
    let reduce_start = Instant::now();
    let maps = partials.len() + 1;
    let strategy = config.reduce.unwrap_or(if maps >= TREE_REDUCE_MIN_MAPS { ReduceStrategy::Tree } else { ReduceStrategy::Sequential });
    let result = pool.install(|| merge_all(partials, boundary, strategy));
    let reduce_ms = reduce_start.elapsed().as_millis() as u64;
    stats.record_reduce(strategy, maps, result.len(), reduce_ms);
    info!(phase = "reduce", strategy = ?strategy, maps, keys = result.len(), wall_ms = reduce_ms, "Reduce phase complete");

    let skipped = stats.total_skipped();
    if skipped > 0 { warn!(skipped, "malformed lines were skipped"); }
    stats.total_ms = run_start.elapsed().as_millis() as u64;
    Ok(RunOutcome { result, stats })
}

fn check_plan(ranges: &[ByteRange], len: usize) -> CalcResult<()> {
    let mut expected = 0usize;
    for (i, r) in ranges.iter().enumerate() {
        if r.index != i || r.start != expected || r.end <= r.start {
            return Err(CalcError::Config(format!("range {} [{}, {}) does not continue the plan at {}", i, r.start, r.end, expected)));
        }
        expected = r.end;
    }
    if expected != len {
        return Err(CalcError::Config(format!("plan covers {} of {} bytes", expected, len)));
    }
    Ok(())
}

/// Runs every range on the current pool and waits for all of them. The first real failure
/// raises the abort flag so the remaining workers stop early.
fn scan_all(bytes: &[u8], ranges: &[ByteRange], config: &RunConfig) -> CalcResult<Vec<PartialResult>> {
    let abort = AtomicBool::new(false);
    let done = AtomicUsize::new(0);
    let total = ranges.len();
    let results: Vec<CalcResult<PartialResult>> = ranges
        .par_iter()
        .map(|&range| {
            if abort.load(Ordering::Relaxed) { return Err(CalcError::Cancelled); }
            let res = scan_range(bytes, range, config.malformed, &abort);
            if res.is_err() {
                abort.store(true, Ordering::SeqCst);
            }
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if total >= 10 && finished * 10 / total != (finished - 1) * 10 / total {
                debug!(finished, total, "scan progress");
            }
            res
        })
        .collect();

    // report the failure of the lowest range that actually failed
    let mut partials = Vec::with_capacity(results.len());
    let mut cancelled = false;
    let mut first_error = None;
    for res in results {
        match res {
            Ok(p) => partials.push(p),
            Err(e) if e.is_cancelled() => cancelled = true,
            Err(e) => { if first_error.is_none() { first_error = Some(e); } }
        }
    }
    if let Some(e) = first_error { return Err(e); }
    if cancelled { return Err(CalcError::Cancelled); }
    Ok(partials)
}
