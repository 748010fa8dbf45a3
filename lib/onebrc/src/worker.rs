use crate::aggregate::AggregateMap;
use crate::config::MalformedPolicy;
use crate::constants::{ABORT_CHECK_INTERVAL, LINE_TERMINATOR};
use crate::error::{CalcError, Result};
use crate::parse::parse_record;
use crate::planner::ByteRange;
use memchr::memchr;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub range_index: usize,
    pub bytes: u64,
    pub records: u64,
    pub skipped: u64,
    pub keys: u64,
    pub wall_ms: u64,
}

/// What one worker hands back: interior aggregates plus the unparsed edges of its range.
#[derive(Clone, Debug)]
pub struct PartialResult {
    pub range: ByteRange,
    pub aggregates: AggregateMap,
    /// Bytes before the first terminator; always empty for the first range.
    pub leading_fragment: Vec<u8>,
    /// Bytes after the last terminator, or the whole range when it has none.
    pub trailing_fragment: Vec<u8>,
    /// Whether the range contains at least one line terminator.
    pub terminated: bool,
    pub stats: ScanStats,
}

/// Folds one complete line into `map`, applying the malformed-line policy.
/// Returns whether the line was counted.
#[inline]
pub(crate) fn fold_line(
    map: &mut AggregateMap,
    line: &[u8],
    range_index: usize,
    line_offset: usize,
    policy: MalformedPolicy,
) -> Result<bool> {
    match parse_record(line) {
        Ok((key, value)) => {
            map.add(key, value);
            Ok(true)
        }
        Err(reason) => match policy {
            MalformedPolicy::Fail => Err(CalcError::parse(range_index, line_offset as u64, reason)),
            MalformedPolicy::Skip => {
                debug!(range_index, byte_offset = line_offset, %reason, "skipping malformed line");
                Ok(false)
            }
        },
    }
}

/// Scans `range` of `bytes`. Interior lines are parsed; the edges are returned as fragments.
pub fn scan_range(bytes: &[u8], range: ByteRange, policy: MalformedPolicy, abort: &AtomicBool) -> Result<PartialResult> {
    let started = Instant::now();
    let chunk = &bytes[range.start..range.end];
    let mut out = PartialResult {
        range,
        aggregates: AggregateMap::new(),
        leading_fragment: Vec::new(),
        trailing_fragment: Vec::new(),
        terminated: false,
        stats: ScanStats { range_index: range.index, bytes: chunk.len() as u64, ..ScanStats::default() },
    };

    let mut pos = 0usize;
    if !range.is_first() {
        match memchr(LINE_TERMINATOR, chunk) {
            Some(nl) => {
                out.leading_fragment = chunk[..nl].to_vec();
                out.terminated = true;
                pos = nl + 1;
            }
            None => {
                // a single record longer than the whole range passes through untouched
                out.trailing_fragment = chunk.to_vec();
                out.stats.wall_ms = started.elapsed().as_millis() as u64;
                return Ok(out);
            }
        }
    }

    let mut map = AggregateMap::new();
    let mut since_check: u64 = 0;
    while let Some(nl) = memchr(LINE_TERMINATOR, &chunk[pos..]) {
        let line = &chunk[pos..pos + nl];
        if fold_line(&mut map, line, range.index, range.start + pos, policy)? {
            out.stats.records += 1;
        } else {
            out.stats.skipped += 1;
        }
        out.terminated = true;
        pos += nl + 1;

        since_check += 1;
        if since_check == ABORT_CHECK_INTERVAL {
            since_check = 0;
            if abort.load(Ordering::Relaxed) { return Err(CalcError::Cancelled); }
        }
    }
    out.trailing_fragment = chunk[pos..].to_vec();
    out.stats.keys = map.len() as u64;
    out.aggregates = map;
    out.stats.wall_ms = started.elapsed().as_millis() as u64;
    debug!(range_index = range.index, start = range.start, end = range.end, records = out.stats.records, keys = out.stats.keys, "range scanned");
    Ok(out)
}
