use crate::constants::{MAX_AUTO_CHUNK_BYTES, MIN_AUTO_CHUNK_BYTES, RANGES_PER_WORKER};
use crate::error::{CalcError, Result};
use crate::utils::div_ceil;
use serde::Serialize;

/// Half-open byte span `[start, end)` of the input assigned to one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize { self.end - self.start }
    pub fn is_empty(&self) -> bool { self.start == self.end }
    pub fn is_first(&self) -> bool { self.index == 0 }
}

/// Splits `len` bytes into `ceil(len / chunk_bytes)` contiguous ranges.
pub fn plan_ranges(len: usize, chunk_bytes: usize) -> Result<Vec<ByteRange>> {
    if chunk_bytes == 0 { return Err(CalcError::Config("chunk size must be at least one byte".into())); }
    let n = div_ceil(len, chunk_bytes);
    Ok((0..n)
        .map(|index| {
            let start = index * chunk_bytes;
            ByteRange { index, start, end: (start + chunk_bytes).min(len) }
        })
        .collect())
}

/// Chunk size used when none is configured: several ranges per worker, within sane bounds.
pub fn auto_chunk_bytes(len: usize, workers: usize) -> usize {
    let target = div_ceil(len, workers.max(1) * RANGES_PER_WORKER);
    target.clamp(MIN_AUTO_CHUNK_BYTES, MAX_AUTO_CHUNK_BYTES).max(1)
}

/// Builds ranges from explicit cut points. Cuts must be strictly increasing and inside `(0, len)`.
pub fn plan_from_cuts(len: usize, cuts: &[usize]) -> Result<Vec<ByteRange>> {
    if len == 0 {
        if cuts.is_empty() { return Ok(Vec::new()); }
        return Err(CalcError::Config("cut points given for empty input".into()));
    }
    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0usize;
    for &cut in cuts.iter().chain(std::iter::once(&len)) {
        if cut <= start || cut > len {
            return Err(CalcError::Config(format!("cut point {} out of order or outside (0, {})", cut, len)));
        }
        ranges.push(ByteRange { index: ranges.len(), start, end: cut });
        start = cut;
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[ByteRange], len: usize) {
        let mut expected_start = 0;
        for (i, r) in ranges.iter().enumerate() {
            assert_eq!(r.index, i);
            assert_eq!(r.start, expected_start);
            assert!(!r.is_empty());
            expected_start = r.end;
        }
        assert_eq!(expected_start, len);
    }

    #[test]
    fn empty_input_has_no_ranges() {
        assert!(plan_ranges(0, 16).unwrap().is_empty());
        assert!(plan_from_cuts(0, &[]).unwrap().is_empty());
    }

    #[test]
    fn last_range_holds_the_remainder() {
        let ranges = plan_ranges(10, 4).unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].len(), 2);
        assert_covers(&ranges, 10);

        let even = plan_ranges(12, 4).unwrap();
        assert_eq!(even.len(), 3);
        assert_eq!(even[2].len(), 4);
        assert_covers(&even, 12);
    }

    #[test]
    fn single_range_when_chunk_exceeds_len() {
        let ranges = plan_ranges(5, 1024).unwrap();
        assert_eq!(ranges, vec![ByteRange { index: 0, start: 0, end: 5 }]);
    }

    #[test]
    fn zero_chunk_size_is_config_error() {
        assert!(matches!(plan_ranges(10, 0), Err(CalcError::Config(_))));
    }

    #[test]
    fn irregular_cuts_cover_input() {
        let ranges = plan_from_cuts(20, &[1, 2, 9, 19]).unwrap();
        assert_eq!(ranges.len(), 5);
        assert_covers(&ranges, 20);
        assert!(plan_from_cuts(20, &[5, 5]).is_err());
        assert!(plan_from_cuts(20, &[0]).is_err());
        assert!(plan_from_cuts(20, &[20]).is_err());
    }

    #[test]
    fn auto_chunk_is_clamped() {
        assert_eq!(auto_chunk_bytes(0, 8), MIN_AUTO_CHUNK_BYTES);
        assert_eq!(auto_chunk_bytes(usize::MAX / 2, 1), MAX_AUTO_CHUNK_BYTES);
        let len = 512 * 1024 * 1024;
        assert_eq!(auto_chunk_bytes(len, 8), len / 32);
    }
}
