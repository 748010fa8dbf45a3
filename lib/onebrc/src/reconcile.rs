use crate::aggregate::AggregateMap;
use crate::config::MalformedPolicy;
use crate::constants::LINE_TERMINATOR;
use crate::error::{CalcError, Result};
use crate::worker::{fold_line, PartialResult};
use memchr::memchr;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BoundaryStats {
    pub boundaries: u64,
    pub records: u64,
    pub skipped: u64,
    pub wall_ms: u64,
}

/// Records recovered from range edges, ready to be merged with the worker maps.
#[derive(Clone, Debug, Default)]
pub struct BoundaryRecords {
    pub aggregates: AggregateMap,
    pub stats: BoundaryStats,
}

/// Line being stitched together from fragments, with where it starts in the file.
struct Carry {
    bytes: Vec<u8>,
    range_index: usize,
    offset: usize,
}

impl Carry {
    fn start_if_empty(&mut self, range_index: usize, offset: usize) {
        if self.bytes.is_empty() {
            self.range_index = range_index;
            self.offset = offset;
        }
    }
}

/// Joins the trailing fragment of every range with the leading fragment of the next and parses
/// the result. Ranges without a terminator are carried through whole, so a record spanning any
/// number of ranges is still counted once. `partials` must be in range order.
pub fn reconcile(partials: &[PartialResult], policy: MalformedPolicy) -> Result<BoundaryRecords> {
    let started = Instant::now();
    let mut out = BoundaryRecords::default();
    let mut carry = Carry { bytes: Vec::with_capacity(256), range_index: 0, offset: 0 };

    for (position, part) in partials.iter().enumerate() {
        let range = part.range;
        if range.index != position {
            return Err(CalcError::boundary(range.index, format!("partial result arrived at position {}", position)));
        }
        if range.is_first() {
            if !part.leading_fragment.is_empty() {
                return Err(CalcError::boundary(0, "first range produced a leading fragment"));
            }
        } else if !part.terminated {
            if !part.leading_fragment.is_empty() {
                return Err(CalcError::boundary(range.index, "unterminated range produced a leading fragment"));
            }
            carry.start_if_empty(range.index, range.start);
            carry.bytes.extend_from_slice(&part.trailing_fragment);
            continue;
        } else {
            carry.start_if_empty(range.index, range.start);
            carry.bytes.extend_from_slice(&part.leading_fragment);
            if memchr(LINE_TERMINATOR, &carry.bytes).is_some() {
                return Err(CalcError::boundary(range.index, "joined fragments span more than one line"));
            }
            out.stats.boundaries += 1;
            fold_boundary(&mut out, &carry, policy)?;
        }

        carry.bytes.clear();
        carry.bytes.extend_from_slice(&part.trailing_fragment);
        carry.range_index = range.index;
        carry.offset = range.end - part.trailing_fragment.len();
    }

    // last line of a file without a final terminator
    if !carry.bytes.iter().all(u8::is_ascii_whitespace) {
        fold_boundary(&mut out, &carry, policy)?;
    }

    out.stats.wall_ms = started.elapsed().as_millis() as u64;
    debug!(boundaries = out.stats.boundaries, records = out.stats.records, skipped = out.stats.skipped, "fragments reconciled");
    Ok(out)
}

fn fold_boundary(out: &mut BoundaryRecords, carry: &Carry, policy: MalformedPolicy) -> Result<()> {
    if fold_line(&mut out.aggregates, &carry.bytes, carry.range_index, carry.offset, policy)? {
        out.stats.records += 1;
    } else {
        out.stats.skipped += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::planner::plan_from_cuts;
    use crate::worker::scan_range;
    use std::sync::atomic::AtomicBool;

    fn scan_all(input: &[u8], cuts: &[usize]) -> Vec<PartialResult> {
        let abort = AtomicBool::new(false);
        plan_from_cuts(input.len(), cuts)
            .unwrap()
            .into_iter()
            .map(|r| scan_range(input, r, MalformedPolicy::Fail, &abort).unwrap())
            .collect()
    }

    fn count_of(partials: &[PartialResult], boundary: &BoundaryRecords, key: &[u8]) -> u64 {
        let interior: u64 = partials.iter().filter_map(|p| p.aggregates.get(key)).map(|a| a.count).sum();
        interior + boundary.aggregates.get(key).map(|a| a.count).unwrap_or(0)
    }

    #[test]
    fn boundary_record_counted_once_wherever_the_cut_falls() {
        let input = b"A;1.0\nBoundary;2.5\nC;3.0\n";
        // terminator of the "Boundary" line sits at offset 18
        for cut in [17, 18, 19] {
            let partials = scan_all(input, &[cut]);
            let boundary = reconcile(&partials, MalformedPolicy::Fail).unwrap();
            let keys: [&[u8]; 3] = [b"A", b"Boundary", b"C"];
            for key in keys {
                assert_eq!(count_of(&partials, &boundary, key), 1, "cut {} key {:?}", cut, key);
            }
        }
    }

    #[test]
    fn records_spanning_many_ranges_are_stitched() {
        let input = b"A long station name;-12.3\nB;4.0\n";
        let partials = scan_all(input, &[3, 6, 9, 12, 15, 20, 24]);
        let boundary = reconcile(&partials, MalformedPolicy::Fail).unwrap();
        assert_eq!(boundary.aggregates.get(b"A long station name"), Some(&Aggregate::new(-123)));
        assert_eq!(count_of(&partials, &boundary, b"B"), 1);
    }

    #[test]
    fn final_line_without_terminator_is_counted() {
        let input = b"A;1.0\nB;2.0";
        let cut_sets: [&[usize]; 4] = [&[], &[3], &[6], &[8]];
        for cuts in cut_sets {
            let partials = scan_all(input, cuts);
            let boundary = reconcile(&partials, MalformedPolicy::Fail).unwrap();
            assert_eq!(count_of(&partials, &boundary, b"B"), 1, "cuts {:?}", cuts);
            assert_eq!(count_of(&partials, &boundary, b"A"), 1, "cuts {:?}", cuts);
        }
    }

    #[test]
    fn trailing_whitespace_is_ignored() {
        let input = b"A;1.0\n  ";
        let partials = scan_all(input, &[4]);
        let boundary = reconcile(&partials, MalformedPolicy::Fail).unwrap();
        assert_eq!(boundary.stats.records, 1);
    }

    #[test]
    fn malformed_boundary_line_is_located_where_it_starts() {
        let input = b"A;1.0\nbroken line\nC;3.0\n";
        for cut in [8, 12, 17] {
            let partials = scan_all(input, &[cut]);
            let err = reconcile(&partials, MalformedPolicy::Fail).err().unwrap();
            assert!(matches!(err, CalcError::Parse { range_index: 0, byte_offset: 6, .. }), "cut {}: {:?}", cut, err);
        }
        let partials = scan_all(input, &[8]);
        let skipped = reconcile(&partials, MalformedPolicy::Skip).unwrap();
        assert_eq!(skipped.stats.skipped, 1);
    }

    #[test]
    fn out_of_order_partials_break_the_invariant() {
        let input = b"A;1.0\nB;2.0\n";
        let mut partials = scan_all(input, &[4]);
        partials.swap(0, 1);
        let err = reconcile(&partials, MalformedPolicy::Fail).err().unwrap();
        assert!(matches!(err, CalcError::BoundaryInvariant { .. }));
    }

    #[test]
    fn leading_fragment_on_first_range_breaks_the_invariant() {
        let input = b"A;1.0\nB;2.0\n";
        let mut partials = scan_all(input, &[4]);
        partials[0].leading_fragment = b"junk".to_vec();
        let err = reconcile(&partials, MalformedPolicy::Fail).err().unwrap();
        assert!(matches!(err, CalcError::BoundaryInvariant { range_index: 0, .. }));
    }
}
