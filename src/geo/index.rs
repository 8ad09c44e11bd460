//! Range-containment index for the IP-to-country geolocation join
//!
//! The join runs in two phases: find the predecessor range by lower
//! bound, then explicitly validate containment against the upper bound.
//! A predecessor match alone is not containment: the table has gaps, and
//! a key falling between ranges would otherwise inherit the country of a
//! range that ended long before it.

use crate::types::ip_range::{IpRange, LookupResult};
use std::thread;
use tracing::{debug, warn};

/// Immutable containment index over a fixed set of IP ranges.
///
/// Built once per run, read-only afterwards, safe to share across worker
/// threads by reference.
///
/// When several ranges contain the same key (the raw table is expected to
/// be disjoint, but overlaps are tolerated), the containing range with the
/// greatest `lower` wins; among ranges with equal `lower`, the one with
/// the greatest `upper` wins. The rule is applied deterministically
/// regardless of input order.
pub struct RangeLookupIndex {
    /// Ranges sorted by (lower, upper, country)
    ranges: Vec<IpRange>,
    /// running_max_upper[i] = max upper of ranges[0..=i]; bounds the
    /// backward candidate walk under overlapping ranges
    running_max_upper: Vec<u32>,
    /// Count of lower > upper ranges observed at build time
    inverted_ranges: u64,
}

impl RangeLookupIndex {
    /// Build the index from an arbitrarily ordered range table.
    ///
    /// Inverted ranges (`lower > upper`) are indexed anyway: they can
    /// never match, so they only matter as a data-quality signal, exposed
    /// via [`inverted_ranges`](Self::inverted_ranges).
    pub fn build(mut ranges: Vec<IpRange>) -> Self {
        let inverted_ranges = ranges.iter().filter(|r| r.is_inverted()).count() as u64;
        if inverted_ranges > 0 {
            warn!(
                count = inverted_ranges,
                "Range table contains inverted bounds (lower > upper); these rows can never match"
            );
        }

        // Full tie-break so any permutation of the input builds the same index
        ranges.sort_unstable_by(|a, b| {
            a.lower
                .cmp(&b.lower)
                .then(a.upper.cmp(&b.upper))
                .then(a.country.cmp(&b.country))
        });

        let mut running_max_upper = Vec::with_capacity(ranges.len());
        let mut max_upper = 0u32;
        for range in &ranges {
            max_upper = max_upper.max(range.upper);
            running_max_upper.push(max_upper);
        }

        debug!(ranges = ranges.len(), "Range lookup index built");

        Self {
            ranges,
            running_max_upper,
            inverted_ranges,
        }
    }

    /// Number of indexed ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Count of inverted (inert) ranges seen at build time.
    pub fn inverted_ranges(&self) -> u64 {
        self.inverted_ranges
    }

    /// Look up the country range containing `key`.
    ///
    /// Phase one finds the predecessor: the last range whose `lower` is at
    /// most `key`. Phase two validates containment, walking earlier
    /// candidates only while the running maximum of `upper` says one could
    /// still reach the key. O(log n) on disjoint tables.
    pub fn lookup(&self, key: u32) -> LookupResult {
        let predecessor_end = self.ranges.partition_point(|r| r.lower <= key);
        self.containment_before(predecessor_end, key)
    }

    /// Look up a batch of keys, one result per key, in input order.
    ///
    /// Keys are re-sorted internally so a single cursor sweeps the range
    /// table in one pass (O(n + m) against the predecessor search), then
    /// every result is written back to its original position. Duplicates
    /// and unsorted input are fine; the output is always aligned 1:1 with
    /// the input sequence.
    pub fn lookup_batch(&self, keys: &[u32]) -> Vec<LookupResult> {
        if keys.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_unstable_by_key(|&i| keys[i]);

        let mut results = vec![LookupResult::Unmatched; keys.len()];
        let mut cursor = 0usize;
        for &i in &order {
            let key = keys[i];
            while cursor < self.ranges.len() && self.ranges[cursor].lower <= key {
                cursor += 1;
            }
            results[i] = self.containment_before(cursor, key);
        }
        results
    }

    /// Parallel variant of [`lookup_batch`](Self::lookup_batch).
    ///
    /// Partitions the key sequence into contiguous chunks and sweeps each
    /// on its own scoped thread against the shared index, concatenating
    /// chunk results so the output order is identical to the sequential
    /// sweep. Falls back to the sequential sweep for `workers <= 1` or
    /// batches below `threshold`.
    pub fn lookup_batch_parallel(
        &self,
        keys: &[u32],
        workers: usize,
        threshold: usize,
    ) -> Vec<LookupResult> {
        if workers <= 1 || keys.len() < threshold.max(2) {
            return self.lookup_batch(keys);
        }

        let chunk_size = keys.len().div_ceil(workers);
        let mut results = Vec::with_capacity(keys.len());
        thread::scope(|scope| {
            let handles: Vec<_> = keys
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.lookup_batch(chunk)))
                .collect();
            for handle in handles {
                results.extend(handle.join().expect("lookup worker panicked"));
            }
        });
        results
    }

    /// Containment check over `ranges[..end]`, where `end` is the number
    /// of ranges with `lower <= key`. Walks backward from the predecessor;
    /// the first containing range found is the tie-break winner (greatest
    /// `lower`, then greatest `upper`).
    fn containment_before(&self, end: usize, key: u32) -> LookupResult {
        let mut i = end;
        while i > 0 {
            i -= 1;
            if self.running_max_upper[i] < key {
                // no range at or before i can reach this key
                break;
            }
            let range = &self.ranges[i];
            if range.upper >= key {
                return LookupResult::Matched(range.country.clone());
            }
        }
        LookupResult::Unmatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(lower: u32, upper: u32, country: &str) -> IpRange {
        IpRange::new(lower, upper, country)
    }

    fn matched(country: &str) -> LookupResult {
        LookupResult::Matched(country.to_string())
    }

    #[test]
    fn test_boundary_inclusive() {
        let index = RangeLookupIndex::build(vec![range(100, 200, "X")]);
        assert_eq!(index.lookup(99), LookupResult::Unmatched);
        assert_eq!(index.lookup(100), matched("X"));
        assert_eq!(index.lookup(200), matched("X"));
        assert_eq!(index.lookup(201), LookupResult::Unmatched);
    }

    #[test]
    fn test_gap_between_ranges_is_unmatched() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A"), range(30, 40, "B")]);
        assert_eq!(index.lookup(25), LookupResult::Unmatched);
        assert_eq!(index.lookup(20), matched("A"));
        assert_eq!(index.lookup(30), matched("B"));
    }

    #[test]
    fn test_key_below_all_ranges() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A")]);
        assert_eq!(index.lookup(0), LookupResult::Unmatched);
        assert_eq!(index.lookup(9), LookupResult::Unmatched);
    }

    #[test]
    fn test_key_above_all_ranges() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A")]);
        assert_eq!(index.lookup(21), LookupResult::Unmatched);
        assert_eq!(index.lookup(u32::MAX), LookupResult::Unmatched);
    }

    #[test]
    fn test_empty_table() {
        let index = RangeLookupIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.lookup(0), LookupResult::Unmatched);
        assert_eq!(index.lookup(12345), LookupResult::Unmatched);
    }

    #[test]
    fn test_overlap_greatest_lower_wins() {
        let index = RangeLookupIndex::build(vec![range(10, 50, "A"), range(20, 30, "B")]);
        // both contain 25; B starts later and wins
        assert_eq!(index.lookup(25), matched("B"));
        // only A reaches past B's upper bound
        assert_eq!(index.lookup(35), matched("A"));
        assert_eq!(index.lookup(15), matched("A"));
    }

    #[test]
    fn test_overlap_equal_lower_widest_wins() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "narrow"), range(10, 40, "wide")]);
        assert_eq!(index.lookup(15), matched("wide"));
        // the narrow range must not shadow keys only the wide one covers
        assert_eq!(index.lookup(30), matched("wide"));
        assert_eq!(index.lookup(41), LookupResult::Unmatched);
    }

    #[test]
    fn test_nested_overlap_needs_backward_walk() {
        // a huge early range enclosing later disjoint ones
        let index = RangeLookupIndex::build(vec![
            range(0, 1000, "outer"),
            range(100, 110, "a"),
            range(200, 210, "b"),
        ]);
        assert_eq!(index.lookup(105), matched("a"));
        // between the inner ranges the outer one still contains the key
        assert_eq!(index.lookup(150), matched("outer"));
        assert_eq!(index.lookup(1001), LookupResult::Unmatched);
    }

    #[test]
    fn test_inverted_range_is_inert_but_counted() {
        let index = RangeLookupIndex::build(vec![range(200, 100, "bad"), range(300, 400, "ok")]);
        assert_eq!(index.inverted_ranges(), 1);
        assert_eq!(index.lookup(150), LookupResult::Unmatched);
        assert_eq!(index.lookup(100), LookupResult::Unmatched);
        assert_eq!(index.lookup(350), matched("ok"));
    }

    #[test]
    fn test_build_is_permutation_invariant() {
        let table = vec![
            range(10, 50, "A"),
            range(20, 30, "B"),
            range(60, 70, "C"),
            range(10, 20, "D"),
            range(200, 100, "bad"),
        ];
        let mut reversed = table.clone();
        reversed.reverse();
        let mut rotated = table.clone();
        rotated.rotate_left(2);

        let a = RangeLookupIndex::build(table);
        let b = RangeLookupIndex::build(reversed);
        let c = RangeLookupIndex::build(rotated);

        for key in [0, 9, 10, 15, 20, 25, 30, 35, 50, 55, 60, 65, 70, 71, 150] {
            assert_eq!(a.lookup(key), b.lookup(key), "key {key}");
            assert_eq!(a.lookup(key), c.lookup(key), "key {key}");
        }
    }

    #[test]
    fn test_batch_preserves_input_order_and_duplicates() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A"), range(30, 40, "B")]);
        let keys = [35, 15, 25, 15, 35, 0];
        let results = index.lookup_batch(&keys);

        assert_eq!(results.len(), keys.len());
        assert_eq!(results[0], matched("B"));
        assert_eq!(results[1], matched("A"));
        assert_eq!(results[2], LookupResult::Unmatched);
        assert_eq!(results[3], matched("A"));
        assert_eq!(results[4], matched("B"));
        assert_eq!(results[5], LookupResult::Unmatched);
    }

    #[test]
    fn test_batch_matches_single_lookup() {
        let index = RangeLookupIndex::build(vec![
            range(0, 1000, "outer"),
            range(100, 110, "a"),
            range(500, 400, "bad"),
            range(2000, 3000, "c"),
        ]);
        let keys: Vec<u32> = (0..3500).step_by(7).collect();
        let batch = index.lookup_batch(&keys);
        for (i, &key) in keys.iter().enumerate() {
            assert_eq!(batch[i], index.lookup(key), "key {key}");
        }
    }

    #[test]
    fn test_batch_empty_keys() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A")]);
        assert!(index.lookup_batch(&[]).is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let index = RangeLookupIndex::build(vec![
            range(10, 50, "A"),
            range(20, 30, "B"),
            range(100, 200, "C"),
        ]);
        let keys: Vec<u32> = (0..997).map(|i| (i * 13) % 250).collect();
        let sequential = index.lookup_batch(&keys);
        let parallel = index.lookup_batch_parallel(&keys, 4, 0);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_falls_back_below_threshold() {
        let index = RangeLookupIndex::build(vec![range(10, 20, "A")]);
        let keys = [15, 25];
        let results = index.lookup_batch_parallel(&keys, 4, 10_000);
        assert_eq!(results, index.lookup_batch(&keys));
    }

    #[test]
    fn test_sentinel_key_unmatched_against_real_table() {
        let index = RangeLookupIndex::build(vec![range(16_777_216, 16_777_471, "AU")]);
        assert_eq!(
            index.lookup(crate::geo::key::SENTINEL_KEY),
            LookupResult::Unmatched
        );
    }
}
