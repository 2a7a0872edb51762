//! Single-pass streaming statistics
//!
//! Every aggregator here follows the same discipline: feed it one record
//! at a time with `observe`, then read the summary. Memory is bounded by
//! the number of distinct positions seen (for the per-position
//! aggregators) or constant (for [`LengthStats`]) — never by the record
//! count. Re-running the same pass over the same source reproduces the
//! same summary.
//!
//! Per-position results are 0-indexed internally and reported 1-indexed,
//! which is what plotting consumers expect.

use crate::types::SequenceStats;

/// Phred+33 quality encoding offset
const PHRED_OFFSET: u8 = 33;

/// Canonical bases tracked by [`BaseComposition`]
const CANONICAL_BASES: [u8; 4] = *b"ACGT";

/// Running length statistics: count, total, min, max
///
/// # Example
///
/// ```
/// use bioline::stats::LengthStats;
///
/// let mut lengths = LengthStats::default();
/// for len in [4u64, 6, 3] {
///     lengths.observe(len);
/// }
/// let stats = lengths.summary();
/// assert_eq!(stats.record_count, 3);
/// assert_eq!(stats.total_length, 13);
/// assert_eq!(stats.min_length, 3);
/// assert_eq!(stats.max_length, 6);
/// ```
#[derive(Debug, Clone)]
pub struct LengthStats {
    count: u64,
    total: u64,
    min: u64,
    max: u64,
}

impl Default for LengthStats {
    fn default() -> Self {
        Self {
            count: 0,
            total: 0,
            min: u64::MAX,
            max: 0,
        }
    }
}

impl LengthStats {
    /// Record one sequence length
    pub fn observe(&mut self, len: u64) {
        self.count += 1;
        self.total += len;
        self.min = self.min.min(len);
        self.max = self.max.max(len);
    }

    /// Produce the aggregate summary
    ///
    /// An empty pass reports zeros throughout and an average of 0.0 —
    /// never a division fault.
    pub fn summary(&self) -> SequenceStats {
        if self.count == 0 {
            return SequenceStats {
                record_count: 0,
                total_length: 0,
                average_length: 0.0,
                min_length: 0,
                max_length: 0,
            };
        }
        SequenceStats {
            record_count: self.count,
            total_length: self.total,
            average_length: self.total as f64 / self.count as f64,
            min_length: self.min,
            max_length: self.max,
        }
    }
}

/// Per-position quality accumulator (Phred+33)
///
/// Maintains a (quality-sum, observation-count) pair per read position.
/// Storage grows to the longest read observed, independent of how many
/// records pass through.
#[derive(Debug, Clone, Default)]
pub struct QualityProfile {
    sums: Vec<u64>,
    counts: Vec<u64>,
}

impl QualityProfile {
    /// Record the quality string of one read
    ///
    /// Bytes decode as `byte - 33`; bytes below the offset clamp to 0.
    pub fn observe(&mut self, quality: &[u8]) {
        if quality.len() > self.sums.len() {
            self.sums.resize(quality.len(), 0);
            self.counts.resize(quality.len(), 0);
        }
        for (i, &q) in quality.iter().enumerate() {
            self.sums[i] += u64::from(q.saturating_sub(PHRED_OFFSET));
            self.counts[i] += 1;
        }
    }

    /// Mean quality per observed position, ascending, 1-indexed
    ///
    /// Positions never observed are omitted entirely.
    pub fn mean_qualities(&self) -> Vec<(usize, f64)> {
        let mut means = Vec::new();
        for (i, (&sum, &count)) in self.sums.iter().zip(self.counts.iter()).enumerate() {
            if count > 0 {
                means.push((i + 1, sum as f64 / count as f64));
            }
        }
        means
    }

    /// True when no quality bytes have been observed
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

/// Per-position base composition accumulator
///
/// Tracks counts for the canonical bases A, C, G, T (case-insensitive)
/// plus a canonical total per position for normalization. Non-canonical
/// symbols (N, gaps) are not counted at all, matching the convention that
/// composition percentages are relative to called bases.
#[derive(Debug, Clone, Default)]
pub struct BaseComposition {
    counts: [Vec<u64>; 4],
    totals: Vec<u64>,
}

fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

impl BaseComposition {
    /// Record the sequence of one read
    pub fn observe(&mut self, sequence: &[u8]) {
        if sequence.len() > self.totals.len() {
            for counts in &mut self.counts {
                counts.resize(sequence.len(), 0);
            }
            self.totals.resize(sequence.len(), 0);
        }
        for (i, &base) in sequence.iter().enumerate() {
            if let Some(idx) = base_index(base) {
                self.counts[idx][i] += 1;
                self.totals[i] += 1;
            }
        }
    }

    /// Percentage of `base` per observed position, ascending, 1-indexed
    ///
    /// Returns `None` for a non-canonical base argument. Positions with
    /// no canonical observations are omitted; a base absent at an
    /// observed position contributes 0.0.
    pub fn percentages(&self, base: u8) -> Option<Vec<(usize, f64)>> {
        let idx = base_index(base)?;
        let mut percentages = Vec::new();
        for (i, (&count, &total)) in self.counts[idx].iter().zip(self.totals.iter()).enumerate() {
            if total > 0 {
                percentages.push((i + 1, count as f64 / total as f64 * 100.0));
            }
        }
        Some(percentages)
    }

    /// The canonical bases, in reporting order
    pub fn bases() -> [u8; 4] {
        CANONICAL_BASES
    }

    /// True when no canonical bases have been observed
    pub fn is_empty(&self) -> bool {
        self.totals.iter().all(|&t| t == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_stats_summary() {
        let mut lengths = LengthStats::default();
        for len in [4u64, 6, 3] {
            lengths.observe(len);
        }
        let stats = lengths.summary();
        assert_eq!(stats.record_count, 3);
        assert_eq!(stats.total_length, 13);
        assert!((stats.average_length - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.min_length, 3);
        assert_eq!(stats.max_length, 6);
    }

    #[test]
    fn test_length_stats_empty() {
        let stats = LengthStats::default().summary();
        assert_eq!(stats.record_count, 0);
        assert_eq!(stats.total_length, 0);
        assert_eq!(stats.average_length, 0.0);
        assert_eq!(stats.min_length, 0);
        assert_eq!(stats.max_length, 0);
    }

    #[test]
    fn test_quality_profile_phred33() {
        let mut profile = QualityProfile::default();
        // 'I' = 73 -> Q40, '!' = 33 -> Q0
        profile.observe(b"I!");
        profile.observe(b"I");

        let means = profile.mean_qualities();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0], (1, 40.0));
        assert_eq!(means[1], (2, 0.0));
    }

    #[test]
    fn test_quality_profile_ragged_reads() {
        let mut profile = QualityProfile::default();
        profile.observe(b"II");
        profile.observe(b"IIII");

        let means = profile.mean_qualities();
        // Positions 3 and 4 were observed by only one read
        assert_eq!(means.len(), 4);
        assert!(means.iter().all(|&(_, q)| q == 40.0));
    }

    #[test]
    fn test_quality_profile_empty() {
        let profile = QualityProfile::default();
        assert!(profile.is_empty());
        assert!(profile.mean_qualities().is_empty());
    }

    #[test]
    fn test_base_composition_percentages() {
        let mut composition = BaseComposition::default();
        composition.observe(b"AC");
        composition.observe(b"AG");

        let a = composition.percentages(b'A').unwrap();
        assert_eq!(a, vec![(1, 100.0), (2, 0.0)]);

        let c = composition.percentages(b'C').unwrap();
        assert_eq!(c[1], (2, 50.0));
    }

    #[test]
    fn test_base_composition_case_insensitive() {
        let mut composition = BaseComposition::default();
        composition.observe(b"acgt");
        let a = composition.percentages(b'a').unwrap();
        assert_eq!(a[0], (1, 100.0));
    }

    #[test]
    fn test_base_composition_ignores_non_canonical() {
        let mut composition = BaseComposition::default();
        composition.observe(b"NNN");
        // All-N input: no canonical observations, nothing to report
        assert!(composition.is_empty());
        assert!(composition.percentages(b'A').unwrap().is_empty());

        assert!(composition.percentages(b'N').is_none());
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        /// Average length always sits between min and max
        #[test]
        fn test_length_stats_bounds(lengths in proptest::collection::vec(0..10_000u64, 1..50)) {
            let mut stats = LengthStats::default();
            for &len in &lengths {
                stats.observe(len);
            }
            let summary = stats.summary();
            prop_assert!(summary.average_length >= summary.min_length as f64);
            prop_assert!(summary.average_length <= summary.max_length as f64);
            prop_assert_eq!(summary.total_length, lengths.iter().sum::<u64>());
        }

        /// Base percentages sum to 100 at every observed position
        #[test]
        fn test_composition_sums_to_one(seqs in proptest::collection::vec("[ACGT]{1,40}", 1..10)) {
            let mut composition = BaseComposition::default();
            for seq in &seqs {
                composition.observe(seq.as_bytes());
            }

            let per_base: Vec<_> = BaseComposition::bases()
                .iter()
                .map(|&b| composition.percentages(b).unwrap())
                .collect();

            for (pos_idx, &(position, _)) in per_base[0].iter().enumerate() {
                let total: f64 = per_base.iter().map(|v| v[pos_idx].1).sum();
                prop_assert!((total - 100.0).abs() < 1e-6, "position {}: {}", position, total);
            }
        }

        /// Mean quality never exceeds the maximum single observation
        #[test]
        fn test_quality_profile_bounds(quals in proptest::collection::vec("[!-J]{1,30}", 1..10)) {
            let mut profile = QualityProfile::default();
            let mut max_q = 0u64;
            for q in &quals {
                profile.observe(q.as_bytes());
                max_q = max_q.max(q.bytes().map(|b| u64::from(b - 33)).max().unwrap_or(0));
            }

            for (_, mean) in profile.mean_qualities() {
                prop_assert!(mean >= 0.0);
                prop_assert!(mean <= max_q as f64);
            }
        }
    }
}
