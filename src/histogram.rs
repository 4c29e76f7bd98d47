// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The central type: a [`Layout`] plus a [`Counts`] store plus the scalar
//! state (`total_count`, `max`, `min_non_zero`, timestamps, `tag`) that
//! together give the record/query/merge/subtract contract.

use crate::counts::{Counts, StorageKind};
use crate::layout::Layout;
use crate::Error;

/// Builder for a [`Histogram`]: method-chained setters consumed by a
/// fallible `build()`.
#[derive(Clone, Debug)]
pub struct Config {
    lowest_discernible_value: u64,
    highest_trackable_value: u64,
    significant_figures: u8,
    auto_resize: bool,
    storage: StorageKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lowest_discernible_value: 1,
            highest_trackable_value: (1u64 << 53) - 1,
            significant_figures: 3,
            auto_resize: false,
            storage: StorageKind::default(),
        }
    }
}

impl Config {
    /// The smallest value distinguishable from zero. Default `1`.
    pub fn lowest_discernible_value(mut self, value: u64) -> Self {
        self.lowest_discernible_value = value;
        self
    }

    /// The largest value the histogram can represent without resizing.
    /// Default `2^53 - 1`.
    pub fn highest_trackable_value(mut self, value: u64) -> Self {
        self.highest_trackable_value = value;
        self
    }

    /// Number of significant decimal digits of precision, `0..=5`. Default
    /// `3`.
    pub fn significant_figures(mut self, value: u8) -> Self {
        self.significant_figures = value;
        self
    }

    /// Whether recording a value above `highest_trackable_value` grows the
    /// histogram instead of failing with [`Error::OutOfRange`]. Default
    /// `false`.
    pub fn auto_resize(mut self, enabled: bool) -> Self {
        self.auto_resize = enabled;
        self
    }

    /// Which concrete counts-array representation to use. Default
    /// [`StorageKind::Dense64`].
    pub fn storage(mut self, kind: StorageKind) -> Self {
        self.storage = kind;
        self
    }

    pub fn build(self) -> Result<Histogram, Error> {
        let layout = Layout::new(
            self.lowest_discernible_value,
            self.highest_trackable_value,
            self.significant_figures,
        )?;
        let counts = Counts::new(self.storage, layout.counts_array_length());
        Ok(Histogram {
            layout,
            counts,
            total_count: 0,
            max_value: 0,
            min_non_zero_value: u64::MAX,
            start_timestamp_ms: 0,
            end_timestamp_ms: 0,
            tag: "no-tag".to_string(),
            auto_resize: self.auto_resize,
            recorder_id: None,
        })
    }
}

/// A bundled snapshot of a histogram's scalar statistics, avoiding repeated
/// O(buckets) walks for callers that want several of them at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub stddev: f64,
    pub total_count: u64,
}

/// A high-dynamic-range histogram: records non-negative integer samples
/// with a caller-specified relative precision, in O(1) per recorded value.
#[derive(Clone, Debug)]
pub struct Histogram {
    layout: Layout,
    counts: Counts,
    total_count: u64,
    max_value: u64,
    min_non_zero_value: u64,
    start_timestamp_ms: u64,
    end_timestamp_ms: u64,
    tag: String,
    auto_resize: bool,
    /// Set by a `Recorder` on the histograms it owns so a recycled snapshot
    /// can be validated as having come from that same recorder. Not part
    /// of the public interface.
    recorder_id: Option<u64>,
}

impl Histogram {
    /// Shorthand for `Histogram::builder().lowest_discernible_value(lowest)
    /// .highest_trackable_value(highest).significant_figures(figures)
    /// .build()`.
    pub fn new(lowest_discernible_value: u64, highest_trackable_value: u64, significant_figures: u8) -> Result<Self, Error> {
        Config::default()
            .lowest_discernible_value(lowest_discernible_value)
            .highest_trackable_value(highest_trackable_value)
            .significant_figures(significant_figures)
            .build()
    }

    pub fn builder() -> Config {
        Config::default()
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn max(&self) -> u64 {
        self.max_value
    }

    /// The smallest non-zero value recorded, or `None` if nothing has been
    /// recorded yet.
    pub fn min_non_zero(&self) -> Option<u64> {
        if self.total_count == 0 {
            None
        } else {
            Some(self.min_non_zero_value)
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn start_timestamp_ms(&self) -> u64 {
        self.start_timestamp_ms
    }

    pub fn end_timestamp_ms(&self) -> u64 {
        self.end_timestamp_ms
    }

    pub fn set_start_timestamp_ms(&mut self, value: u64) {
        self.start_timestamp_ms = value;
    }

    pub fn set_end_timestamp_ms(&mut self, value: u64) {
        self.end_timestamp_ms = value;
    }

    pub fn auto_resize(&self) -> bool {
        self.auto_resize
    }

    pub(crate) fn recorder_id(&self) -> Option<u64> {
        self.recorder_id
    }

    pub(crate) fn mark_recorder_id(&mut self, id: u64) {
        self.recorder_id = Some(id);
    }

    /// Records one occurrence of `value`.
    pub fn record_value(&mut self, value: u64) -> Result<(), Error> {
        self.record_value_with_count(value, 1)
    }

    /// Records `count` occurrences of `value`.
    pub fn record_value_with_count(&mut self, value: u64, count: u64) -> Result<(), Error> {
        let value = self.admit(value)?;
        let index = self.layout.index_of(value);
        self.counts.increment(index, count);
        self.total_count = self.total_count.saturating_add(count);
        if value > self.max_value {
            self.max_value = value;
        }
        if value > 0 && value < self.min_non_zero_value {
            self.min_non_zero_value = value;
        }
        Ok(())
    }

    /// Records `value`, then backfills synthetic samples at
    /// `expected_interval` granularity to correct for coordinated omission:
    /// samples lost because a slow operation masked the ones that should
    /// have followed it at a steady rate.
    pub fn record_value_with_expected_interval(&mut self, value: u64, expected_interval: u64) -> Result<(), Error> {
        self.record_backfilled(value, expected_interval, 1)
    }

    fn record_backfilled(&mut self, value: u64, expected_interval: u64, count: u64) -> Result<(), Error> {
        self.record_value_with_count(value, count)?;
        if expected_interval == 0 || value <= expected_interval {
            return Ok(());
        }
        let mut missing_value = value - expected_interval;
        while missing_value > expected_interval {
            self.record_value_with_count(missing_value, count)?;
            missing_value -= expected_interval;
        }
        Ok(())
    }

    /// Admits `value` into the trackable range, growing the layout first if
    /// `auto_resize` is set and `value` does not currently fit. Returns the
    /// (possibly unchanged) value for the caller to index with.
    fn admit(&mut self, value: u64) -> Result<u64, Error> {
        if value > self.layout.highest_trackable_value() {
            if !self.auto_resize {
                return Err(Error::OutOfRange);
            }
            self.grow_to_cover(value)?;
        }
        Ok(value)
    }

    fn grow_to_cover(&mut self, value: u64) -> Result<(), Error> {
        let new_highest = Layout::round_up_highest_trackable_value(
            self.layout.lowest_discernible_value(),
            self.layout.significant_figures(),
            value,
        );
        if new_highest <= self.layout.highest_trackable_value() {
            return Ok(());
        }
        let new_layout = Layout::new(
            self.layout.lowest_discernible_value(),
            new_highest,
            self.layout.significant_figures(),
        )?;
        log::debug!(
            "histogram auto-resizing: highest_trackable_value {} -> {}",
            self.layout.highest_trackable_value(),
            new_layout.highest_trackable_value()
        );
        self.counts.resize(new_layout.counts_array_length());
        self.layout = new_layout;
        Ok(())
    }

    /// The value at or below which `percentile` percent of recorded samples
    /// fall. `percentile` is clamped to `[0, 100]`. Returns `0` for an empty
    /// histogram.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        if self.total_count == 0 {
            return 0;
        }
        let percentile = percentile.clamp(0.0, 100.0);
        let needed = (((percentile / 100.0) * self.total_count as f64).ceil() as u64).max(1);
        let mut cumulative = 0u64;
        for index in 0..self.counts.len() {
            let count = self.counts.get(index);
            if count == 0 {
                continue;
            }
            cumulative += count;
            if cumulative >= needed {
                return self.layout.highest_equivalent_value(self.layout.value_from_index(index));
            }
        }
        self.layout.highest_equivalent_value(self.max_value)
    }

    /// The number of recorded samples at or below `value`.
    pub fn count_at_or_below(&self, value: u64) -> u64 {
        if self.total_count == 0 {
            return 0;
        }
        let target_index = self.layout.index_of(value.min(self.layout.highest_trackable_value()));
        (0..=target_index).map(|index| self.counts.get(index)).sum()
    }

    /// The fraction (`0.0..=100.0`) of recorded samples at or below `value`.
    pub fn percentile_at_or_below(&self, value: u64) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        100.0 * self.count_at_or_below(value) as f64 / self.total_count as f64
    }

    /// Mean of recorded samples, weighted by cell counts using each cell's
    /// median equivalent value. `0.0` for an empty histogram.
    pub fn mean(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        let mut sum = 0f64;
        for index in 0..self.counts.len() {
            let count = self.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = self.layout.median_equivalent_value(self.layout.value_from_index(index));
            sum += value as f64 * count as f64;
        }
        sum / self.total_count as f64
    }

    /// Standard deviation of recorded samples, weighted the same way as
    /// [`Histogram::mean`]. `0.0` for an empty histogram.
    pub fn stddev(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let mut variance_sum = 0f64;
        for index in 0..self.counts.len() {
            let count = self.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = self.layout.median_equivalent_value(self.layout.value_from_index(index));
            let deviation = value as f64 - mean;
            variance_sum += deviation * deviation * count as f64;
        }
        (variance_sum / self.total_count as f64).sqrt()
    }

    /// `min`/`max`/`mean`/`stddev`/`total_count` in one pass-free call.
    pub fn summary(&self) -> Summary {
        Summary {
            min: self.min_non_zero().unwrap_or(0),
            max: self.max_value,
            mean: self.mean(),
            stddev: self.stddev(),
            total_count: self.total_count,
        }
    }

    /// Merges every recorded value of `other` into `self`. Fails with
    /// [`Error::OutOfRange`] if `other` holds a value outside `self`'s
    /// trackable range and `self.auto_resize()` is false.
    pub fn add(&mut self, other: &Histogram) -> Result<(), Error> {
        for index in 0..other.counts.len() {
            let count = other.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = other.layout.median_equivalent_value(other.layout.value_from_index(index));
            self.record_value_with_count(value, count)?;
        }
        self.start_timestamp_ms = self.start_timestamp_ms.min(other.start_timestamp_ms);
        self.end_timestamp_ms = self.end_timestamp_ms.max(other.end_timestamp_ms);
        Ok(())
    }

    /// Removes every recorded value of `other` from `self`. Fails with
    /// [`Error::SubtractionUnderflow`] if any resulting cell would go
    /// negative, or if `other` holds a value outside `self`'s trackable
    /// range. Validated in full before any cell is mutated.
    pub fn subtract(&mut self, other: &Histogram) -> Result<(), Error> {
        for index in 0..other.counts.len() {
            let count = other.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = other.layout.median_equivalent_value(other.layout.value_from_index(index));
            if value > self.layout.highest_trackable_value() {
                return Err(Error::SubtractionUnderflow);
            }
            let self_index = self.layout.index_of(value);
            if self.counts.get(self_index) < count {
                return Err(Error::SubtractionUnderflow);
            }
        }
        for index in 0..other.counts.len() {
            let count = other.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = other.layout.median_equivalent_value(other.layout.value_from_index(index));
            let self_index = self.layout.index_of(value);
            let remaining = self.counts.get(self_index) - count;
            self.counts.set(self_index, remaining);
            self.total_count -= count;
        }
        Ok(())
    }

    /// Zeros all cells and clears all scalar state.
    pub fn reset(&mut self) {
        self.counts.clear();
        self.total_count = 0;
        self.max_value = 0;
        self.min_non_zero_value = u64::MAX;
        self.start_timestamp_ms = 0;
        self.end_timestamp_ms = 0;
        self.tag = "no-tag".to_string();
    }

    /// Produces a new histogram with the same configuration whose content
    /// equals recording each of `self`'s samples via
    /// [`Histogram::record_value_with_expected_interval`].
    pub fn copy_corrected_for_coordinated_omission(&self, expected_interval: u64) -> Result<Histogram, Error> {
        let mut corrected = Histogram {
            layout: self.layout,
            counts: Counts::new(self.counts.kind(), self.layout.counts_array_length()),
            total_count: 0,
            max_value: 0,
            min_non_zero_value: u64::MAX,
            start_timestamp_ms: self.start_timestamp_ms,
            end_timestamp_ms: self.end_timestamp_ms,
            tag: self.tag.clone(),
            auto_resize: self.auto_resize,
            recorder_id: None,
        };
        for index in 0..self.counts.len() {
            let count = self.counts.get(index);
            if count == 0 {
                continue;
            }
            let value = self.layout.median_equivalent_value(self.layout.value_from_index(index));
            corrected.record_backfilled(value, expected_interval, count)?;
        }
        Ok(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_SAFE_INT: u64 = (1u64 << 53) - 1;

    #[test]
    fn s4_stats() {
        let mut h = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h.record_value(25).unwrap();
        h.record_value(50).unwrap();
        h.record_value(75).unwrap();
        assert_eq!(h.mean(), 50.0);
        assert!(h.stddev() > 20.4124 && h.stddev() < 20.4125);
        assert_eq!(h.value_at_percentile(100.0), 75);
    }

    #[test]
    fn s5_coordinated_omission_single_record() {
        let mut h = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h.record_value_with_expected_interval(207, 100).unwrap();
        assert_eq!(h.total_count(), 2);
        assert_eq!(h.min_non_zero(), Some(107));
        assert_eq!(h.max(), 207);
    }

    #[test]
    fn s5_coordinated_omission_copy() {
        let mut h = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h.record_value(207).unwrap();
        h.record_value(207).unwrap();

        let corrected = h.copy_corrected_for_coordinated_omission(100).unwrap();
        assert_eq!(corrected.total_count(), 4);
        assert_eq!(corrected.min_non_zero(), Some(107));
        assert_eq!(corrected.max(), 207);

        let uncorrected = h.copy_corrected_for_coordinated_omission(1000).unwrap();
        assert_eq!(uncorrected.total_count(), 2);
        assert_eq!(uncorrected.min_non_zero(), Some(207));
        assert_eq!(uncorrected.max(), 207);
    }

    #[test]
    fn s6_add_heterogeneous() {
        let mut h1 = Histogram::new(1, MAX_SAFE_INT, 2).unwrap();
        h1.record_value(42_000).unwrap();
        let mut h2 = Histogram::builder()
            .lowest_discernible_value(1)
            .highest_trackable_value(1024)
            .significant_figures(2)
            .auto_resize(true)
            .build()
            .unwrap();
        h2.record_value(1000).unwrap();

        h1.add(&h2).unwrap();
        assert_eq!(h1.total_count(), 2);
        assert_eq!((h1.mean() / 100.0).floor() as u64, 215);
    }

    #[test]
    fn record_above_range_without_auto_resize_fails() {
        let mut h = Histogram::new(1, 1024, 2).unwrap();
        assert_eq!(h.record_value(100_000), Err(Error::OutOfRange));
    }

    #[test]
    fn record_above_range_with_auto_resize_grows() {
        let mut h = Histogram::builder()
            .lowest_discernible_value(1)
            .highest_trackable_value(1024)
            .significant_figures(2)
            .auto_resize(true)
            .build()
            .unwrap();
        h.record_value(100_000).unwrap();
        assert_eq!(h.total_count(), 1);
        assert_eq!(h.max(), 100_000);
        assert!(h.layout().highest_trackable_value() >= 100_000);
    }

    #[test]
    fn add_then_subtract_restores_distribution() {
        let mut h1 = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h1.record_value(10).unwrap();
        h1.record_value(500).unwrap();
        let before = h1.value_at_percentile(100.0);

        let mut h2 = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h2.record_value(200).unwrap();

        h1.add(&h2).unwrap();
        h1.subtract(&h2).unwrap();
        assert_eq!(h1.total_count(), 2);
        assert_eq!(h1.value_at_percentile(100.0), before);
    }

    #[test]
    fn subtract_underflow_is_rejected() {
        let mut h1 = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h1.record_value(10).unwrap();
        let mut h2 = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h2.record_value(10).unwrap();
        h2.record_value(10).unwrap();
        assert_eq!(h1.subtract(&h2), Err(Error::SubtractionUnderflow));
        // rejected atomically: h1 is untouched
        assert_eq!(h1.total_count(), 1);
    }

    #[test]
    fn reset_clears_all_scalar_state() {
        let mut h = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        h.record_value(42).unwrap();
        h.set_tag("request-latency");
        h.reset();
        assert_eq!(h.total_count(), 0);
        assert_eq!(h.max(), 0);
        assert_eq!(h.min_non_zero(), None);
        assert_eq!(h.tag(), "no-tag");
    }

    #[test]
    fn record_value_with_count_matches_repeated_record_value() {
        let mut bulk = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        bulk.record_value_with_count(777, 5).unwrap();

        let mut repeated = Histogram::new(1, MAX_SAFE_INT, 3).unwrap();
        for _ in 0..5 {
            repeated.record_value(777).unwrap();
        }

        assert_eq!(bulk.total_count(), repeated.total_count());
        assert_eq!(bulk.value_at_percentile(100.0), repeated.value_at_percentile(100.0));
    }
}
