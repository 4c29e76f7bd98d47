// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Traversal policies over a [`crate::Histogram`]'s populated cells. Every
//! policy yields the same [`ValueRecord`] shape and walks the physical cell
//! array in ascending index order; they differ only in which indices get a
//! row and how `value` is reported at each one.
//!
//! Per the tie-break rule in [`crate::layout::Layout`], the value reported
//! for a cell is always its *highest* equivalent value.

use crate::histogram::Histogram;

/// One row of a traversal: the value reached, the count at exactly that
/// cell, the running totals up to and including it, and the percentile of
/// samples at or below it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRecord {
    pub value: u64,
    pub count_at_value: u64,
    pub count_to_value: u64,
    pub total_value_to_value: u128,
    pub percentile: f64,
}

/// One step per cell in the backing array, including empty ones.
pub struct AllValues<'a> {
    histogram: &'a Histogram,
    index: usize,
    cumulative_count: u64,
    cumulative_value: u128,
}

impl<'a> AllValues<'a> {
    fn new(histogram: &'a Histogram) -> Self {
        Self {
            histogram,
            index: 0,
            cumulative_count: 0,
            cumulative_value: 0,
        }
    }
}

impl<'a> Iterator for AllValues<'a> {
    type Item = ValueRecord;

    fn next(&mut self) -> Option<ValueRecord> {
        let layout = self.histogram.layout();
        let counts = self.histogram.counts();
        if self.index >= counts.len() {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let count = counts.get(index);
        let value = layout.highest_equivalent_value(layout.value_from_index(index));
        self.cumulative_count += count;
        self.cumulative_value += value as u128 * count as u128;
        let total = self.histogram.total_count();
        let percentile = if total == 0 {
            0.0
        } else {
            100.0 * self.cumulative_count as f64 / total as f64
        };
        Some(ValueRecord {
            value,
            count_at_value: count,
            count_to_value: self.cumulative_count,
            total_value_to_value: self.cumulative_value,
            percentile,
        })
    }
}

/// Like [`AllValues`], skipping cells with a zero count.
pub struct RecordedValues<'a>(AllValues<'a>);

impl<'a> RecordedValues<'a> {
    fn new(histogram: &'a Histogram) -> Self {
        Self(AllValues::new(histogram))
    }
}

impl<'a> Iterator for RecordedValues<'a> {
    type Item = ValueRecord;

    fn next(&mut self) -> Option<ValueRecord> {
        for record in self.0.by_ref() {
            if record.count_at_value > 0 {
                return Some(record);
            }
        }
        None
    }
}

/// Advances the reported value by a fixed `step_size`, accumulating the
/// cells that fall within each step before emitting it. Stops once every
/// cell in the backing array has been consumed.
pub struct Linear<'a> {
    histogram: &'a Histogram,
    index: usize,
    step_size: u64,
    next_boundary: u64,
    cumulative_count: u64,
    cumulative_value: u128,
}

impl<'a> Linear<'a> {
    fn new(histogram: &'a Histogram, step_size: u64) -> Self {
        let step_size = step_size.max(1);
        Self {
            histogram,
            index: 0,
            step_size,
            next_boundary: step_size,
            cumulative_count: 0,
            cumulative_value: 0,
        }
    }
}

impl<'a> Iterator for Linear<'a> {
    type Item = ValueRecord;

    fn next(&mut self) -> Option<ValueRecord> {
        let layout = self.histogram.layout();
        let counts = self.histogram.counts();
        if self.index >= counts.len() {
            return None;
        }
        let mut count_this_step = 0u64;
        while self.index < counts.len() {
            let cell_value = layout.highest_equivalent_value(layout.value_from_index(self.index));
            if cell_value > self.next_boundary {
                break;
            }
            let count = counts.get(self.index);
            count_this_step += count;
            self.cumulative_count += count;
            self.cumulative_value += cell_value as u128 * count as u128;
            self.index += 1;
        }
        let total = self.histogram.total_count();
        let percentile = if total == 0 {
            0.0
        } else {
            100.0 * self.cumulative_count as f64 / total as f64
        };
        let record = ValueRecord {
            value: self.next_boundary,
            count_at_value: count_this_step,
            count_to_value: self.cumulative_count,
            total_value_to_value: self.cumulative_value,
            percentile,
        };
        self.next_boundary = self.next_boundary.saturating_add(self.step_size);
        Some(record)
    }
}

/// Like [`Linear`], but the reported value threshold multiplies by `factor`
/// each step instead of advancing by a fixed amount.
pub struct Logarithmic<'a> {
    histogram: &'a Histogram,
    index: usize,
    factor: f64,
    next_boundary: f64,
    cumulative_count: u64,
    cumulative_value: u128,
}

impl<'a> Logarithmic<'a> {
    fn new(histogram: &'a Histogram, first_step: u64, factor: f64) -> Self {
        Self {
            histogram,
            index: 0,
            factor: factor.max(1.000001),
            next_boundary: first_step.max(1) as f64,
            cumulative_count: 0,
            cumulative_value: 0,
        }
    }
}

impl<'a> Iterator for Logarithmic<'a> {
    type Item = ValueRecord;

    fn next(&mut self) -> Option<ValueRecord> {
        let layout = self.histogram.layout();
        let counts = self.histogram.counts();
        if self.index >= counts.len() {
            return None;
        }
        let boundary = self.next_boundary.floor() as u64;
        let mut count_this_step = 0u64;
        while self.index < counts.len() {
            let cell_value = layout.highest_equivalent_value(layout.value_from_index(self.index));
            if cell_value > boundary {
                break;
            }
            let count = counts.get(self.index);
            count_this_step += count;
            self.cumulative_count += count;
            self.cumulative_value += cell_value as u128 * count as u128;
            self.index += 1;
        }
        let total = self.histogram.total_count();
        let percentile = if total == 0 {
            0.0
        } else {
            100.0 * self.cumulative_count as f64 / total as f64
        };
        let record = ValueRecord {
            value: boundary,
            count_at_value: count_this_step,
            count_to_value: self.cumulative_count,
            total_value_to_value: self.cumulative_value,
            percentile,
        };
        self.next_boundary *= self.factor;
        Some(record)
    }
}

/// The smallest `k` such that `2^k >= n`, as an `f64` exponent.
fn next_target_percentile(percentile: f64, ticks_per_half_distance: u32) -> f64 {
    if percentile >= 100.0 {
        return 100.0;
    }
    let remaining = 100.0 - percentile;
    let ratio = f64::from(ticks_per_half_distance) / remaining;
    let exponent = ratio.log2().ceil();
    (percentile + remaining / 2f64.powf(exponent)).min(100.0)
}

/// Advances through percentiles, geometrically dense as `p` approaches 100.
/// Each step reports the cell whose cumulative count first reaches the
/// target percentile of `total_count`.
pub struct PercentileIter {
    cells: Vec<ValueRecord>,
    next_index: usize,
    target_percentile: f64,
    ticks_per_half_distance: u32,
    finished: bool,
}

impl PercentileIter {
    fn new(histogram: &Histogram, ticks_per_half_distance: u32) -> Self {
        let cells: Vec<ValueRecord> = RecordedValues::new(histogram).collect();
        Self {
            cells,
            next_index: 0,
            target_percentile: 0.0,
            ticks_per_half_distance: ticks_per_half_distance.max(1),
            finished: false,
        }
    }
}

impl Iterator for PercentileIter {
    type Item = ValueRecord;

    fn next(&mut self) -> Option<ValueRecord> {
        if self.finished || self.cells.is_empty() {
            return None;
        }
        if self.target_percentile >= 100.0 {
            self.finished = true;
            let mut last = *self.cells.last().unwrap();
            last.percentile = 100.0;
            return Some(last);
        }
        let total = self.cells.last().unwrap().count_to_value;
        let needed = (((self.target_percentile / 100.0) * total as f64).ceil() as u64).max(1);
        while self.next_index < self.cells.len() - 1 && self.cells[self.next_index].count_to_value < needed {
            self.next_index += 1;
        }
        let mut record = self.cells[self.next_index];
        record.percentile = self.target_percentile;
        self.target_percentile = next_target_percentile(self.target_percentile, self.ticks_per_half_distance);
        Some(record)
    }
}

/// Restricts any [`ValueRecord`] iterator to rows whose value falls in
/// `[low, high]`.
pub fn range<I: Iterator<Item = ValueRecord>>(iter: I, low: u64, high: u64) -> impl Iterator<Item = ValueRecord> {
    iter.filter(move |record| record.value >= low && record.value <= high)
}

impl Histogram {
    /// One row per cell in the backing array, including empty ones.
    pub fn iter_all(&self) -> AllValues<'_> {
        AllValues::new(self)
    }

    /// One row per non-empty cell.
    pub fn iter_recorded(&self) -> RecordedValues<'_> {
        RecordedValues::new(self)
    }

    /// One row per `step_size`-wide value band.
    pub fn iter_linear(&self, step_size: u64) -> Linear<'_> {
        Linear::new(self, step_size)
    }

    /// One row per value band whose width multiplies by `factor` starting
    /// from `first_step`.
    pub fn iter_logarithmic(&self, first_step: u64, factor: f64) -> Logarithmic<'_> {
        Logarithmic::new(self, first_step, factor)
    }

    /// One row per percentile tick, geometrically dense near the 100th.
    pub fn iter_percentiles(&self, ticks_per_half_distance: u32) -> PercentileIter {
        PercentileIter::new(self, ticks_per_half_distance)
    }
}
