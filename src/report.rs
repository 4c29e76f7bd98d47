// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A formatted percentile distribution over a [`Histogram`]'s recorded
//! values, with plain-text and CSV renderings.

use std::fmt;

use crate::histogram::Histogram;

/// The standard percentile ladder walked by [`PercentileReport`], deduped
/// against a histogram's `total_count` so a sparsely-populated histogram
/// doesn't repeat the same row under several target percentiles.
const LADDER: &[f64] = &[0.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0, 99.9, 99.99, 99.999, 100.0];

struct Row {
    value: u64,
    percentile_fraction: f64,
    total_count: u64,
    is_last: bool,
}

/// A percentile distribution over a [`Histogram`]'s recorded values,
/// rendered either as the standard plain-text table (via [`fmt::Display`])
/// or as CSV (via [`PercentileReport::to_csv`]).
pub struct PercentileReport {
    rows: Vec<Row>,
    mean: f64,
    stddev: f64,
    max: u64,
    total_count: u64,
    bucket_count: u32,
    sub_bucket_count: u64,
    scaling_factor: f64,
}

impl PercentileReport {
    fn new(histogram: &Histogram) -> Self {
        let mut rows = Vec::new();
        let mut last_value = None;
        for &percentile in LADDER {
            let value = histogram.value_at_percentile(percentile);
            let is_last = percentile >= 100.0;
            if last_value == Some(value) && !is_last {
                continue;
            }
            last_value = Some(value);
            rows.push(Row {
                value,
                percentile_fraction: percentile / 100.0,
                total_count: histogram.count_at_or_below(value),
                is_last,
            });
        }
        let summary = histogram.summary();
        Self {
            rows,
            mean: summary.mean,
            stddev: summary.stddev,
            max: summary.max,
            total_count: summary.total_count,
            bucket_count: histogram.layout().bucket_count(),
            sub_bucket_count: histogram.layout().sub_bucket_count(),
            scaling_factor: 1.0,
        }
    }

    /// Divides every reported `Value` column by `factor` before printing.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.scaling_factor = factor;
        self
    }

    /// Renders this report as CSV: quoted header, comma-separated fields,
    /// and `Infinity` in the ratio column for the 100th-percentile row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str("\"Value\",\"Percentile\",\"TotalCount\",\"1/(1-Percentile)\"\n");
        for row in &self.rows {
            let scaled_value = row.value as f64 / self.scaling_factor;
            if row.is_last {
                out.push_str(&format!(
                    "{:.3},{:.12},{},Infinity\n",
                    scaled_value, row.percentile_fraction, row.total_count
                ));
            } else {
                let ratio = 1.0 / (1.0 - row.percentile_fraction);
                out.push_str(&format!(
                    "{:.3},{:.12},{},{:.2}\n",
                    scaled_value, row.percentile_fraction, row.total_count, ratio
                ));
            }
        }
        out
    }
}

impl fmt::Display for PercentileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>14} {:>10} {:>16}",
            "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
        )?;
        writeln!(f)?;
        for row in &self.rows {
            let scaled_value = row.value as f64 / self.scaling_factor;
            if row.is_last {
                writeln!(f, "{:>12.3} {:>14.12} {:>10}", scaled_value, row.percentile_fraction, row.total_count)?;
            } else {
                let ratio = 1.0 / (1.0 - row.percentile_fraction);
                writeln!(
                    f,
                    "{:>12.3} {:>14.12} {:>10} {:>16.2}",
                    scaled_value, row.percentile_fraction, row.total_count, ratio
                )?;
            }
        }
        writeln!(f)?;
        writeln!(
            f,
            "#[Mean = {:.3}, StdDeviation = {:.3}]",
            self.mean / self.scaling_factor,
            self.stddev / self.scaling_factor
        )?;
        writeln!(
            f,
            "#[Max = {:.3}, Total count = {}]",
            self.max as f64 / self.scaling_factor,
            self.total_count
        )?;
        writeln!(f, "#[Buckets = {}, SubBuckets = {}]", self.bucket_count, self.sub_bucket_count)
    }
}

impl Histogram {
    /// Builds a [`PercentileReport`] over the standard percentile ladder
    /// (`0, 25, 50, 75, 90, 95, 99, 99.9, 99.99, 99.999, 100`).
    pub fn percentiles(&self) -> PercentileReport {
        PercentileReport::new(self)
    }
}
