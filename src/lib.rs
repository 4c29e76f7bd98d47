// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! High-dynamic-range histograms: record non-negative integer samples
//! across a wide value range with a caller-specified relative precision,
//! in O(1) per recorded value, with exact quantile queries, merging,
//! subtraction, and coordinated-omission correction.
//!
//! ```
//! use histogram::Histogram;
//!
//! let mut histogram = Histogram::new(1, 1_000_000, 3).unwrap();
//! histogram.record_value(100).unwrap();
//! histogram.record_value(200).unwrap();
//! assert_eq!(histogram.value_at_percentile(100.0), 200);
//! ```

mod bucket;
mod counts;
mod error;
mod histogram;
mod iter;
mod layout;
mod recorder;
mod report;

pub use bucket::Bucket;
pub use counts::StorageKind;
pub use error::Error;
pub use histogram::{Config, Histogram, Summary};
pub use iter::{range, AllValues, Linear, Logarithmic, PercentileIter, RecordedValues, ValueRecord};
pub use layout::Layout;
pub use recorder::Recorder;
pub use report::PercentileReport;
