// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use thiserror::Error;

/// Possible errors returned by operations on a [`crate::Histogram`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("value is out of the histogram's trackable range")]
    /// The recorded or merged value exceeds `highest_trackable_value` and the
    /// histogram is not configured to automatically resize.
    OutOfRange,
    #[error("invalid histogram configuration or argument")]
    /// A constructor parameter or percentile argument was invalid, e.g. a
    /// `significant_figures` outside `0..=5`, a `highest_trackable_value`
    /// less than `2 * lowest_discernible_value`, or a percentile outside
    /// `0.0..=100.0`.
    InvalidArgument,
    #[error("subtraction would underflow a bucket's count")]
    /// `subtract` would drive some bucket's count negative, or the operand
    /// histogram contains values outside the receiver's trackable range.
    SubtractionUnderflow,
    #[error("recycled histogram was not produced by this recorder")]
    /// The histogram passed back in to [`crate::Recorder::collect`] was not
    /// originally produced by this [`crate::Recorder`].
    RecorderMismatch,
}
