// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A non-blocking interval snapshot wrapper: one writer keeps recording into
//! an `active` histogram while a reader periodically pulls a stable,
//! point-in-time copy via a pointer flip.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::histogram::Config;
use crate::{Error, Histogram};

static NEXT_RECORDER_ID: AtomicU64 = AtomicU64::new(1);

/// Owns an active/inactive [`Histogram`] pair constructed with identical
/// parameters. Recording always goes to `active`; [`Recorder::collect`]
/// swaps the two and hands back a stable snapshot of what was active.
///
/// Assumes a single writer and a single reader, serialized externally — the
/// swap itself is the only critical section and must not race a concurrent
/// `record_value` call.
pub struct Recorder {
    id: u64,
    config: Config,
    active: Histogram,
    inactive: Histogram,
}

impl Recorder {
    pub fn new(config: Config) -> Result<Self, Error> {
        let id = NEXT_RECORDER_ID.fetch_add(1, Ordering::Relaxed);
        let mut active = config.clone().build()?;
        let mut inactive = config.clone().build()?;
        active.mark_recorder_id(id);
        inactive.mark_recorder_id(id);
        Ok(Self {
            id,
            config,
            active,
            inactive,
        })
    }

    pub fn record_value(&mut self, value: u64) -> Result<(), Error> {
        self.active.record_value(value)
    }

    pub fn record_value_with_count(&mut self, value: u64, count: u64) -> Result<(), Error> {
        self.active.record_value_with_count(value, count)
    }

    pub fn record_value_with_expected_interval(&mut self, value: u64, expected_interval: u64) -> Result<(), Error> {
        self.active.record_value_with_expected_interval(value, expected_interval)
    }

    /// A read-only view of the histogram currently receiving writes.
    pub fn active(&self) -> &Histogram {
        &self.active
    }

    /// Swaps the active and inactive histograms and returns the now-stable,
    /// just-deactivated one as an interval snapshot, stamped with
    /// `now_ms` as its end timestamp (and the new active's start
    /// timestamp). `recycled`, if given, is reset and reused as the
    /// snapshot's replacement instead of allocating a fresh histogram.
    ///
    /// Fails with [`Error::RecorderMismatch`] if `recycled` was not
    /// previously produced by this `Recorder`.
    pub fn collect(&mut self, now_ms: u64, recycled: Option<Histogram>) -> Result<Histogram, Error> {
        let mut next_active = if let Some(mut histogram) = recycled {
            if histogram.recorder_id() != Some(self.id) {
                return Err(Error::RecorderMismatch);
            }
            histogram.reset();
            histogram
        } else {
            self.fresh_spare()?
        };

        log::trace!("recorder {} flipping active/inactive histograms", self.id);
        std::mem::swap(&mut self.active, &mut next_active);
        let mut snapshot = next_active;
        snapshot.set_end_timestamp_ms(now_ms);
        self.active.set_start_timestamp_ms(now_ms);
        Ok(snapshot)
    }

    fn fresh_spare(&mut self) -> Result<Histogram, Error> {
        let mut histogram = self.config.clone().build()?;
        histogram.mark_recorder_id(self.id);
        Ok(std::mem::replace(&mut self.inactive, histogram))
    }
}
