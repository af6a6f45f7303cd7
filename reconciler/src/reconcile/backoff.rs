//! Retry hints for runners whose update was deferred.
//!
//! The delay doubles with every doubling of the time spent waiting: 1s for the first couple of
//! seconds, then 2s, 4s, 8s and so on, capped at the configured maximum.

use chrono::{DateTime, Utc};

pub const DEFAULT_MAX_BACKOFF_SECONDS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_seconds: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BACKOFF_SECONDS)
    }
}

impl Backoff {
    pub fn new(max_seconds: u64) -> Self {
        Self { max_seconds: max_seconds.max(1) }
    }

    pub fn max_seconds(&self) -> u64 {
        self.max_seconds
    }

    /// Seconds to wait given the wait started at `started_at` and it is now `now`.
    ///
    /// A `started_at` in the future (clock skew between workers) counts as no time waited.
    pub fn compute(&self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        let waited = Self::elapsed_seconds(started_at, now);
        let slot = Self::slot(waited);
        (1u64 << slot.min(63)).min(self.max_seconds)
    }

    /// Elapsed time rounded up to whole seconds.
    fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        let millis = (now - started_at).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        (millis as u64).div_ceil(1000)
    }

    fn slot(waited: u64) -> u32 {
        if waited < 2 {
            return 0;
        }
        // floor(log2(waited)) - 1
        waited.ilog2() - 1
    }
}
