//! Monotonic nanosecond timestamp source for the hot path.

use common::types::Ts;
use std::time::Instant;

/// Produces monotonically non-decreasing [`Ts`] values anchored to process
/// start. Backed by `Instant` rather than the system clock: the hot path
/// only needs ordering and deltas, never wall-clock correlation, and
/// `Instant` is immune to NTP step adjustments.
pub struct TimestampSource {
    epoch: Instant,
}

impl TimestampSource {
    /// Start a new source anchored to the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Current timestamp relative to this source's epoch.
    #[must_use]
    pub fn now(&self) -> Ts {
        Ts::from_nanos(self.epoch.elapsed().as_nanos() as u64)
    }
}

impl Default for TimestampSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_non_decreasing() {
        let source = TimestampSource::new();
        let first = source.now();
        let second = source.now();
        assert!(second.as_nanos() >= first.as_nanos());
    }
}
