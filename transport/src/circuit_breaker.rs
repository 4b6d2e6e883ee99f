//! Circuit breaker around repeated connection failures, so a flapping feed
//! doesn't burn a reconnect attempt every backoff tick. Same
//! failure-count-plus-timeout shape as the risk side's rate limiter, applied
//! to connection health instead of order throughput.

use common::types::Ts;
use primitives::CacheAligned;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Observable state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Connections are attempted normally.
    Closed,
    /// Connections are refused until the timeout elapses.
    Open,
    /// Timeout elapsed; the next attempt is allowed through as a probe.
    HalfOpen,
}

const STATE_CLOSED: u64 = 0;
const STATE_OPEN: u64 = 1;

/// Trips open after `threshold` consecutive failures, stays open for
/// `timeout_ns`, then allows one probe attempt (half-open) before fully
/// resetting on success or re-opening on failure.
pub struct CircuitBreaker {
    state: CacheAligned<AtomicU64>,
    failure_count: CacheAligned<AtomicU64>,
    opened_at: AtomicU64,
    threshold: u64,
    timeout_ns: u64,
}

impl CircuitBreaker {
    /// Build a circuit breaker tripping after `threshold` failures and
    /// reopening for probes after `timeout_ns` nanoseconds.
    #[must_use]
    pub const fn new(threshold: u64, timeout_ns: u64) -> Self {
        Self {
            state: CacheAligned::new(AtomicU64::new(STATE_CLOSED)),
            failure_count: CacheAligned::new(AtomicU64::new(0)),
            opened_at: AtomicU64::new(0),
            threshold,
            timeout_ns,
        }
    }

    /// Current state as observed at `now`. Transitions `Open` to `HalfOpen`
    /// once the timeout has elapsed, without requiring a separate poll.
    pub fn state(&self, now: Ts) -> CircuitState {
        if self.state.load(Ordering::Relaxed) == STATE_CLOSED {
            return CircuitState::Closed;
        }
        let opened_at = self.opened_at.load(Ordering::Relaxed);
        if now.as_nanos().saturating_sub(opened_at) >= self.timeout_ns {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        }
    }

    /// Whether a connection attempt should proceed at `now`.
    pub fn allow_attempt(&self, now: Ts) -> bool {
        !matches!(self.state(now), CircuitState::Open)
    }

    /// Record a successful connection, resetting to fully closed.
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        self.state.store(STATE_CLOSED, Ordering::Relaxed);
    }

    /// Record a connection failure at `now`. Trips the breaker open once the
    /// threshold is reached, including a failed half-open probe.
    pub fn record_failure(&self, now: Ts) {
        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= self.threshold {
            self.state.store(STATE_OPEN, Ordering::Relaxed);
            self.opened_at.store(now.as_nanos(), Ordering::Relaxed);
            warn!(failures = count, "circuit breaker tripped open");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_below_threshold() {
        let breaker = CircuitBreaker::new(3, 1_000_000_000);
        breaker.record_failure(Ts::from_nanos(1));
        breaker.record_failure(Ts::from_nanos(2));
        assert_eq!(breaker.state(Ts::from_nanos(3)), CircuitState::Closed);
        assert!(breaker.allow_attempt(Ts::from_nanos(3)));
    }

    #[test]
    fn trips_open_at_threshold_and_blocks_attempts() {
        let breaker = CircuitBreaker::new(2, 1_000_000_000);
        breaker.record_failure(Ts::from_nanos(1));
        breaker.record_failure(Ts::from_nanos(2));
        assert_eq!(breaker.state(Ts::from_nanos(2)), CircuitState::Open);
        assert!(!breaker.allow_attempt(Ts::from_nanos(2)));
    }

    #[test]
    fn moves_to_half_open_after_timeout_and_resets_on_success() {
        let breaker = CircuitBreaker::new(1, 1_000_000_000);
        breaker.record_failure(Ts::from_nanos(0));
        assert_eq!(breaker.state(Ts::from_nanos(500_000_000)), CircuitState::Open);
        assert_eq!(breaker.state(Ts::from_nanos(1_000_000_000)), CircuitState::HalfOpen);
        assert!(breaker.allow_attempt(Ts::from_nanos(1_000_000_000)));
        breaker.record_success();
        assert_eq!(breaker.state(Ts::from_nanos(1_000_000_000)), CircuitState::Closed);
    }

    #[test]
    fn failed_probe_reopens_the_breaker() {
        let breaker = CircuitBreaker::new(1, 1_000_000_000);
        breaker.record_failure(Ts::from_nanos(0));
        assert_eq!(breaker.state(Ts::from_nanos(1_000_000_000)), CircuitState::HalfOpen);
        breaker.record_failure(Ts::from_nanos(1_000_000_000));
        assert_eq!(breaker.state(Ts::from_nanos(1_000_000_000)), CircuitState::Open);
    }
}
