//! Connection lifecycle contract that a venue-specific I/O thread
//! implements. The socket, framing, and wire parsing for any given venue are
//! deliberately outside this crate's scope — this module fixes the shape
//! every venue connection is driven through, plus the venue-agnostic parts:
//! subscription bookkeeping, backoff, and the circuit breaker.

use common::types::TickerId;
use thiserror::Error;

/// Depth/update-rate requested for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// Best bid/ask only.
    TopOfBook,
    /// Full configured depth, incremental updates.
    FullDepth,
    /// Trade prints only, no book state.
    Trades,
}

/// A pending subscribe/unsubscribe command queued for the I/O thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionCommand {
    /// Subscribe `ticker_id` at the given mode.
    Subscribe(TickerId, SubscriptionMode),
    /// Unsubscribe `ticker_id`, regardless of its current mode.
    Unsubscribe(TickerId),
}

/// Outcome of decoding one wire frame, reported by the venue-specific
/// decoder so the generic parts of the connection (failure counting,
/// reconnect triggering) stay venue-agnostic.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Zero or more normalized updates extracted from the frame.
    Updates(Vec<common::market::MarketUpdate>),
    /// The frame was a control/heartbeat message, not book data.
    Heartbeat,
    /// The frame could not be parsed (malformed length, checksum mismatch,
    /// unknown message type). Counted but not fatal on its own.
    Malformed,
}

/// Error surfaced by lifecycle operations on a venue connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// `start` was called on a connection that is already running.
    #[error("connection already started")]
    AlreadyStarted,
    /// An operation was attempted before `start` or after `stop`.
    #[error("connection not running")]
    NotRunning,
    /// `stop` did not complete within its bounded wait.
    #[error("stop did not complete within the deadline")]
    StopTimedOut,
    /// Too many consecutive frame parse failures; connection should be torn
    /// down and reconnected.
    #[error("exceeded {0} consecutive malformed frames")]
    MalformedFrameLimitExceeded(u32),
}

/// Lifecycle contract every venue connection implements. Per §4.2: `start`
/// spawns the owning I/O thread, `subscribe`/`unsubscribe` enqueue control
/// commands the thread drains, `stop` signals cancellation and blocks for a
/// bounded time. Implementations own the socket and framing; this crate
/// only fixes the shape and drives the venue-agnostic pieces
/// ([`crate::backoff::ReconnectBackoff`], [`crate::circuit_breaker::CircuitBreaker`],
/// and the synchronizers) around it.
pub trait VenueConnection {
    /// Configuration needed to establish the connection (endpoint,
    /// credentials, pinned core, priority).
    type Config;

    /// Spawn the dedicated I/O thread and begin connecting.
    ///
    /// # Errors
    /// Returns [`ConnectionError::AlreadyStarted`] if already running.
    fn start(&mut self, config: Self::Config) -> Result<(), ConnectionError>;

    /// Enqueue a subscribe/unsubscribe command for the I/O thread.
    ///
    /// # Errors
    /// Returns [`ConnectionError::NotRunning`] if `start` has not completed.
    fn enqueue(&mut self, command: SubscriptionCommand) -> Result<(), ConnectionError>;

    /// Signal cancellation and wait for the I/O thread to exit.
    ///
    /// # Errors
    /// Returns [`ConnectionError::StopTimedOut`] if the thread does not exit
    /// within its bounded wait.
    fn stop(&mut self) -> Result<(), ConnectionError>;

    /// Count of updates dropped because the output ring was full.
    fn dropped_count(&self) -> u64;
}

/// Tracks consecutive malformed-frame failures and decides when they cross
/// the threshold that should trigger a reconnect, per §4.2's "consecutive
/// failures above a threshold trigger reconnect".
#[derive(Debug, Clone, Copy)]
pub struct MalformedFrameTracker {
    consecutive: u32,
    threshold: u32,
}

impl MalformedFrameTracker {
    /// Build a tracker that trips after `threshold` consecutive malformed
    /// frames.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self { consecutive: 0, threshold }
    }

    /// Record one frame's outcome. Returns `Err` once the consecutive
    /// malformed count reaches the threshold; any non-malformed outcome
    /// resets the counter.
    ///
    /// # Errors
    /// Returns [`ConnectionError::MalformedFrameLimitExceeded`] once
    /// `threshold` consecutive malformed frames have been observed.
    pub fn record(&mut self, outcome: &FrameOutcome) -> Result<(), ConnectionError> {
        if matches!(outcome, FrameOutcome::Malformed) {
            self.consecutive += 1;
            if self.consecutive >= self.threshold {
                return Err(ConnectionError::MalformedFrameLimitExceeded(self.threshold));
            }
        } else {
            self.consecutive = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resets_on_a_good_frame() {
        let mut tracker = MalformedFrameTracker::new(3);
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
        assert!(tracker.record(&FrameOutcome::Heartbeat).is_ok());
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
    }

    #[test]
    fn trips_at_the_threshold() {
        let mut tracker = MalformedFrameTracker::new(3);
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
        assert!(tracker.record(&FrameOutcome::Malformed).is_ok());
        assert!(tracker.record(&FrameOutcome::Malformed).is_err());
    }
}
