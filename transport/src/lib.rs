//! Venue-agnostic transport plumbing: the connection lifecycle contract,
//! reconnect backoff, a circuit breaker around repeated failures, and the
//! two exchange synchronizer state machines. Per-venue socket I/O and wire
//! framing are not part of this crate; they implement
//! [`connection::VenueConnection`] against a real socket elsewhere.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod backoff;
mod circuit_breaker;
mod connection;
mod synchronizer;

pub use backoff::ReconnectBackoff;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use connection::{
    ConnectionError, FrameOutcome, MalformedFrameTracker, SubscriptionCommand, SubscriptionMode, VenueConnection,
};
pub use synchronizer::{
    DepthSnapshot, IncrementalEvent, IncrementalState, IncrementalSynchronizer, LevelChange, PartialSnapshotFrame,
    PartialSnapshotSynchronizer, PartialState,
};
