//! Crate-wide error kinds.
//!
//! Per spec: no exceptions. Hot-path operations return plain enums or
//! `Option`; this type is for the non-hot-path surfaces (startup,
//! synchronizer restarts, reporting) that benefit from a single error type.

use thiserror::Error;

/// Top-level error kind surfaced outside the hot path.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Startup configuration failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A book sequence regressed or a pool was exhausted — an invariant
    /// violation that quarantines the affected entity.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// An order-manager state transition was not legal from the order's
    /// current state.
    #[error("illegal order transition: {0}")]
    IllegalTransition(String),
}
