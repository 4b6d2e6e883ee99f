//! Synchronous pre-trade risk gate: ordered price/size/position/loss/rate
//! checks, backed by a cache-line-isolated token-bucket rate limiter.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod gate;

pub use gate::{RiskGate, RiskLimits, RiskRejection};
