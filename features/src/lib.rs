//! Derived per-tick market features computed from book state and trade
//! prints: spread, mid, microprice, imbalance, momentum, aggressive trade
//! ratio.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod engine;

pub use engine::{FeatureEngine, Features};
