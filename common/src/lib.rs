//! Core types shared by every crate in the trading core.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod market;
pub mod position;
pub mod types;

pub use error::CoreError;
pub use market::{MarketUpdate, Side, UpdateType};
pub use position::Position;
pub use types::{MAX_TICKERS, Price, Qty, TickerId, Ts};
