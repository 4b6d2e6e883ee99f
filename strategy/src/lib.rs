//! Engine-thread strategy cores. Both strategies are invoked after every
//! feature update and emit at most one intent per ticker per invocation.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod capability;
mod intent;
mod kind;
mod liquidity_taker;
mod market_maker;

pub use capability::Strategy;
pub use intent::{StrategyAction, StrategyIntent};
pub use kind::StrategyKind;
pub use liquidity_taker::{LiquidityTaker, LiquidityTakerConfig};
pub use market_maker::{MarketMaker, MarketMakerConfig};
