//! Strategy output: at most one intent per ticker per invocation.

use common::types::{Price, Qty, TickerId, Ts};

/// What a strategy wants the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyAction {
    /// Post or replace a symmetric two-sided quote.
    Quote {
        /// Resting bid price.
        bid_price: Price,
        /// Resting bid size.
        bid_qty: Qty,
        /// Resting ask price.
        ask_price: Price,
        /// Resting ask size.
        ask_qty: Qty,
    },
    /// Send a single aggressive order.
    Order {
        /// `true` to buy (lift the ask), `false` to sell (hit the bid).
        is_buy: bool,
        /// Limit price, inclusive of any slippage allowance.
        price: Price,
        /// Order size.
        qty: Qty,
    },
}

/// One strategy's output for one ticker on one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyIntent {
    /// Instrument this intent applies to.
    pub ticker_id: TickerId,
    /// What to do.
    pub action: StrategyAction,
    /// When the intent was produced.
    pub timestamp_ns: Ts,
}
