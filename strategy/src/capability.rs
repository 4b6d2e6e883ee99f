//! Shared capability the engine drives both strategy cores through.

use crate::intent::StrategyIntent;
use crate::liquidity_taker::LiquidityTaker;
use crate::market_maker::MarketMaker;
use common::types::{TickerId, Ts};
use features::Features;

/// Common entry point the engine calls after every feature update.
/// `current_inventory` is signed (positive is long); strategies that don't
/// need it simply ignore it.
pub trait Strategy {
    /// Evaluate one ticker's current features and return at most one
    /// intent.
    fn on_features(
        &mut self,
        ticker_id: TickerId,
        features: &Features,
        now: Ts,
        current_inventory: i64,
    ) -> Option<StrategyIntent>;
}

impl Strategy for MarketMaker {
    fn on_features(
        &mut self,
        ticker_id: TickerId,
        features: &Features,
        now: Ts,
        current_inventory: i64,
    ) -> Option<StrategyIntent> {
        Self::on_features(self, ticker_id, features, now, current_inventory)
    }
}

impl Strategy for LiquidityTaker {
    fn on_features(
        &mut self,
        ticker_id: TickerId,
        features: &Features,
        now: Ts,
        _current_inventory: i64,
    ) -> Option<StrategyIntent> {
        Self::on_features(self, ticker_id, features, now)
    }
}
