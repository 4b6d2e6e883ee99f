//! Symmetric market-making core: quotes around mid, widens into inventory,
//! and replaces on staleness or a one-tick theoretical move.

use crate::intent::{StrategyAction, StrategyIntent};
use common::types::{Price, Qty, TickerId, Ts};
use features::Features;
use std::collections::HashMap;

/// Tunables for one market-maker instance, shared across every ticker it
/// quotes.
#[derive(Debug, Clone, Copy)]
pub struct MarketMakerConfig {
    /// Target full quote width, in basis points of mid.
    pub spread_bps: u32,
    /// Minimum acceptable half-spread, in basis points of mid — a floor
    /// under `spread_bps` so the strategy never quotes through its own
    /// edge requirement in a tight market.
    pub min_edge_bps: u32,
    /// Size posted on each side.
    pub quote_size: Qty,
    /// Inventory magnitude beyond which the over-exposed side is widened.
    pub inventory_limit: i64,
    /// Maximum age of a resting quote before it is replaced.
    pub quote_lifetime_ms: u64,
    /// Whether inventory-based skew is applied at all.
    pub skew_enabled: bool,
}

#[derive(Debug, Clone, Copy)]
struct RestingQuote {
    bid_price: Price,
    ask_price: Price,
    quoted_at: Ts,
}

/// Symmetric market maker. One instance quotes every ticker it is invoked
/// for; per-ticker state is kept in an internal table so a single instance
/// can be shared across instruments.
pub struct MarketMaker {
    config: MarketMakerConfig,
    resting: HashMap<TickerId, RestingQuote>,
}

impl MarketMaker {
    /// Build a market maker with the given configuration.
    #[must_use]
    pub fn new(config: MarketMakerConfig) -> Self {
        Self {
            config,
            resting: HashMap::new(),
        }
    }

    /// Evaluate the current feature set for `ticker_id` and `current_inventory`
    /// (signed, positive is long), returning a new/replacement quote if one
    /// is warranted.
    pub fn on_features(
        &mut self,
        ticker_id: TickerId,
        features: &Features,
        now: Ts,
        current_inventory: i64,
    ) -> Option<StrategyIntent> {
        if !features.valid {
            return None;
        }
        let mid = features.mid?;

        let effective_bps = self.config.spread_bps.max(self.config.min_edge_bps);
        let half_offset = mid.ticks() * i64::from(effective_bps) / 10_000 / 2;

        let (bid_offset, ask_offset) = if self.config.skew_enabled
            && current_inventory.unsigned_abs() as i64 >= self.config.inventory_limit
            && self.config.inventory_limit > 0
        {
            if current_inventory > 0 {
                // Long beyond the limit: widen the bid to slow further
                // accumulation, tighten the ask to encourage unwinding.
                (half_offset * 2, half_offset / 2)
            } else {
                (half_offset / 2, half_offset * 2)
            }
        } else {
            (half_offset, half_offset)
        };

        let bid_price = Price::from_ticks(mid.ticks() - bid_offset);
        let ask_price = Price::from_ticks(mid.ticks() + ask_offset);

        let needs_replace = match self.resting.get(&ticker_id) {
            None => true,
            Some(existing) => {
                let age_ms = now.since(existing.quoted_at) / 1_000_000;
                age_ms >= self.config.quote_lifetime_ms
                    || (existing.bid_price.ticks() - bid_price.ticks()).abs() > 1
                    || (existing.ask_price.ticks() - ask_price.ticks()).abs() > 1
            }
        };

        if !needs_replace {
            return None;
        }

        self.resting.insert(
            ticker_id,
            RestingQuote {
                bid_price,
                ask_price,
                quoted_at: now,
            },
        );

        Some(StrategyIntent {
            ticker_id,
            action: StrategyAction::Quote {
                bid_price,
                bid_qty: self.config.quote_size,
                ask_price,
                ask_qty: self.config.quote_size,
            },
            timestamp_ns: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> TickerId {
        TickerId::new(1).unwrap()
    }

    fn valid_features(mid: f64) -> Features {
        Features {
            ticker_id: Some(ticker()),
            spread: Some(10),
            mid: Some(Price::from_f64(mid)),
            micro: Some(Price::from_f64(mid)),
            imbalance: Some(0.0),
            momentum: 0,
            agg_trade_ratio: Some(0.5),
            valid: true,
            timestamp_ns: Ts::ZERO,
        }
    }

    fn config() -> MarketMakerConfig {
        MarketMakerConfig {
            spread_bps: 10,
            min_edge_bps: 5,
            quote_size: Qty::from_units(10),
            inventory_limit: 100,
            quote_lifetime_ms: 500,
            skew_enabled: true,
        }
    }

    #[test]
    fn quotes_symmetric_around_mid_when_flat() {
        let mut mm = MarketMaker::new(config());
        let intent = mm
            .on_features(ticker(), &valid_features(100.0), Ts::from_nanos(1), 0)
            .unwrap();
        if let StrategyAction::Quote {
            bid_price, ask_price, ..
        } = intent.action
        {
            let mid = Price::from_f64(100.0).ticks();
            assert_eq!(mid - bid_price.ticks(), ask_price.ticks() - mid);
        } else {
            panic!("expected a Quote action");
        }
    }

    #[test]
    fn does_not_replace_an_unchanged_fresh_quote() {
        let mut mm = MarketMaker::new(config());
        mm.on_features(ticker(), &valid_features(100.0), Ts::from_nanos(1), 0)
            .unwrap();
        let second = mm.on_features(ticker(), &valid_features(100.0), Ts::from_nanos(2), 0);
        assert!(second.is_none());
    }

    #[test]
    fn replaces_after_quote_lifetime_elapses() {
        let mut mm = MarketMaker::new(config());
        mm.on_features(ticker(), &valid_features(100.0), Ts::from_nanos(0), 0)
            .unwrap();
        let replaced = mm.on_features(
            ticker(),
            &valid_features(100.0),
            Ts::from_nanos(600 * 1_000_000),
            0,
        );
        assert!(replaced.is_some());
    }

    #[test]
    fn skews_wider_on_the_over_inventory_side() {
        let mut mm = MarketMaker::new(config());
        let intent = mm
            .on_features(ticker(), &valid_features(100.0), Ts::from_nanos(1), 200)
            .unwrap();
        if let StrategyAction::Quote {
            bid_price, ask_price, ..
        } = intent.action
        {
            let mid = Price::from_f64(100.0).ticks();
            assert!(mid - bid_price.ticks() > ask_price.ticks() - mid);
        } else {
            panic!("expected a Quote action");
        }
    }
}
