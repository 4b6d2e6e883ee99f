//! Per-ticker derived features, recomputed from book state and trade prints.

use common::market::Side;
use common::types::{Price, Qty, TickerId, Ts};
use orderbook::OrderBook;

const TRADE_WINDOW_NS: u64 = 1_000_000_000;

/// Snapshot of derived features as of the most recent book update or trade.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    /// Instrument these features describe.
    pub ticker_id: Option<TickerId>,
    /// Ask minus bid, in raw ticks. `None` if either side is empty.
    pub spread: Option<i64>,
    /// Simple mid price.
    pub mid: Option<Price>,
    /// Size-weighted microprice.
    pub micro: Option<Price>,
    /// Top-of-book imbalance in `[-1.0, 1.0]`.
    pub imbalance: Option<f64>,
    /// Signed mid-price change since the previous book update, in ticks.
    pub momentum: i64,
    /// Fraction of windowed trade volume on the buy side, in `[0.0, 1.0]`.
    pub agg_trade_ratio: Option<f64>,
    /// `true` once both sides have at least one level and at least one
    /// trade has been observed.
    pub valid: bool,
    /// Time this feature set was computed.
    pub timestamp_ns: Ts,
}

/// Stateless-API feature calculator carrying only the small per-ticker
/// state needed for momentum and the windowed trade ratio: last mid, and
/// rolling buy/sell volume counters that reset on window roll.
pub struct FeatureEngine {
    ticker_id: TickerId,
    last_mid: Option<Price>,
    window_start: Ts,
    buy_volume: u64,
    sell_volume: u64,
    has_traded: bool,
}

impl FeatureEngine {
    /// Build a feature engine for one instrument.
    #[must_use]
    pub fn new(ticker_id: TickerId) -> Self {
        Self {
            ticker_id,
            last_mid: None,
            window_start: Ts::ZERO,
            buy_volume: 0,
            sell_volume: 0,
            has_traded: false,
        }
    }

    /// Recompute spread/mid/microprice/imbalance/momentum from the current
    /// book state. Call after every accepted `apply_update`.
    pub fn on_book_update<const N: usize>(&mut self, book: &OrderBook<N>) -> Features {
        let best_bid = book.best_bid();
        let best_ask = book.best_ask();

        let (spread, mid, micro, imbalance) = match (best_bid, best_ask) {
            (Some(_), Some(_)) => (
                book.spread(),
                book.mid(),
                book.microprice(),
                book.imbalance(1),
            ),
            _ => (None, None, None, None),
        };

        let momentum = match (mid, self.last_mid) {
            // A crossed book (bid >= ask) should already be rejected by
            // `apply_update`; guard momentum against it anyway so a stray
            // crossed read never produces a feedback spike.
            (Some(current), Some(previous)) if !book.is_crossed() => current.ticks() - previous.ticks(),
            _ => 0,
        };
        self.last_mid = mid.or(self.last_mid);

        Features {
            ticker_id: Some(self.ticker_id),
            spread,
            mid,
            micro,
            imbalance,
            momentum,
            agg_trade_ratio: self.agg_trade_ratio(),
            valid: best_bid.is_some() && best_ask.is_some() && self.has_traded,
            timestamp_ns: book.snapshot().timestamp_ns,
        }
    }

    /// Fold an aggressive trade print into the rolling 1-second buy/sell
    /// volume window.
    pub fn on_trade(&mut self, side: Side, qty: Qty, now: Ts) {
        if now.as_nanos().saturating_sub(self.window_start.as_nanos()) >= TRADE_WINDOW_NS {
            self.window_start = now;
            self.buy_volume = 0;
            self.sell_volume = 0;
        }
        match side {
            Side::Bid => self.buy_volume += qty.units(),
            Side::Ask => self.sell_volume += qty.units(),
        }
        self.has_traded = true;
    }

    fn agg_trade_ratio(&self) -> Option<f64> {
        let total = self.buy_volume + self.sell_volume;
        if total == 0 {
            return None;
        }
        Some(self.buy_volume as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::market::{MarketUpdate, UpdateType};

    fn ticker() -> TickerId {
        TickerId::new(1).unwrap()
    }

    fn add(book: &mut OrderBook<5>, side: Side, price: f64, qty: u64, seq: u64) {
        book.apply_update(&MarketUpdate::level(
            ticker(),
            UpdateType::Add,
            side,
            Price::from_f64(price),
            Qty::from_units(qty),
            seq,
            0,
            Ts::from_nanos(seq),
        ));
    }

    #[test]
    fn invalid_until_both_sides_present_and_a_trade_seen() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        let mut engine = FeatureEngine::new(ticker());
        add(&mut book, Side::Bid, 99.0, 10, 1);
        let features = engine.on_book_update(&book);
        assert!(!features.valid);

        add(&mut book, Side::Ask, 101.0, 10, 2);
        let features = engine.on_book_update(&book);
        assert!(!features.valid);

        engine.on_trade(Side::Bid, Qty::from_units(1), Ts::from_nanos(2));
        let features = engine.on_book_update(&book);
        assert!(features.valid);
    }

    #[test]
    fn momentum_tracks_signed_mid_change() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        let mut engine = FeatureEngine::new(ticker());
        add(&mut book, Side::Bid, 99.0, 10, 1);
        add(&mut book, Side::Ask, 101.0, 10, 2);
        let first = engine.on_book_update(&book);
        assert_eq!(first.momentum, 0);

        add(&mut book, Side::Bid, 100.0, 10, 3);
        let second = engine.on_book_update(&book);
        assert!(second.momentum > 0);
    }

    #[test]
    fn aggressive_trade_ratio_reflects_windowed_volume() {
        let mut engine = FeatureEngine::new(ticker());
        engine.on_trade(Side::Bid, Qty::from_units(70), Ts::from_nanos(1));
        engine.on_trade(Side::Ask, Qty::from_units(30), Ts::from_nanos(2));
        assert_eq!(engine.agg_trade_ratio(), Some(0.7));
    }

    #[test]
    fn trade_window_resets_after_one_second() {
        let mut engine = FeatureEngine::new(ticker());
        engine.on_trade(Side::Bid, Qty::from_units(10), Ts::from_nanos(0));
        engine.on_trade(Side::Bid, Qty::from_units(10), Ts::from_nanos(TRADE_WINDOW_NS + 1));
        assert_eq!(engine.agg_trade_ratio(), Some(1.0));
        assert_eq!(engine.buy_volume, 10);
    }
}
