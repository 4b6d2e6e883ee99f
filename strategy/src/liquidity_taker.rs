//! Aggressive liquidity-taking core: fires into strong order-flow signals,
//! respecting a per-ticker cooldown.

use crate::intent::{StrategyAction, StrategyIntent};
use common::types::{MAX_TICKERS, Price, Qty, TickerId, Ts};
use features::Features;
use primitives::CacheAligned;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tunables for one liquidity-taker instance.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityTakerConfig {
    /// Fire when `|imbalance|` exceeds this.
    pub imbalance_threshold: f64,
    /// Fire when `agg_trade_ratio` (or its complement on the sell side)
    /// reaches this.
    pub agg_ratio_threshold: f64,
    /// Ticks of slippage allowed beyond the far touch.
    pub max_slippage_ticks: i64,
    /// Base clip size before clamping to `[min_size, max_size]`.
    pub clip: Qty,
    /// Minimum order size.
    pub min_size: Qty,
    /// Maximum order size.
    pub max_size: Qty,
    /// Minimum time between fires for the same ticker.
    pub cooldown_ms: u64,
}

/// Imbalance/aggressive-trade-ratio triggered taker. Cooldown state lives
/// in cache-line-isolated atomics, direct-indexed by ticker, matching the
/// pattern used for the risk gate's rate limiter.
pub struct LiquidityTaker {
    config: LiquidityTakerConfig,
    last_fire_ns: Vec<CacheAligned<AtomicU64>>,
}

impl LiquidityTaker {
    /// Build a liquidity taker with the given configuration.
    #[must_use]
    pub fn new(config: LiquidityTakerConfig) -> Self {
        Self {
            config,
            last_fire_ns: (0..MAX_TICKERS).map(|_| CacheAligned::new(AtomicU64::new(0))).collect(),
        }
    }

    /// Evaluate the current feature set for `ticker_id`, returning an
    /// aggressive order intent if the signal is strong enough and the
    /// ticker's cooldown has elapsed. Cooldown state is interior-mutable,
    /// so this only needs a shared reference.
    pub fn on_features(&self, ticker_id: TickerId, features: &Features, now: Ts) -> Option<StrategyIntent> {
        if !features.valid {
            return None;
        }
        let imbalance = features.imbalance?;
        let agg_ratio = features.agg_trade_ratio.unwrap_or(0.5);
        let mid = features.mid?;
        let spread = features.spread?;

        let buy_signal = imbalance > self.config.imbalance_threshold || agg_ratio >= self.config.agg_ratio_threshold;
        let sell_signal =
            imbalance < -self.config.imbalance_threshold || (1.0 - agg_ratio) >= self.config.agg_ratio_threshold;

        let is_buy = if buy_signal {
            true
        } else if sell_signal {
            false
        } else {
            return None;
        };

        let slot = &self.last_fire_ns[ticker_id.index()];
        let last_fire = slot.load(Ordering::Relaxed);
        let elapsed_ms = now.as_nanos().saturating_sub(last_fire) / 1_000_000;
        if last_fire != 0 && elapsed_ms < self.config.cooldown_ms {
            return None;
        }

        let half_spread = spread / 2;
        let price = if is_buy {
            Price::from_ticks(mid.ticks() + half_spread + self.config.max_slippage_ticks)
        } else {
            Price::from_ticks(mid.ticks() - half_spread - self.config.max_slippage_ticks)
        };

        let qty = self.config.clip.max(self.config.min_size).min(self.config.max_size);

        slot.store(now.as_nanos(), Ordering::Relaxed);

        Some(StrategyIntent {
            ticker_id,
            action: StrategyAction::Order { is_buy, price, qty },
            timestamp_ns: now,
        })
    }
}
