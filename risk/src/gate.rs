//! Pre-trade risk gate, called synchronously on the engine thread before
//! any order intent reaches the order manager.

use common::position::Position;
use common::types::{Price, Qty, Ts};
use primitives::CacheAligned;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

const RATE_WINDOW_NS: u64 = 1_000_000_000;

/// Configured thresholds the gate checks against. `max_daily_loss` is
/// stored and compared as a positive magnitude: the gate flags a breach
/// when accumulated loss exceeds it, not when P&L goes negative by any
/// amount.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    /// Minimum acceptable order price (sanity bound).
    pub min_price: Price,
    /// Maximum acceptable order price (sanity bound).
    pub max_price: Price,
    /// Minimum acceptable order size.
    pub min_size: Qty,
    /// Maximum acceptable order size.
    pub max_size: Qty,
    /// Ceiling on projected position value (ticks × units).
    pub max_position_value: i64,
    /// Absolute position-size ceiling per symbol, in quantity units.
    pub position_limit_per_symbol: u64,
    /// Maximum tolerated loss, as a positive magnitude.
    pub max_daily_loss: i64,
    /// Token-bucket capacity: orders allowed per rolling 1-second window.
    pub max_order_rate_per_sec: u32,
}

/// Reason an intent was rejected. Matches the kinds named by the gate's
/// ordered checks; the strategy must not retry in a tight loop on any of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRejection {
    /// Price outside `[min_price, max_price]`.
    InvalidPrice,
    /// Size outside `[min_size, max_size]`.
    InvalidSize,
    /// Projected position value or size would exceed the configured limit.
    OverPositionLimit,
    /// Projected loss would exceed `max_daily_loss`.
    OverLossLimit,
    /// The 1-second order-rate token bucket is exhausted.
    OverRateLimit,
}

/// Synchronous pre-trade gate. Rate-limit counters are cache-line isolated
/// so the engine thread's writes never share a line with anything an
/// observability reader might poll concurrently.
pub struct RiskGate {
    limits: RiskLimits,
    tokens: CacheAligned<AtomicI64>,
    window_start_ns: CacheAligned<AtomicU64>,
}

impl RiskGate {
    /// Build a gate with a full token bucket.
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            tokens: CacheAligned::new(AtomicI64::new(i64::from(limits.max_order_rate_per_sec))),
            window_start_ns: CacheAligned::new(AtomicU64::new(0)),
            limits,
        }
    }

    /// Run the ordered checks for a prospective order. On success, consumes
    /// one rate-limit token. On failure, the token bucket is left
    /// untouched and no rolling counters are updated.
    pub fn check(
        &self,
        side_is_buy: bool,
        price: Price,
        qty: Qty,
        position: &Position,
        now: Ts,
    ) -> Result<(), RiskRejection> {
        if price < self.limits.min_price || price > self.limits.max_price {
            return Err(RiskRejection::InvalidPrice);
        }
        if qty < self.limits.min_size || qty > self.limits.max_size {
            return Err(RiskRejection::InvalidSize);
        }

        let projected_value = position.projected_value(side_is_buy, qty, price);
        if projected_value > self.limits.max_position_value {
            return Err(RiskRejection::OverPositionLimit);
        }
        let projected_signed = position.net_qty()
            + if side_is_buy {
                qty.units() as i64
            } else {
                -(qty.units() as i64)
            };
        if projected_signed.unsigned_abs() > self.limits.position_limit_per_symbol {
            return Err(RiskRejection::OverPositionLimit);
        }

        let projected_loss = -(position.realized_pnl + position.unrealized_pnl);
        if projected_loss > self.limits.max_daily_loss {
            return Err(RiskRejection::OverLossLimit);
        }

        if !self.try_consume_token(now) {
            return Err(RiskRejection::OverRateLimit);
        }

        Ok(())
    }

    fn try_consume_token(&self, now: Ts) -> bool {
        let window_start = self.window_start_ns.load(Ordering::Relaxed);
        if now.as_nanos().saturating_sub(window_start) >= RATE_WINDOW_NS {
            self.window_start_ns.store(now.as_nanos(), Ordering::Relaxed);
            self.tokens.store(
                i64::from(self.limits.max_order_rate_per_sec),
                Ordering::Relaxed,
            );
        }

        let remaining = self.tokens.fetch_sub(1, Ordering::Relaxed);
        if remaining <= 0 {
            self.tokens.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Tokens currently available in the rate-limit bucket.
    #[must_use]
    pub fn available_tokens(&self) -> i64 {
        self.tokens.load(Ordering::Relaxed).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RiskLimits {
        RiskLimits {
            min_price: Price::from_f64(1.0),
            max_price: Price::from_f64(1_000.0),
            min_size: Qty::from_units(1),
            max_size: Qty::from_units(1_000),
            max_position_value: 1_000_000_0000,
            position_limit_per_symbol: 500,
            max_daily_loss: 10_000,
            max_order_rate_per_sec: 2,
        }
    }

    #[test]
    fn rejects_price_outside_sanity_bounds() {
        let gate = RiskGate::new(limits());
        let pos = Position::default();
        let result = gate.check(true, Price::from_f64(0.5), Qty::from_units(10), &pos, Ts::ZERO);
        assert_eq!(result, Err(RiskRejection::InvalidPrice));
    }

    #[test]
    fn rejects_size_outside_bounds() {
        let gate = RiskGate::new(limits());
        let pos = Position::default();
        let result = gate.check(true, Price::from_f64(100.0), Qty::from_units(5_000), &pos, Ts::ZERO);
        assert_eq!(result, Err(RiskRejection::InvalidSize));
    }

    #[test]
    fn rejects_when_projected_position_exceeds_symbol_limit() {
        let gate = RiskGate::new(limits());
        let pos = Position::default();
        let result = gate.check(true, Price::from_f64(100.0), Qty::from_units(600), &pos, Ts::ZERO);
        assert_eq!(result, Err(RiskRejection::OverPositionLimit));
    }

    #[test]
    fn rejects_when_underwater_beyond_daily_loss() {
        let gate = RiskGate::new(limits());
        let mut pos = Position::default();
        pos.realized_pnl = -20_000;
        let result = gate.check(true, Price::from_f64(100.0), Qty::from_units(10), &pos, Ts::ZERO);
        assert_eq!(result, Err(RiskRejection::OverLossLimit));
    }

    #[test]
    fn rate_limit_refills_after_one_second() {
        let gate = RiskGate::new(limits());
        let pos = Position::default();
        assert!(gate
            .check(true, Price::from_f64(100.0), Qty::from_units(10), &pos, Ts::from_nanos(0))
            .is_ok());
        assert!(gate
            .check(true, Price::from_f64(100.0), Qty::from_units(10), &pos, Ts::from_nanos(1))
            .is_ok());
        assert_eq!(
            gate.check(true, Price::from_f64(100.0), Qty::from_units(10), &pos, Ts::from_nanos(2)),
            Err(RiskRejection::OverRateLimit)
        );
        assert!(gate
            .check(
                true,
                Price::from_f64(100.0),
                Qty::from_units(10),
                &pos,
                Ts::from_nanos(RATE_WINDOW_NS + 1)
            )
            .is_ok());
    }
}
