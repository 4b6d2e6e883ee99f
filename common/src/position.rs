//! Per-ticker position state, mutated only by the trade-engine thread.

use crate::types::{Price, Qty, Ts};
use serde::{Deserialize, Serialize};

/// Net position and P&L for one instrument.
///
/// `net_qty` is signed via `long`/`short` bookkeeping kept as two unsigned
/// fields plus a sign-free net helper, avoiding a signed `Qty` type while
/// still letting the risk gate reason about directional exposure.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    /// Signed net quantity in ticks of base size: positive is long.
    net_qty: i64,
    /// Volume-weighted average entry price of the current net position.
    pub avg_entry_px: Price,
    /// Realized P&L accumulated from closed portions of the position, in
    /// price ticks times quantity units.
    pub realized_pnl: i64,
    /// Unrealized P&L against `last_mark_px`, recomputed on every mark.
    pub unrealized_pnl: i64,
    /// Last price used to mark `unrealized_pnl`.
    pub last_mark_px: Price,
    /// Time of the last mutation, for staleness checks.
    pub last_update: Ts,
}

impl Position {
    /// Net signed quantity: positive is long, negative is short.
    #[must_use]
    pub const fn net_qty(&self) -> i64 {
        self.net_qty
    }

    /// Absolute position value at the current mark price.
    #[must_use]
    pub fn position_value(&self) -> i64 {
        self.net_qty.unsigned_abs() as i64 * self.last_mark_px.ticks()
    }

    /// Apply a fill: updates net quantity, average entry, and realized P&L
    /// for the portion that closes existing exposure.
    ///
    /// Grounded on the fill-weighted average price pattern from order fill
    /// tracking: extending, rather than closing, a position rolls the fill
    /// price into `avg_entry_px`; closing realizes P&L at the fill price
    /// against the prior average.
    pub fn apply_fill(&mut self, side_is_buy: bool, qty: Qty, price: Price, now: Ts) {
        let signed_qty: i64 = if side_is_buy {
            qty.units() as i64
        } else {
            -(qty.units() as i64)
        };

        let same_direction = self.net_qty == 0 || self.net_qty.signum() == signed_qty.signum();

        if same_direction {
            let total = self.net_qty.unsigned_abs() + signed_qty.unsigned_abs();
            if total > 0 {
                let weighted = self.avg_entry_px.ticks() * self.net_qty.unsigned_abs() as i64
                    + price.ticks() * signed_qty.unsigned_abs() as i64;
                self.avg_entry_px = Price::from_ticks(weighted / total as i64);
            }
            self.net_qty += signed_qty;
        } else {
            let closing = signed_qty.unsigned_abs().min(self.net_qty.unsigned_abs());
            let pnl_per_unit = if self.net_qty > 0 {
                price.ticks() - self.avg_entry_px.ticks()
            } else {
                self.avg_entry_px.ticks() - price.ticks()
            };
            self.realized_pnl += pnl_per_unit * closing as i64;
            self.net_qty += signed_qty;
            if self.net_qty.signum() == signed_qty.signum() && self.net_qty != 0 {
                // Position flipped direction; remaining quantity opens fresh
                // at the fill price.
                self.avg_entry_px = price;
            }
        }

        self.mark(price, now);
    }

    /// Re-mark unrealized P&L without changing the position.
    pub fn mark(&mut self, price: Price, now: Ts) {
        self.last_mark_px = price;
        self.unrealized_pnl = self.net_qty * (price.ticks() - self.avg_entry_px.ticks());
        self.last_update = now;
    }

    /// Projected position value if an intent of `qty` on `side_is_buy` were
    /// filled at `price` — used by the risk gate without mutating state.
    #[must_use]
    pub fn projected_value(&self, side_is_buy: bool, qty: Qty, price: Price) -> i64 {
        let signed_qty: i64 = if side_is_buy {
            qty.units() as i64
        } else {
            -(qty.units() as i64)
        };
        (self.net_qty + signed_qty).unsigned_abs() as i64 * price.ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_long_sets_avg_entry() {
        let mut pos = Position::default();
        pos.apply_fill(true, Qty::from_units(10), Price::from_f64(100.0), Ts::from_nanos(1));
        assert_eq!(pos.net_qty(), 10);
        assert_eq!(pos.avg_entry_px, Price::from_f64(100.0));
    }

    #[test]
    fn closing_realizes_pnl() {
        let mut pos = Position::default();
        pos.apply_fill(true, Qty::from_units(10), Price::from_f64(100.0), Ts::from_nanos(1));
        pos.apply_fill(false, Qty::from_units(10), Price::from_f64(105.0), Ts::from_nanos(2));
        assert_eq!(pos.net_qty(), 0);
        assert_eq!(pos.realized_pnl, 5 * common_price_scale());
    }

    fn common_price_scale() -> i64 {
        crate::types::PRICE_SCALE
    }

    #[test]
    fn flipping_direction_resets_avg_entry_to_fill_price() {
        let mut pos = Position::default();
        pos.apply_fill(true, Qty::from_units(5), Price::from_f64(100.0), Ts::from_nanos(1));
        pos.apply_fill(false, Qty::from_units(15), Price::from_f64(110.0), Ts::from_nanos(2));
        assert_eq!(pos.net_qty(), -10);
        assert_eq!(pos.avg_entry_px, Price::from_f64(110.0));
    }
}
