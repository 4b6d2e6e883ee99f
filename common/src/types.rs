//! Fixed-point value types.
//!
//! `Price` and `Qty` are fixed-point integers, not floats: every hot-path
//! comparison and arithmetic operation on them must be exact and
//! allocation-free, which rules out `f64` despite its convenience at the
//! system boundary (serialization, config, logging).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of ticks per whole unit of price (4 decimal places).
pub const PRICE_SCALE: i64 = 10_000;

/// Upper bound on the number of distinct instruments the core tracks.
pub const MAX_TICKERS: usize = 1000;

/// Index identifying a registered instrument.
///
/// Assigned once at instrument registration and stable for the process
/// lifetime; bounded by [`MAX_TICKERS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TickerId(u32);

impl TickerId {
    /// Build a `TickerId`, rejecting indices at or beyond [`MAX_TICKERS`].
    #[must_use]
    pub fn new(index: u32) -> Option<Self> {
        if (index as usize) < MAX_TICKERS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw index, suitable for direct array indexing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TKR_{}", self.0)
    }
}

/// Price, stored internally as ticks (1 tick = 1 / [`PRICE_SCALE`] units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Price(i64);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(0);

    /// Build a price from raw ticks.
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Build a price from a decimal value, rounding to the nearest tick.
    ///
    /// Intended for config parsing and tests, not the hot path.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        Self((value * PRICE_SCALE as f64).round() as i64)
    }

    /// Raw ticks.
    #[must_use]
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Decimal value, for logging and external reporting only.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    /// Checked addition; used by strategy cores computing quote offsets.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl std::ops::Sub for Price {
    type Output = i64;
    fn sub(self, rhs: Self) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

/// Quantity, an unsigned count of units (contracts, shares, base-asset size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Qty(u64);

impl Qty {
    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Build a quantity from raw integer units.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Raw integer units.
    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }

    /// `true` if this quantity is zero — venues use this to signal deletes.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating subtraction, used when applying fills against remaining
    /// quantity.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic nanosecond timestamp.
///
/// Produced by `primitives::TimestampSource` on the hot path; this type is
/// just the value — ordering and display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Ts(u64);

impl Ts {
    /// Zero timestamp, used as a sentinel for "never updated".
    pub const ZERO: Self = Self(0);

    /// Build a timestamp from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Raw nanosecond count.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Nanoseconds elapsed since `earlier`, saturating at zero if `self` is
    /// not actually later (clock noise, test fixtures).
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_roundtrip_serde() {
        let px = Price::from_f64(1234.5678);
        let encoded = bincode::serialize(&px).unwrap();
        let decoded: Price = bincode::deserialize(&encoded).unwrap();
        assert_eq!(px, decoded);
    }

    #[test]
    fn price_from_f64_rounds_to_nearest_tick() {
        assert_eq!(Price::from_f64(100.00005).ticks(), 1_000_001);
        assert_eq!(Price::from_f64(99.5).ticks(), 995_000);
    }

    #[test]
    fn qty_saturating_sub_never_underflows() {
        let a = Qty::from_units(5);
        let b = Qty::from_units(10);
        assert_eq!(a.saturating_sub(b), Qty::ZERO);
    }

    #[test]
    fn ticker_id_rejects_out_of_range() {
        assert!(TickerId::new(MAX_TICKERS as u32).is_none());
        assert!(TickerId::new(MAX_TICKERS as u32 - 1).is_some());
    }

    #[test]
    fn ts_since_saturates_on_clock_noise() {
        let earlier = Ts::from_nanos(100);
        let later = Ts::from_nanos(50);
        assert_eq!(later.since(earlier), 0);
    }
}
