//! Normalized market-data record emitted by the transport layer.

use crate::types::{Price, Qty, TickerId, Ts};
use serde::{Deserialize, Serialize};

/// Side of the book or an aggressive trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side (bid).
    Bid,
    /// Sell side (ask / offer).
    Ask,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

/// Kind of book mutation or event an update represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    /// Insert a new price level.
    Add,
    /// Change the quantity resting at an existing level.
    Modify,
    /// Remove a level.
    Delete,
    /// Wipe the book for this ticker.
    Clear,
    /// A trade print (not a book mutation).
    Trade,
    /// One level of a full top-N snapshot burst. Always preceded by a
    /// `Clear` in the same sequence chain; applied as an upsert/removal
    /// exactly like `Add`/`Modify`, but tagged separately so a reader can
    /// tell a resync replay apart from steady-state incremental traffic.
    Snapshot,
}

/// Single-owner record produced by the transport layer and consumed once by
/// the trade-engine thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketUpdate {
    /// Instrument this update applies to.
    pub ticker_id: TickerId,
    /// What kind of event this is.
    pub update_type: UpdateType,
    /// Side affected (meaningless for `Trade`/`Clear`, set to `Bid` by convention).
    pub side: Side,
    /// Price at the affected level, or trade price.
    pub price: Price,
    /// Quantity at the affected level, or trade quantity. Zero means delete.
    pub qty: Qty,
    /// Venue-assigned monotonically increasing identifier, if the venue
    /// supplies one. Used for gap detection.
    pub sequence: u64,
    /// Venue-assigned identifier this update continues from, for venues
    /// that provide one (e.g. Binance's `pu` field). `0` means absent.
    pub previous_sequence: u64,
    /// Time the update was produced, in nanoseconds.
    pub timestamp_ns: Ts,
}

impl MarketUpdate {
    /// Build a book-level update (`Add`/`Modify`/`Delete`).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn level(
        ticker_id: TickerId,
        update_type: UpdateType,
        side: Side,
        price: Price,
        qty: Qty,
        sequence: u64,
        previous_sequence: u64,
        timestamp_ns: Ts,
    ) -> Self {
        Self {
            ticker_id,
            update_type,
            side,
            price,
            qty,
            sequence,
            previous_sequence,
            timestamp_ns,
        }
    }

    /// Build a `Clear` update — used by synchronizers to reset a book before
    /// resyncing.
    #[must_use]
    pub fn clear(ticker_id: TickerId, sequence: u64, timestamp_ns: Ts) -> Self {
        Self {
            ticker_id,
            update_type: UpdateType::Clear,
            side: Side::Bid,
            price: Price::ZERO,
            qty: Qty::ZERO,
            sequence,
            previous_sequence: 0,
            timestamp_ns,
        }
    }

    /// `true` if `qty` signals a delete under venue convention (zero size).
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.qty.is_zero()
    }
}
