//! Order record and its explicit state machine.

use common::types::{Price, Qty, TickerId, Ts};

/// Lifecycle state of a single order. Mirrors the engine's explicit state
/// machine: no hidden states, no implicit transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// Submitted to the venue, awaiting acknowledgement.
    PendingNew,
    /// Acknowledged and resting at the venue.
    Live,
    /// Cancel request sent, awaiting acknowledgement.
    PendingCancel,
    /// Modify request sent, awaiting acknowledgement.
    PendingModify,
    /// Fully filled. Terminal.
    Filled,
    /// Partially filled, remainder still resting.
    Partial,
    /// Canceled. Terminal.
    Canceled,
    /// Rejected by the venue before becoming live. Terminal.
    Rejected,
    /// Expired by time-in-force. Terminal.
    Expired,
    /// An unexpected transition was observed; the order is held, not
    /// freed, so late acks referencing its ID can still be diagnosed.
    Quarantined,
}

impl OrderState {
    /// Terminal states free their pool slot; quarantine deliberately does
    /// not, since the ID must stay resolvable for late acks.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }
}

/// A single order under management.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    /// Direct-indexed identifier; doubles as the owning pool slot index.
    pub client_order_id: u64,
    /// Instrument.
    pub ticker_id: TickerId,
    /// `true` for a buy, `false` for a sell.
    pub is_buy: bool,
    /// Limit price.
    pub price: Price,
    /// Original requested size.
    pub qty: Qty,
    /// Cumulative filled size.
    pub filled_qty: Qty,
    /// Current lifecycle state.
    pub state: OrderState,
    /// Time the order was submitted.
    pub created_at: Ts,
    /// Time of the most recent state transition.
    pub updated_at: Ts,
}

impl Order {
    /// Remaining unfilled size.
    #[must_use]
    pub fn remaining_qty(&self) -> Qty {
        self.qty.saturating_sub(self.filled_qty)
    }
}
