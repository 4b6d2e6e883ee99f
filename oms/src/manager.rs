//! Order manager: owns the order pool, the client-order-id lookup table,
//! and drives the state machine as responses arrive from the venue.

use crate::order::{Order, OrderState};
use common::types::{Price, Qty, TickerId, Ts};
use primitives::{ObjectPool, PoolRef};
use thiserror::Error;

/// Fallible outcomes of order-manager operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OmsError {
    /// The order pool has no free slots.
    #[error("order pool exhausted")]
    PoolExhausted,
    /// A response referenced a `client_order_id` with no live order.
    #[error("unknown client order id {0}")]
    UnknownOrder(u64),
    /// A response or command was not a legal transition from the order's
    /// current state. The order is quarantined, not freed.
    #[error("illegal transition for order {order_id}: {from:?} -> attempted {attempted}")]
    IllegalTransition {
        /// Order whose transition was rejected.
        order_id: u64,
        /// State the order was in.
        from: OrderState,
        /// Description of the attempted transition.
        attempted: &'static str,
    },
}

/// Venue acknowledgement applied to an order's state machine.
#[derive(Debug, Clone, Copy)]
pub enum OrderResponse {
    /// Venue accepted the order; it is now resting.
    Accepted {
        /// Client-assigned order identifier.
        client_order_id: u64,
    },
    /// Venue rejected the order before it became live.
    Rejected {
        /// Client-assigned order identifier.
        client_order_id: u64,
    },
    /// A fill, partial or full depending on `remaining` after applying.
    Fill {
        /// Client-assigned order identifier.
        client_order_id: u64,
        /// Quantity filled in this event.
        fill_qty: Qty,
        /// Price at which the fill occurred.
        fill_price: Price,
    },
    /// Venue acknowledged a cancel request.
    CanceledAck {
        /// Client-assigned order identifier.
        client_order_id: u64,
    },
    /// Venue acknowledged a modify request.
    ModifiedAck {
        /// Client-assigned order identifier.
        client_order_id: u64,
    },
    /// Venue expired the order under its time-in-force.
    Expired {
        /// Client-assigned order identifier.
        client_order_id: u64,
    },
}

/// Owns pool-allocated [`Order`] records and a direct-indexed lookup table
/// keyed by `client_order_id`, which is the pool's own slot index — so the
/// lookup table and the pool's allocation bookkeeping never disagree.
pub struct OrderManager {
    pool: ObjectPool<Order>,
    slots: Vec<Option<PoolRef<Order>>>,
}

impl OrderManager {
    /// Build a manager with `capacity` order slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: ObjectPool::new(capacity),
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Submit a new order intent, allocating a slot and assigning its
    /// `client_order_id`. The ID is the pool's slot index, so it wraps at
    /// pool capacity as slots are recycled.
    pub fn submit(
        &mut self,
        ticker_id: TickerId,
        is_buy: bool,
        price: Price,
        qty: Qty,
        now: Ts,
    ) -> Result<u64, OmsError> {
        let order = Order {
            client_order_id: 0,
            ticker_id,
            is_buy,
            price,
            qty,
            filled_qty: Qty::ZERO,
            state: OrderState::PendingNew,
            created_at: now,
            updated_at: now,
        };
        let mut handle = self.pool.acquire(order).ok_or(OmsError::PoolExhausted)?;
        let client_order_id = handle.index() as u64;
        handle.client_order_id = client_order_id;
        let slot_index = handle.index();
        self.slots[slot_index] = Some(handle);
        Ok(client_order_id)
    }

    /// Look up an order by its client order ID.
    #[must_use]
    pub fn get(&self, client_order_id: u64) -> Option<&Order> {
        self.slots
            .get(client_order_id as usize)
            .and_then(Option::as_ref)
            .map(|h| &**h)
    }

    /// Apply a venue response to the matching order's state machine.
    pub fn apply_response(&mut self, response: OrderResponse, now: Ts) -> Result<(), OmsError> {
        let client_order_id = Self::response_id(&response);
        let index = client_order_id as usize;
        let handle = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(OmsError::UnknownOrder(client_order_id))?;

        let from = handle.state;
        let next = match (from, response) {
            (OrderState::PendingNew, OrderResponse::Accepted { .. }) => Some(OrderState::Live),
            (OrderState::PendingNew, OrderResponse::Rejected { .. }) => Some(OrderState::Rejected),
            (OrderState::PendingNew, OrderResponse::Expired { .. })
            | (OrderState::Live, OrderResponse::Expired { .. }) => Some(OrderState::Expired),
            (OrderState::Live, OrderResponse::CanceledAck { .. })
            | (OrderState::PendingCancel, OrderResponse::CanceledAck { .. }) => {
                Some(OrderState::Canceled)
            }
            (OrderState::Live, OrderResponse::Fill { fill_qty, fill_price, .. })
            | (OrderState::Partial, OrderResponse::Fill { fill_qty, fill_price, .. }) => {
                handle.filled_qty = handle.filled_qty.saturating_add(fill_qty);
                let _ = fill_price;
                Some(if handle.filled_qty >= handle.qty {
                    OrderState::Filled
                } else {
                    OrderState::Partial
                })
            }
            (OrderState::PendingModify, OrderResponse::ModifiedAck { .. }) => {
                Some(OrderState::Live)
            }
            _ => None,
        };

        match next {
            Some(state) => {
                handle.state = state;
                handle.updated_at = now;
                if state.is_terminal() {
                    self.slots[index] = None;
                }
                Ok(())
            }
            None => {
                handle.state = OrderState::Quarantined;
                handle.updated_at = now;
                Err(OmsError::IllegalTransition {
                    order_id: client_order_id,
                    from,
                    attempted: Self::response_name(&response),
                })
            }
        }
    }

    /// Request a cancel for a live order.
    pub fn request_cancel(&mut self, client_order_id: u64, now: Ts) -> Result<(), OmsError> {
        self.transition_command(
            client_order_id,
            now,
            &[OrderState::Live],
            OrderState::PendingCancel,
            "cancel",
        )
    }

    /// Request a modify for a partially filled order resting at the venue.
    pub fn request_modify(
        &mut self,
        client_order_id: u64,
        new_price: Price,
        new_qty: Qty,
        now: Ts,
    ) -> Result<(), OmsError> {
        let index = client_order_id as usize;
        let handle = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(OmsError::UnknownOrder(client_order_id))?;
        if handle.state != OrderState::Partial && handle.state != OrderState::Live {
            handle.state = OrderState::Quarantined;
            return Err(OmsError::IllegalTransition {
                order_id: client_order_id,
                from: handle.state,
                attempted: "modify",
            });
        }
        handle.price = new_price;
        handle.qty = new_qty;
        handle.state = OrderState::PendingModify;
        handle.updated_at = now;
        Ok(())
    }

    fn transition_command(
        &mut self,
        client_order_id: u64,
        now: Ts,
        allowed_from: &[OrderState],
        to: OrderState,
        attempted: &'static str,
    ) -> Result<(), OmsError> {
        let index = client_order_id as usize;
        let handle = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(OmsError::UnknownOrder(client_order_id))?;
        if !allowed_from.contains(&handle.state) {
            let from = handle.state;
            handle.state = OrderState::Quarantined;
            return Err(OmsError::IllegalTransition {
                order_id: client_order_id,
                from,
                attempted,
            });
        }
        handle.state = to;
        handle.updated_at = now;
        Ok(())
    }

    fn response_id(response: &OrderResponse) -> u64 {
        match *response {
            OrderResponse::Accepted { client_order_id }
            | OrderResponse::Rejected { client_order_id }
            | OrderResponse::Fill { client_order_id, .. }
            | OrderResponse::CanceledAck { client_order_id }
            | OrderResponse::ModifiedAck { client_order_id }
            | OrderResponse::Expired { client_order_id } => client_order_id,
        }
    }

    fn response_name(response: &OrderResponse) -> &'static str {
        match response {
            OrderResponse::Accepted { .. } => "accept",
            OrderResponse::Rejected { .. } => "reject",
            OrderResponse::Fill { .. } => "fill",
            OrderResponse::CanceledAck { .. } => "cancel-ack",
            OrderResponse::ModifiedAck { .. } => "modify-ack",
            OrderResponse::Expired { .. } => "expire",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> TickerId {
        TickerId::new(1).unwrap()
    }

    #[test]
    fn submit_then_accept_then_fill_frees_the_slot() {
        let mut oms = OrderManager::new(4);
        let id = oms
            .submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO)
            .unwrap();
        oms.apply_response(OrderResponse::Accepted { client_order_id: id }, Ts::from_nanos(1))
            .unwrap();
        assert_eq!(oms.get(id).unwrap().state, OrderState::Live);

        oms.apply_response(
            OrderResponse::Fill {
                client_order_id: id,
                fill_qty: Qty::from_units(4),
                fill_price: Price::from_f64(100.0),
            },
            Ts::from_nanos(2),
        )
        .unwrap();
        assert_eq!(oms.get(id).unwrap().state, OrderState::Partial);

        oms.apply_response(
            OrderResponse::Fill {
                client_order_id: id,
                fill_qty: Qty::from_units(6),
                fill_price: Price::from_f64(100.0),
            },
            Ts::from_nanos(3),
        )
        .unwrap();
        assert!(oms.get(id).is_none());
    }

    #[test]
    fn rejected_order_frees_its_slot_for_reuse() {
        let mut oms = OrderManager::new(1);
        let id = oms
            .submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO)
            .unwrap();
        oms.apply_response(OrderResponse::Rejected { client_order_id: id }, Ts::from_nanos(1))
            .unwrap();
        assert!(oms.get(id).is_none());

        let reused = oms
            .submit(ticker(), false, Price::from_f64(99.0), Qty::from_units(5), Ts::from_nanos(2))
            .unwrap();
        assert_eq!(reused, id);
    }

    #[test]
    fn pool_exhaustion_is_reported_not_panicked() {
        let mut oms = OrderManager::new(1);
        oms.submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO)
            .unwrap();
        let result = oms.submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO);
        assert_eq!(result, Err(OmsError::PoolExhausted));
    }

    #[test]
    fn illegal_transition_quarantines_instead_of_freeing() {
        let mut oms = OrderManager::new(4);
        let id = oms
            .submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO)
            .unwrap();
        // Order is still PendingNew; a cancel-ack is not a legal transition.
        let result = oms.apply_response(OrderResponse::CanceledAck { client_order_id: id }, Ts::from_nanos(1));
        assert!(matches!(result, Err(OmsError::IllegalTransition { .. })));
        assert_eq!(oms.get(id).unwrap().state, OrderState::Quarantined);
    }

    #[test]
    fn cancel_flow_reaches_canceled_and_frees_slot() {
        let mut oms = OrderManager::new(2);
        let id = oms
            .submit(ticker(), true, Price::from_f64(100.0), Qty::from_units(10), Ts::ZERO)
            .unwrap();
        oms.apply_response(OrderResponse::Accepted { client_order_id: id }, Ts::from_nanos(1))
            .unwrap();
        oms.request_cancel(id, Ts::from_nanos(2)).unwrap();
        assert_eq!(oms.get(id).unwrap().state, OrderState::PendingCancel);
        oms.apply_response(OrderResponse::CanceledAck { client_order_id: id }, Ts::from_nanos(3))
            .unwrap();
        assert!(oms.get(id).is_none());
    }
}
