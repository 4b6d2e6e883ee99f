//! Output of one pipeline pass: zero, one, or two order records bound for
//! the order-gateway thread. Fixed-size so a strategy's two-sided quote
//! never forces a heap allocation on the engine thread.

use common::types::{Price, Qty, TickerId};

/// One order the engine wants the order-gateway thread to send to a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOrder {
    /// ID assigned by the order manager; the venue's client order id.
    pub client_order_id: u64,
    /// Instrument the order applies to.
    pub ticker_id: TickerId,
    /// `true` to buy, `false` to sell.
    pub is_buy: bool,
    /// Limit price.
    pub price: Price,
    /// Order size.
    pub qty: Qty,
}

/// At most two orders, produced by a two-sided quote. Iterable without
/// allocating.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBatch {
    first: Option<GatewayOrder>,
    second: Option<GatewayOrder>,
}

impl OrderBatch {
    pub(crate) fn push(&mut self, order: GatewayOrder) {
        if self.first.is_none() {
            self.first = Some(order);
        } else {
            debug_assert!(self.second.is_none(), "a single pipeline pass never yields more than two orders");
            self.second = Some(order);
        }
    }

    /// `true` if no order survived the risk gate this pass.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Iterate the orders in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &GatewayOrder> {
        self.first.iter().chain(self.second.iter())
    }
}

impl<'a> IntoIterator for &'a OrderBatch {
    type Item = &'a GatewayOrder;
    type IntoIter = std::iter::Chain<std::option::Iter<'a, GatewayOrder>, std::option::Iter<'a, GatewayOrder>>;

    fn into_iter(self) -> Self::IntoIter {
        self.first.iter().chain(self.second.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::TickerId;

    fn order(id: u64) -> GatewayOrder {
        GatewayOrder { client_order_id: id, ticker_id: TickerId::new(1).unwrap(), is_buy: true, price: Price::ZERO, qty: Qty::ZERO }
    }

    #[test]
    fn empty_batch_reports_empty() {
        assert!(OrderBatch::default().is_empty());
    }

    #[test]
    fn holds_up_to_two_orders_in_push_order() {
        let mut batch = OrderBatch::default();
        batch.push(order(1));
        batch.push(order(2));
        let ids: Vec<u64> = batch.iter().map(|o| o.client_order_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
