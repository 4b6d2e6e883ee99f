//! Fixed-depth, allocation-free order book for a single instrument.

use common::market::{MarketUpdate, Side, UpdateType};
use common::types::{Price, Qty, TickerId, Ts};
use std::sync::atomic::{AtomicU64, Ordering};

/// One resting price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    /// Price at this level.
    pub price: Price,
    /// Resting quantity.
    pub qty: Qty,
    /// Order count at this level. The transport layer rarely supplies this
    /// per venue L2 feeds, so it is carried for structural completeness and
    /// defaults to 1 whenever a level is inserted or refreshed.
    pub order_count: u32,
}

impl Level {
    const EMPTY: Self = Self {
        price: Price::ZERO,
        qty: Qty::ZERO,
        order_count: 0,
    };
}

/// Outcome of [`OrderBook::apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// Applied to the book.
    Accepted,
    /// Discarded: `update.sequence` did not advance the book.
    Stale,
    /// Discarded: `update.previous_sequence` did not chain from the last
    /// applied sequence. The synchronizer is expected to resync.
    Gap,
    /// Discarded: applying the update would leave the book crossed.
    Invalid,
}

/// Fixed-capacity snapshot of both sides of a book, safe to copy across
/// threads without touching the live book.
#[derive(Debug, Clone, Copy)]
pub struct FixedSnapshot<const N: usize> {
    /// Ticker this snapshot is for.
    pub ticker_id: TickerId,
    /// Bid levels, best first.
    pub bids: [Level; N],
    /// Number of valid bid levels.
    pub bid_len: usize,
    /// Ask levels, best first.
    pub asks: [Level; N],
    /// Number of valid ask levels.
    pub ask_len: usize,
    /// Sequence this snapshot was taken at.
    pub sequence: u64,
    /// Timestamp of the update that produced this snapshot.
    pub timestamp_ns: Ts,
}

/// Per-instrument order book: two fixed-depth, price-sorted arrays plus
/// sequence/timestamp bookkeeping. Exactly one thread — the trade-engine
/// thread — calls `apply_update`; other threads may read a consistent copy
/// via [`OrderBook::read_consistent`]'s seqlock-style retry loop.
pub struct OrderBook<const N: usize> {
    ticker_id: TickerId,
    bids: [Level; N],
    asks: [Level; N],
    bid_len: usize,
    ask_len: usize,
    last_sequence: AtomicU64,
    last_timestamp_ns: Ts,
    book_misses: u64,
}

impl<const N: usize> OrderBook<N> {
    /// Build an empty book for `ticker_id`.
    #[must_use]
    pub fn new(ticker_id: TickerId) -> Self {
        assert!(N > 0, "order book depth must be nonzero");
        Self {
            ticker_id,
            bids: [Level::EMPTY; N],
            asks: [Level::EMPTY; N],
            bid_len: 0,
            ask_len: 0,
            last_sequence: AtomicU64::new(0),
            last_timestamp_ns: Ts::ZERO,
            book_misses: 0,
        }
    }

    /// Instrument this book tracks.
    #[must_use]
    pub const fn ticker_id(&self) -> TickerId {
        self.ticker_id
    }

    /// Last applied sequence number (0 if no update has ever been applied).
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    /// Count of levels dropped because the book was already at depth `N`
    /// and the incoming level did not improve the worst resting level.
    #[must_use]
    pub const fn book_misses(&self) -> u64 {
        self.book_misses
    }

    /// Apply a normalized market update. Must only be called by the owning
    /// engine thread.
    pub fn apply_update(&mut self, update: &MarketUpdate) -> UpdateResult {
        let last_sequence = self.last_sequence.load(Ordering::Relaxed);

        if last_sequence != 0 && update.sequence <= last_sequence {
            return UpdateResult::Stale;
        }
        if update.previous_sequence != 0 && update.previous_sequence != last_sequence {
            return UpdateResult::Gap;
        }

        match update.update_type {
            UpdateType::Clear => {
                self.bids = [Level::EMPTY; N];
                self.asks = [Level::EMPTY; N];
                self.bid_len = 0;
                self.ask_len = 0;
            }
            UpdateType::Add | UpdateType::Modify | UpdateType::Snapshot => {
                if update.qty.is_zero() {
                    self.remove(update.side, update.price);
                } else {
                    self.upsert(update.side, update.price, update.qty);
                }
            }
            UpdateType::Delete => {
                self.remove(update.side, update.price);
            }
            UpdateType::Trade => {}
        }

        if self.is_crossed() {
            return UpdateResult::Invalid;
        }

        self.last_sequence.store(update.sequence, Ordering::Release);
        self.last_timestamp_ns = update.timestamp_ns;
        UpdateResult::Accepted
    }

    fn levels_mut(&mut self, side: Side) -> (&mut [Level; N], &mut usize) {
        match side {
            Side::Bid => (&mut self.bids, &mut self.bid_len),
            Side::Ask => (&mut self.asks, &mut self.ask_len),
        }
    }

    fn levels(&self, side: Side) -> (&[Level; N], usize) {
        match side {
            Side::Bid => (&self.bids, self.bid_len),
            Side::Ask => (&self.asks, self.ask_len),
        }
    }

    /// `true` if `a` should sort ahead of `b` on `side` (bids descending,
    /// asks ascending).
    fn better(side: Side, a: Price, b: Price) -> bool {
        match side {
            Side::Bid => a > b,
            Side::Ask => a < b,
        }
    }

    fn upsert(&mut self, side: Side, price: Price, qty: Qty) {
        let (levels, len) = self.levels_mut(side);

        if let Some(pos) = levels[..*len].iter().position(|l| l.price == price) {
            levels[pos].qty = qty;
            return;
        }

        let insert_at = levels[..*len]
            .iter()
            .position(|l| Self::better(side, price, l.price))
            .unwrap_or(*len);

        if insert_at >= N {
            self.book_misses += 1;
            return;
        }
        if *len < N {
            *len += 1;
        }
        // else: book is full and `insert_at < N`, so this level is strictly
        // better than the current worst resting level; it displaces it.

        let shift_end = (*len).min(N) - 1;
        let mut i = shift_end;
        while i > insert_at {
            levels[i] = levels[i - 1];
            i -= 1;
        }
        levels[insert_at] = Level {
            price,
            qty,
            order_count: 1,
        };
    }

    fn remove(&mut self, side: Side, price: Price) {
        let (levels, len) = self.levels_mut(side);
        let Some(pos) = levels[..*len].iter().position(|l| l.price == price) else {
            return;
        };
        for i in pos..(*len - 1) {
            levels[i] = levels[i + 1];
        }
        levels[*len - 1] = Level::EMPTY;
        *len -= 1;
    }

    /// Best bid level, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<Level> {
        (self.bid_len > 0).then_some(self.bids[0])
    }

    /// Best ask level, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<Level> {
        (self.ask_len > 0).then_some(self.asks[0])
    }

    /// Spread in raw ticks between best ask and best bid.
    #[must_use]
    pub fn spread(&self) -> Option<i64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Simple mid price (average of best bid/ask).
    #[must_use]
    pub fn mid(&self) -> Option<Price> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some(Price::from_ticks((bid.ticks() + ask.ticks()) / 2))
    }

    /// Size-weighted microprice: leans toward the side with less resting
    /// size, since that side is statistically more likely to trade through.
    #[must_use]
    pub fn microprice(&self) -> Option<Price> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        let total = bid.qty.units() + ask.qty.units();
        if total == 0 {
            return self.mid();
        }
        let bid_value = bid.price.ticks() * ask.qty.units() as i64;
        let ask_value = ask.price.ticks() * bid.qty.units() as i64;
        Some(Price::from_ticks((bid_value + ask_value) / total as i64))
    }

    /// Order-book imbalance over the top `depth` levels per side, in
    /// `[-1.0, 1.0]`: positive means bid-heavy.
    #[must_use]
    pub fn imbalance(&self, depth: usize) -> Option<f64> {
        let bid_qty = self.total_qty(Side::Bid, depth);
        let ask_qty = self.total_qty(Side::Ask, depth);
        let total = bid_qty + ask_qty;
        if total == 0 {
            return None;
        }
        Some((bid_qty as f64 - ask_qty as f64) / total as f64)
    }

    fn total_qty(&self, side: Side, depth: usize) -> u64 {
        let (levels, len) = self.levels(side);
        levels[..depth.min(len)].iter().map(|l| l.qty.units()).sum()
    }

    /// `true` if the best bid is at or above the best ask.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid.price >= ask.price)
    }

    /// `true` if the best bid equals the best ask exactly.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid.price == ask.price)
    }

    /// Copy the current book state into a [`FixedSnapshot`]. Allocation-free.
    #[must_use]
    pub fn snapshot(&self) -> FixedSnapshot<N> {
        FixedSnapshot {
            ticker_id: self.ticker_id,
            bids: self.bids,
            bid_len: self.bid_len,
            asks: self.asks,
            ask_len: self.ask_len,
            sequence: self.last_sequence.load(Ordering::Acquire),
            timestamp_ns: self.last_timestamp_ns,
        }
    }

    /// Take a consistent snapshot from a reader thread that does not own
    /// the book, using a seqlock-style read/copy/re-read retry against the
    /// atomic sequence counter. Loops until a torn read is ruled out.
    #[must_use]
    pub fn read_consistent(&self) -> FixedSnapshot<N> {
        loop {
            let before = self.last_sequence.load(Ordering::Acquire);
            let candidate = self.snapshot();
            let after = self.last_sequence.load(Ordering::Acquire);
            if before == after && candidate.sequence == after {
                return candidate;
            }
        }
    }

    /// Deterministic hash of book state, for replay-equivalence checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hash = 0u64;
        for level in &self.bids[..self.bid_len] {
            hash = hash.wrapping_mul(31).wrapping_add(level.price.ticks() as u64);
            hash = hash.wrapping_mul(31).wrapping_add(level.qty.units());
        }
        for level in &self.asks[..self.ask_len] {
            hash = hash.wrapping_mul(31).wrapping_add(level.price.ticks() as u64);
            hash = hash.wrapping_mul(31).wrapping_add(level.qty.units());
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> TickerId {
        TickerId::new(1).unwrap()
    }

    fn update(
        update_type: UpdateType,
        side: Side,
        price: f64,
        qty: u64,
        sequence: u64,
        previous_sequence: u64,
    ) -> MarketUpdate {
        MarketUpdate::level(
            ticker(),
            update_type,
            side,
            Price::from_f64(price),
            Qty::from_units(qty),
            sequence,
            previous_sequence,
            Ts::from_nanos(sequence),
        )
    }

    #[test]
    fn basic_add_and_best_levels() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        assert_eq!(
            book.apply_update(&update(UpdateType::Add, Side::Bid, 99.5, 100, 1, 0)),
            UpdateResult::Accepted
        );
        assert_eq!(
            book.apply_update(&update(UpdateType::Add, Side::Ask, 100.5, 150, 2, 0)),
            UpdateResult::Accepted
        );
        assert_eq!(book.best_bid().unwrap().price, Price::from_f64(99.5));
        assert_eq!(book.best_ask().unwrap().price, Price::from_f64(100.5));
        assert!(!book.is_crossed());
    }

    #[test]
    fn crossing_update_is_rejected_as_invalid() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Ask, 100.0, 100, 1, 0));
        let result = book.apply_update(&update(UpdateType::Add, Side::Bid, 101.0, 100, 2, 0));
        assert_eq!(result, UpdateResult::Invalid);
    }

    #[test]
    fn stale_sequence_is_discarded() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 5, 0));
        let result = book.apply_update(&update(UpdateType::Add, Side::Bid, 99.5, 10, 3, 0));
        assert_eq!(result, UpdateResult::Stale);
        assert_eq!(book.best_bid().unwrap().price, Price::from_f64(99.0));
    }

    #[test]
    fn gap_in_previous_sequence_is_discarded() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 5, 0));
        let result = book.apply_update(&update(UpdateType::Add, Side::Bid, 99.5, 10, 6, 999));
        assert_eq!(result, UpdateResult::Gap);
    }

    #[test]
    fn zero_qty_modify_deletes_the_level() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 1, 0));
        book.apply_update(&update(UpdateType::Modify, Side::Bid, 99.0, 0, 2, 0));
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn delete_on_nonexistent_level_is_a_noop() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 1, 0));
        let result = book.apply_update(&update(UpdateType::Delete, Side::Bid, 50.0, 0, 2, 0));
        assert_eq!(result, UpdateResult::Accepted);
        assert_eq!(book.best_bid().unwrap().price, Price::from_f64(99.0));
    }

    #[test]
    fn insertion_beyond_depth_is_dropped_unless_it_improves_worst_level() {
        let mut book: OrderBook<2> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 100.0, 10, 1, 0));
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 2, 0));
        assert_eq!(book.book_misses(), 0);

        // Worse than both resting levels: dropped, counted as a miss.
        book.apply_update(&update(UpdateType::Add, Side::Bid, 98.0, 10, 3, 0));
        assert_eq!(book.book_misses(), 1);
        assert_eq!(book.bid_len, 2);

        // Improves the worst level: displaces it.
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.5, 10, 4, 0));
        assert_eq!(book.bids[1].price, Price::from_f64(99.5));
    }

    #[test]
    fn clear_resets_both_sides() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 10, 1, 0));
        book.apply_update(&update(UpdateType::Add, Side::Ask, 101.0, 10, 2, 0));
        book.apply_update(&MarketUpdate::clear(ticker(), 3, Ts::from_nanos(3)));
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn snapshot_tagged_update_upserts_like_add() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 98.0, 10, 1, 0));
        // A resync burst: Clear wipes the side, then Snapshot-tagged levels
        // repopulate it, exactly like a Clear followed by Add-tagged levels.
        book.apply_update(&MarketUpdate::clear(ticker(), 2, Ts::from_nanos(2)));
        let result = book.apply_update(&update(UpdateType::Snapshot, Side::Bid, 99.0, 10, 3, 0));
        assert_eq!(result, UpdateResult::Accepted);
        assert_eq!(book.best_bid().unwrap().price, Price::from_f64(99.0));

        let result = book.apply_update(&update(UpdateType::Snapshot, Side::Bid, 99.0, 0, 4, 0));
        assert_eq!(result, UpdateResult::Accepted);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn microprice_leans_toward_thinner_side() {
        let mut book: OrderBook<5> = OrderBook::new(ticker());
        book.apply_update(&update(UpdateType::Add, Side::Bid, 99.0, 100, 1, 0));
        book.apply_update(&update(UpdateType::Add, Side::Ask, 101.0, 300, 2, 0));
        let micro = book.microprice().unwrap();
        let mid = book.mid().unwrap();
        assert!(micro.ticks() > mid.ticks());
    }

    #[test]
    fn state_hash_is_stable_under_identical_update_sequences() {
        let mut a: OrderBook<5> = OrderBook::new(ticker());
        let mut b: OrderBook<5> = OrderBook::new(ticker());
        for (i, (px, qty)) in [(99.0, 10), (98.5, 20), (98.0, 5)].iter().enumerate() {
            let u = update(UpdateType::Add, Side::Bid, *px, *qty, i as u64 + 1, 0);
            a.apply_update(&u);
            b.apply_update(&u);
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
