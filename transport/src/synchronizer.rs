//! Exchange synchronizers: turn a snapshot endpoint plus an update stream
//! into a consistent sequence of [`MarketUpdate`]s for the engine-bound
//! ring, per the two venue protocols in use. Both emit a `Clear` before
//! resuming after a disconnect or a detected gap, per the shared contract.
//!
//! The incremental synchronizer's gap check follows the Binance depth-update
//! contract: `first_update_id` must not exceed `last_update_id + 1`, and
//! each event chains from the prior event's final id.

use common::market::{MarketUpdate, Side, UpdateType};
use common::types::{Price, Qty, TickerId, Ts};

/// State of an incremental-with-prev-id synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalState {
    /// No connection; nothing buffered.
    Disconnected,
    /// Connected, staging incoming events until a snapshot is fetched.
    Buffering,
    /// Snapshot fetched, replaying staged events to catch up.
    Syncing,
    /// Caught up; incremental events are applied directly.
    Synced,
}

/// One staged incremental event, venue-agnostic shape matching the fields
/// §4.4 requires for bootstrap and gap checking.
#[derive(Debug, Clone)]
pub struct IncrementalEvent {
    /// First update id covered by this event.
    pub first_update_id: u64,
    /// Last update id covered by this event.
    pub final_update_id: u64,
    /// Final update id of the event this one chains from. `0` if absent.
    pub previous_update_id: u64,
    /// Level changes carried by this event.
    pub levels: Vec<LevelChange>,
    /// Event production time.
    pub timestamp_ns: Ts,
}

/// One price-level change within an incremental event or snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LevelChange {
    /// Side affected.
    pub side: Side,
    /// Price of the level.
    pub price: Price,
    /// New absolute quantity. Zero means delete.
    pub qty: Qty,
}

/// REST depth snapshot used to bootstrap an incremental synchronizer.
#[derive(Debug, Clone)]
pub struct DepthSnapshot {
    /// Id of the last update already reflected in this snapshot.
    pub last_update_id: u64,
    /// Resting levels at the time of the snapshot.
    pub levels: Vec<LevelChange>,
}

/// Synchronizer for the incremental-with-prev-id protocol (venue A):
/// `Disconnected → Buffering → Syncing → Synced → (gap) → Syncing`.
pub struct IncrementalSynchronizer {
    ticker_id: TickerId,
    state: IncrementalState,
    staged: Vec<IncrementalEvent>,
    last_update_id: u64,
    max_staged: usize,
}

impl IncrementalSynchronizer {
    /// Build a synchronizer for `ticker_id`, staging up to `max_staged`
    /// events while waiting on the REST snapshot.
    #[must_use]
    pub fn new(ticker_id: TickerId, max_staged: usize) -> Self {
        Self {
            ticker_id,
            state: IncrementalState::Disconnected,
            staged: Vec::new(),
            last_update_id: 0,
            max_staged,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> IncrementalState {
        self.state
    }

    /// Connection established: start buffering incoming events and request
    /// a REST snapshot be fetched.
    pub fn on_connected(&mut self) {
        self.state = IncrementalState::Buffering;
        self.staged.clear();
    }

    /// Connection lost: emit a `Clear` and return to `Disconnected`.
    pub fn on_disconnected(&mut self, now: Ts) -> MarketUpdate {
        self.state = IncrementalState::Disconnected;
        self.staged.clear();
        self.last_update_id = 0;
        MarketUpdate::clear(self.ticker_id, 0, now)
    }

    /// Stage one incremental event while `Buffering`; oldest events are
    /// dropped once `max_staged` is exceeded, matching the bounded-ring
    /// staging area described in §4.4.
    pub fn stage(&mut self, event: IncrementalEvent) {
        if self.state != IncrementalState::Buffering {
            return;
        }
        self.staged.push(event);
        if self.staged.len() > self.max_staged {
            self.staged.remove(0);
        }
    }

    /// Apply the REST snapshot fetched while buffering, replaying staged
    /// events whose window overlaps it. Returns the `MarketUpdate`s to
    /// forward to the book: a `Clear` followed by the snapshot levels and
    /// any replayed incremental levels. Restarts from `Buffering` if the
    /// first qualifying staged event doesn't bridge the snapshot, or if a
    /// later staged event doesn't chain from the one replayed before it.
    pub fn on_snapshot(&mut self, snapshot: DepthSnapshot, now: Ts) -> Vec<MarketUpdate> {
        self.staged.retain(|event| event.final_update_id > snapshot.last_update_id);

        let Some(first) = self.staged.first() else {
            self.state = IncrementalState::Syncing;
            self.last_update_id = snapshot.last_update_id;
            return snapshot_updates(self.ticker_id, &snapshot, now);
        };

        if first.first_update_id > snapshot.last_update_id + 1 {
            self.state = IncrementalState::Buffering;
            self.staged.clear();
            return Vec::new();
        }

        let mut updates = snapshot_updates(self.ticker_id, &snapshot, now);
        self.last_update_id = snapshot.last_update_id;
        let staged = std::mem::take(&mut self.staged);
        self.state = IncrementalState::Syncing;
        for (i, event) in staged.into_iter().enumerate() {
            // The first staged event only needs to bridge the snapshot
            // (checked above); every later event must chain from the one
            // before it, exactly like the live `apply()` gap check.
            if i > 0 && event.previous_update_id != 0 && event.previous_update_id != self.last_update_id {
                self.state = IncrementalState::Buffering;
                self.staged.clear();
                updates.push(MarketUpdate::clear(self.ticker_id, 0, now));
                return updates;
            }
            updates.extend(self.apply_synced(&event));
        }
        updates
    }

    /// Apply one live incremental event once `Syncing` or `Synced`. Returns
    /// the level updates on success, or a single `Clear` and a restart to
    /// `Buffering` if the chain breaks.
    pub fn apply(&mut self, event: &IncrementalEvent, now: Ts) -> Vec<MarketUpdate> {
        match self.state {
            IncrementalState::Disconnected | IncrementalState::Buffering => {
                self.stage(event.clone());
                Vec::new()
            }
            IncrementalState::Syncing | IncrementalState::Synced => {
                if event.previous_update_id != 0 && event.previous_update_id != self.last_update_id {
                    self.state = IncrementalState::Buffering;
                    self.staged.clear();
                    return vec![MarketUpdate::clear(self.ticker_id, 0, now)];
                }
                self.apply_synced(event)
            }
        }
    }

    fn apply_synced(&mut self, event: &IncrementalEvent) -> Vec<MarketUpdate> {
        self.state = IncrementalState::Synced;
        self.last_update_id = event.final_update_id;
        event
            .levels
            .iter()
            .map(|level| {
                let update_type = if level.qty.is_zero() { UpdateType::Delete } else { UpdateType::Add };
                MarketUpdate::level(
                    self.ticker_id,
                    update_type,
                    level.side,
                    level.price,
                    level.qty,
                    event.final_update_id,
                    event.previous_update_id,
                    event.timestamp_ns,
                )
            })
            .collect()
    }
}

fn snapshot_updates(ticker_id: TickerId, snapshot: &DepthSnapshot, now: Ts) -> Vec<MarketUpdate> {
    let mut updates = vec![MarketUpdate::clear(ticker_id, snapshot.last_update_id, now)];
    updates.extend(snapshot.levels.iter().map(|level| {
        MarketUpdate::level(ticker_id, UpdateType::Add, level.side, level.price, level.qty, snapshot.last_update_id, 0, now)
    }));
    updates
}

/// State of a partial-snapshot synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialState {
    /// No connection.
    Disconnected,
    /// At least one valid snapshot frame has been applied.
    Synced,
}

/// One self-contained top-N snapshot frame for the partial-snapshot
/// protocol (venue B).
#[derive(Debug, Clone)]
pub struct PartialSnapshotFrame {
    /// Venue-assigned monotonically increasing sequence for this frame.
    pub sequence: u64,
    /// Levels carried by the frame.
    pub levels: Vec<LevelChange>,
    /// Frame production time.
    pub timestamp_ns: Ts,
}

/// Synchronizer for the partial-snapshot protocol (venue B):
/// `Disconnected → Synced → Disconnected`. No REST phase; each frame is
/// self-contained and requires only a monotonic sequence check.
pub struct PartialSnapshotSynchronizer {
    ticker_id: TickerId,
    state: PartialState,
    last_sequence: u64,
}

impl PartialSnapshotSynchronizer {
    /// Build a synchronizer for `ticker_id`.
    #[must_use]
    pub const fn new(ticker_id: TickerId) -> Self {
        Self { ticker_id, state: PartialState::Disconnected, last_sequence: 0 }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PartialState {
        self.state
    }

    /// Connection lost: emit a `Clear` and return to `Disconnected`.
    pub fn on_disconnected(&mut self, now: Ts) -> MarketUpdate {
        self.state = PartialState::Disconnected;
        self.last_sequence = 0;
        MarketUpdate::clear(self.ticker_id, 0, now)
    }

    /// Apply one frame. Out-of-order or duplicate frames (`sequence` not
    /// strictly greater than the last accepted one) are dropped and an
    /// empty vec is returned. The frame is a self-contained top-N snapshot,
    /// so every level is emitted as a `Clear` followed by `Snapshot`-tagged
    /// levels rather than `Add`-tagged ones.
    pub fn apply(&mut self, frame: &PartialSnapshotFrame) -> Vec<MarketUpdate> {
        if self.state == PartialState::Synced && frame.sequence <= self.last_sequence {
            return Vec::new();
        }
        self.state = PartialState::Synced;
        self.last_sequence = frame.sequence;
        let mut updates = vec![MarketUpdate::clear(self.ticker_id, frame.sequence, frame.timestamp_ns)];
        updates.extend(frame.levels.iter().map(|level| {
            MarketUpdate::level(
                self.ticker_id,
                UpdateType::Snapshot,
                level.side,
                level.price,
                level.qty,
                frame.sequence,
                0,
                frame.timestamp_ns,
            )
        }));
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> TickerId {
        TickerId::new(1).unwrap()
    }

    fn level(side: Side, price: f64, qty: u64) -> LevelChange {
        LevelChange { side, price: Price::from_f64(price), qty: Qty::from_units(qty) }
    }

    #[test]
    fn incremental_bootstraps_from_snapshot_with_no_staged_events() {
        let mut sync = IncrementalSynchronizer::new(ticker(), 16);
        sync.on_connected();
        let snapshot = DepthSnapshot { last_update_id: 100, levels: vec![level(Side::Bid, 100.0, 5)] };
        let updates = sync.on_snapshot(snapshot, Ts::from_nanos(1));
        assert_eq!(sync.state(), IncrementalState::Syncing);
        assert!(matches!(updates[0].update_type, UpdateType::Clear));
    }

    #[test]
    fn incremental_replays_staged_events_that_bridge_the_snapshot() {
        let mut sync = IncrementalSynchronizer::new(ticker(), 16);
        sync.on_connected();
        sync.stage(IncrementalEvent {
            first_update_id: 95,
            final_update_id: 105,
            previous_update_id: 0,
            levels: vec![level(Side::Bid, 101.0, 3)],
            timestamp_ns: Ts::from_nanos(1),
        });
        let snapshot = DepthSnapshot { last_update_id: 100, levels: vec![level(Side::Bid, 100.0, 5)] };
        let updates = sync.on_snapshot(snapshot, Ts::from_nanos(2));
        assert_eq!(sync.state(), IncrementalState::Synced);
        assert_eq!(sync.last_update_id, 105);
        assert!(updates.len() > 1);
    }

    #[test]
    fn incremental_restarts_buffering_on_a_gap_among_replayed_staged_events() {
        let mut sync = IncrementalSynchronizer::new(ticker(), 16);
        sync.on_connected();
        sync.stage(IncrementalEvent {
            first_update_id: 95,
            final_update_id: 105,
            previous_update_id: 0,
            levels: vec![level(Side::Bid, 101.0, 3)],
            timestamp_ns: Ts::from_nanos(1),
        });
        // Chains from 110, not 105: a gap inside the staged buffer itself.
        sync.stage(IncrementalEvent {
            first_update_id: 111,
            final_update_id: 120,
            previous_update_id: 110,
            levels: vec![level(Side::Bid, 102.0, 1)],
            timestamp_ns: Ts::from_nanos(2),
        });
        let snapshot = DepthSnapshot { last_update_id: 100, levels: vec![level(Side::Bid, 100.0, 5)] };
        let updates = sync.on_snapshot(snapshot, Ts::from_nanos(3));
        assert_eq!(sync.state(), IncrementalState::Buffering);
        assert!(sync.staged.is_empty());
        assert!(matches!(updates.last().unwrap().update_type, UpdateType::Clear));
    }

    #[test]
    fn incremental_restarts_buffering_when_first_staged_event_does_not_bridge() {
        let mut sync = IncrementalSynchronizer::new(ticker(), 16);
        sync.on_connected();
        sync.stage(IncrementalEvent {
            first_update_id: 150,
            final_update_id: 160,
            previous_update_id: 140,
            levels: vec![],
            timestamp_ns: Ts::from_nanos(1),
        });
        let snapshot = DepthSnapshot { last_update_id: 100, levels: vec![] };
        let updates = sync.on_snapshot(snapshot, Ts::from_nanos(2));
        assert_eq!(sync.state(), IncrementalState::Buffering);
        assert!(updates.is_empty());
    }

    #[test]
    fn incremental_chain_break_forces_resync() {
        let mut sync = IncrementalSynchronizer::new(ticker(), 16);
        sync.on_connected();
        let snapshot = DepthSnapshot { last_update_id: 100, levels: vec![] };
        sync.on_snapshot(snapshot, Ts::from_nanos(1));

        let good = IncrementalEvent {
            first_update_id: 101,
            final_update_id: 105,
            previous_update_id: 100,
            levels: vec![level(Side::Bid, 100.0, 1)],
            timestamp_ns: Ts::from_nanos(2),
        };
        assert!(!sync.apply(&good, Ts::from_nanos(2)).is_empty());

        let broken = IncrementalEvent {
            first_update_id: 110,
            final_update_id: 115,
            previous_update_id: 109,
            levels: vec![],
            timestamp_ns: Ts::from_nanos(3),
        };
        let updates = sync.apply(&broken, Ts::from_nanos(3));
        assert_eq!(sync.state(), IncrementalState::Buffering);
        assert!(matches!(updates[0].update_type, UpdateType::Clear));
    }

    #[test]
    fn partial_drops_out_of_order_frames() {
        let mut sync = PartialSnapshotSynchronizer::new(ticker());
        let first = PartialSnapshotFrame { sequence: 10, levels: vec![], timestamp_ns: Ts::from_nanos(1) };
        assert!(!sync.apply(&first).is_empty());
        let stale = PartialSnapshotFrame { sequence: 5, levels: vec![], timestamp_ns: Ts::from_nanos(2) };
        assert!(sync.apply(&stale).is_empty());
        assert_eq!(sync.state(), PartialState::Synced);
    }

    #[test]
    fn partial_snapshot_frame_levels_are_tagged_snapshot() {
        let mut sync = PartialSnapshotSynchronizer::new(ticker());
        let frame = PartialSnapshotFrame {
            sequence: 10,
            levels: vec![level(Side::Bid, 99.0, 5), level(Side::Ask, 101.0, 5)],
            timestamp_ns: Ts::from_nanos(1),
        };
        let updates = sync.apply(&frame);
        assert!(matches!(updates[0].update_type, UpdateType::Clear));
        assert!(updates[1..].iter().all(|u| matches!(u.update_type, UpdateType::Snapshot)));
    }

    #[test]
    fn partial_disconnect_clears_and_resets() {
        let mut sync = PartialSnapshotSynchronizer::new(ticker());
        let frame = PartialSnapshotFrame { sequence: 10, levels: vec![], timestamp_ns: Ts::from_nanos(1) };
        sync.apply(&frame);
        let clear = sync.on_disconnected(Ts::from_nanos(2));
        assert!(matches!(clear.update_type, UpdateType::Clear));
        assert_eq!(sync.state(), PartialState::Disconnected);
    }
}
