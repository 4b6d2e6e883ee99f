//! Per-instrument state the trade-engine thread owns exclusively: the book,
//! the feature engine, and the running position.

use common::position::Position;
use orderbook::OrderBook;
use strategy::StrategyKind;

/// One ticker's book, features, position, and assigned strategy. All
/// fields are touched only by the engine thread; readers elsewhere see a
/// sequence-tagged snapshot via [`orderbook::OrderBook::read_consistent`].
pub struct Instrument<const N: usize> {
    pub(crate) book: OrderBook<N>,
    pub(crate) features: features::FeatureEngine,
    pub(crate) position: Position,
    pub(crate) strategy_kind: StrategyKind,
}

impl<const N: usize> Instrument<N> {
    pub(crate) fn new(ticker_id: common::types::TickerId, strategy_kind: StrategyKind) -> Self {
        Self {
            book: OrderBook::new(ticker_id),
            features: features::FeatureEngine::new(ticker_id),
            position: Position::default(),
            strategy_kind,
        }
    }
}
