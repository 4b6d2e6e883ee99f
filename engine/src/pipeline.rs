//! The trade-engine pipeline: book update → feature update → strategy
//! evaluation → risk gate → order manager, all on the calling thread.
//!
//! [`TradeEngine`] holds no rings itself — [`crate::runtime::run`] owns
//! polling and cancellation. This keeps the pipeline synchronous and
//! directly unit-testable, one [`common::market::MarketUpdate`] at a time.

use crate::instrument::Instrument;
use crate::order_batch::{GatewayOrder, OrderBatch};
use common::market::{MarketUpdate, UpdateType};
use common::position::Position;
use common::types::{MAX_TICKERS, Price, Qty, TickerId, Ts};
use config::EngineConfig;
use features::Features;
use oms::{OmsError, OrderManager, OrderResponse};
use persist::{PersistRecord, PersistSink, RecordType};
use risk::{RiskGate, RiskLimits};
use strategy::{
    LiquidityTaker, LiquidityTakerConfig, MarketMaker, MarketMakerConfig, Strategy, StrategyAction, StrategyIntent,
    StrategyKind,
};

/// Running counters surfaced for diagnostics; not wired to an external
/// observability sink in this crate (no HTTP/metrics transport — see
/// the workspace's scope boundary).
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCounters {
    /// Risk-gate rejections across every ticker.
    pub risk_rejections: u64,
    /// Invariant violations: pool exhaustion or illegal OMS transitions.
    pub invariant_violations: u64,
}

/// Owns every instrument's book/feature/position state, the shared risk
/// gate, the order manager, and the configured strategy cores. One
/// instance is driven by exactly one thread.
pub struct TradeEngine<const N: usize> {
    tickers: Vec<Option<Instrument<N>>>,
    risk: RiskGate,
    oms: OrderManager,
    market_maker: Option<MarketMaker>,
    liquidity_taker: Option<LiquidityTaker>,
    persist: Option<PersistSink>,
    arbitrage_logged: bool,
    counters: EngineCounters,
}

impl<const N: usize> TradeEngine<N> {
    /// Build an engine with an empty ticker table. Strategy cores are
    /// optional: a deployment running only liquidity-taking need not
    /// configure a market maker, and vice versa.
    #[must_use]
    pub fn new(
        order_capacity: usize,
        risk_limits: RiskLimits,
        market_maker: Option<MarketMaker>,
        liquidity_taker: Option<LiquidityTaker>,
        persist: Option<PersistSink>,
    ) -> Self {
        Self {
            tickers: (0..MAX_TICKERS).map(|_| None).collect(),
            risk: RiskGate::new(risk_limits),
            oms: OrderManager::new(order_capacity),
            market_maker,
            liquidity_taker,
            persist,
            arbitrage_logged: false,
            counters: EngineCounters::default(),
        }
    }

    /// Start tracking `ticker_id`, evaluated under `strategy_kind` on every
    /// subsequent update.
    pub fn register_ticker(&mut self, ticker_id: TickerId, strategy_kind: StrategyKind) {
        self.tickers[ticker_id.index()] = Some(Instrument::new(ticker_id, strategy_kind));
    }

    /// Build an engine shell from a validated [`EngineConfig`]: risk limits
    /// and the market-making core come straight from `[trading]` and
    /// `[strategies.market_maker]`. `[strategies]` has no liquidity-taker
    /// table yet, so that core runs with a built-in default until one is
    /// added; ticker registration is the caller's concern, since `config`
    /// has no symbol-to-[`TickerId`] mapping of its own.
    #[must_use]
    pub fn from_config(cfg: &EngineConfig, persist: Option<PersistSink>) -> Self {
        let risk_limits = RiskLimits {
            min_price: Price::from_ticks(1),
            max_price: Price::from_f64(1_000_000.0),
            min_size: Qty::from_units(1),
            max_size: Qty::from_units(cfg.trading.max_order_size),
            max_position_value: cfg.trading.max_position_value,
            position_limit_per_symbol: cfg.trading.position_limit_per_symbol,
            max_daily_loss: cfg.trading.max_daily_loss,
            max_order_rate_per_sec: cfg.trading.max_order_rate_per_sec,
        };

        let market_maker = cfg.strategies.market_maker.as_ref().map(|mm| {
            MarketMaker::new(MarketMakerConfig {
                spread_bps: mm.spread_bps,
                min_edge_bps: mm.min_edge_bps,
                quote_size: Qty::from_units(mm.quote_size),
                inventory_limit: mm.inventory_limit,
                quote_lifetime_ms: mm.quote_lifetime_ms,
                skew_enabled: mm.skew_enabled,
            })
        });
        let liquidity_taker = Some(LiquidityTaker::new(default_liquidity_taker_config()));

        let order_capacity = cfg.performance.order_queue_size as usize;
        Self::new(order_capacity, risk_limits, market_maker, liquidity_taker, persist)
    }

    /// Current diagnostic counters.
    #[must_use]
    pub const fn counters(&self) -> EngineCounters {
        self.counters
    }

    /// Look up a registered ticker's current position, if any.
    #[must_use]
    pub fn position(&self, ticker_id: TickerId) -> Option<Position> {
        self.tickers.get(ticker_id.index())?.as_ref().map(|i| i.position)
    }

    /// Apply one market update: updates the book and features, evaluates
    /// the assigned strategy, and risk-gates and submits any resulting
    /// intent. Returns the (possibly empty) batch of orders that survived
    /// the gate, for the caller to forward to the order-gateway ring.
    pub fn on_market_update(&mut self, update: &MarketUpdate, now: Ts) -> OrderBatch {
        let mut batch = OrderBatch::default();
        let idx = update.ticker_id.index();
        if idx >= self.tickers.len() {
            return batch;
        }

        let Some((strategy_kind, inventory, current_features)) = self.apply_to_instrument(idx, update, now) else {
            return batch;
        };

        let Some(intent) = self.evaluate_strategy(strategy_kind, update.ticker_id, &current_features, inventory, now)
        else {
            return batch;
        };

        self.submit_intent(intent, now, &mut batch);
        batch
    }

    fn apply_to_instrument(
        &mut self,
        idx: usize,
        update: &MarketUpdate,
        now: Ts,
    ) -> Option<(StrategyKind, i64, Features)> {
        let instrument = self.tickers[idx].as_mut()?;
        let result = instrument.book.apply_update(update);
        if !matches!(result, orderbook::UpdateResult::Accepted) {
            return None;
        }

        if let Some(sink) = &self.persist {
            sink.record(tick_record(update));
        }

        if update.update_type == UpdateType::Trade {
            instrument.features.on_trade(update.side, update.qty, now);
        }
        let current_features = instrument.features.on_book_update(&instrument.book);
        if let Some(mid) = current_features.mid {
            instrument.position.mark(mid, now);
        }

        Some((instrument.strategy_kind, instrument.position.net_qty(), current_features))
    }

    fn evaluate_strategy(
        &mut self,
        kind: StrategyKind,
        ticker_id: TickerId,
        features: &Features,
        inventory: i64,
        now: Ts,
    ) -> Option<StrategyIntent> {
        match kind {
            StrategyKind::MarketMaker => self.market_maker.as_mut()?.on_features(ticker_id, features, now, inventory),
            StrategyKind::LiquidityTaker => {
                self.liquidity_taker.as_mut()?.on_features(ticker_id, features, now, inventory)
            }
            StrategyKind::Arbitrage => {
                if !self.arbitrage_logged {
                    self.arbitrage_logged = true;
                    tracing::debug!("arbitrage strategy is configured but not implemented; skipping evaluation");
                }
                None
            }
        }
    }

    fn submit_intent(&mut self, intent: StrategyIntent, now: Ts, batch: &mut OrderBatch) {
        let Some(position) = self.position(intent.ticker_id) else { return };
        match intent.action {
            StrategyAction::Quote { bid_price, bid_qty, ask_price, ask_qty } => {
                self.try_submit(intent.ticker_id, true, bid_price, bid_qty, &position, now, batch);
                self.try_submit(intent.ticker_id, false, ask_price, ask_qty, &position, now, batch);
            }
            StrategyAction::Order { is_buy, price, qty } => {
                self.try_submit(intent.ticker_id, is_buy, price, qty, &position, now, batch);
            }
        }
    }

    fn try_submit(
        &mut self,
        ticker_id: TickerId,
        is_buy: bool,
        price: Price,
        qty: Qty,
        position: &Position,
        now: Ts,
        batch: &mut OrderBatch,
    ) {
        if self.risk.check(is_buy, price, qty, position, now).is_err() {
            self.counters.risk_rejections += 1;
            return;
        }
        match self.oms.submit(ticker_id, is_buy, price, qty, now) {
            Ok(client_order_id) => batch.push(GatewayOrder { client_order_id, ticker_id, is_buy, price, qty }),
            Err(err) => {
                self.counters.invariant_violations += 1;
                tracing::error!(ticker = %ticker_id, %err, "order submission failed");
            }
        }
    }

    /// Apply a venue acknowledgement: marks the fill against the
    /// instrument's position (if any) before handing the response to the
    /// order manager's state machine.
    ///
    /// # Errors
    /// Propagates [`OmsError`] for an unknown order id or an illegal state
    /// transition; the offending order is quarantined, not dropped.
    pub fn on_order_response(&mut self, response: OrderResponse, now: Ts) -> Result<(), OmsError> {
        if let OrderResponse::Fill { client_order_id, fill_qty, fill_price } = response {
            if let Some(order) = self.oms.get(client_order_id).copied() {
                if let Some(instrument) = self.tickers.get_mut(order.ticker_id.index()).and_then(Option::as_mut) {
                    instrument.position.apply_fill(order.is_buy, fill_qty, fill_price, now);
                }
            }
        }

        let result = self.oms.apply_response(response, now);
        if matches!(result, Err(OmsError::IllegalTransition { .. })) {
            self.counters.invariant_violations += 1;
        }
        result
    }
}

/// Liquidity-taker tunables used until `config` defines a matching
/// `[strategies.liquidity_taker]` table.
fn default_liquidity_taker_config() -> LiquidityTakerConfig {
    LiquidityTakerConfig {
        imbalance_threshold: 0.6,
        agg_ratio_threshold: 0.65,
        max_slippage_ticks: 5,
        clip: Qty::from_units(1),
        min_size: Qty::from_units(1),
        max_size: Qty::from_units(100),
        cooldown_ms: 250,
    }
}

fn tick_record(update: &MarketUpdate) -> PersistRecord {
    let payload = bincode::serialize(update).unwrap_or_default();
    PersistRecord::new(update.timestamp_ns, update.ticker_id, RecordType::Tick, payload)
}
