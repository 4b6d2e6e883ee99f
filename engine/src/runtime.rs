//! The trade-engine thread's run loop: round-robin poll of every input
//! ring, a sleep-zero yield once the idle threshold is crossed, and a
//! bounded drain on shutdown. No cooperative-suspension primitive is used;
//! the only blocking call in this module is the thread's own `yield_now`,
//! which never parks.

use crate::pipeline::TradeEngine;
use common::market::MarketUpdate;
use oms::OrderResponse;
use primitives::{SpscRing, TimestampSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long the engine keeps draining already-queued ring entries after
/// `shutdown` is observed, before force-abandoning the rest.
pub const DRAIN_DEADLINE: Duration = Duration::from_millis(500);

/// Consecutive empty poll rounds before the thread yields instead of
/// busy-spinning. Chosen so a burst of traffic never pays a yield's
/// scheduling latency, but a genuinely idle engine doesn't spin a core at
/// 100% for no reason.
pub const DEFAULT_IDLE_YIELD_THRESHOLD: u32 = 256;

/// Drive `engine` until `shutdown` is set, then drain remaining queued
/// entries for up to [`DRAIN_DEADLINE`] before returning.
///
/// `market_data` may hold one ring per market-data connection; `orders_out`
/// carries the resulting [`crate::order_batch::GatewayOrder`]s to the
/// order-gateway thread; `responses_in` carries venue acknowledgements
/// back from it.
pub fn run<const N: usize, const MKT: usize, const ORD: usize, const RESP: usize>(
    engine: &mut TradeEngine<N>,
    market_data: &[&SpscRing<MarketUpdate, MKT>],
    orders_out: &SpscRing<crate::order_batch::GatewayOrder, ORD>,
    responses_in: &SpscRing<OrderResponse, RESP>,
    shutdown: &AtomicBool,
    clock: &TimestampSource,
) {
    let mut empty_rounds: u32 = 0;

    loop {
        if shutdown.load(Ordering::Acquire) {
            drain(engine, market_data, orders_out, responses_in, clock);
            return;
        }

        if poll_once(engine, market_data, orders_out, responses_in, clock) {
            empty_rounds = 0;
        } else {
            empty_rounds = empty_rounds.saturating_add(1);
            if empty_rounds >= DEFAULT_IDLE_YIELD_THRESHOLD {
                std::thread::yield_now();
            }
        }
    }
}

fn drain<const N: usize, const MKT: usize, const ORD: usize, const RESP: usize>(
    engine: &mut TradeEngine<N>,
    market_data: &[&SpscRing<MarketUpdate, MKT>],
    orders_out: &SpscRing<crate::order_batch::GatewayOrder, ORD>,
    responses_in: &SpscRing<OrderResponse, RESP>,
    clock: &TimestampSource,
) {
    let deadline = Instant::now() + DRAIN_DEADLINE;
    while Instant::now() < deadline {
        if !poll_once(engine, market_data, orders_out, responses_in, clock) {
            break;
        }
    }
}

fn poll_once<const N: usize, const MKT: usize, const ORD: usize, const RESP: usize>(
    engine: &mut TradeEngine<N>,
    market_data: &[&SpscRing<MarketUpdate, MKT>],
    orders_out: &SpscRing<crate::order_batch::GatewayOrder, ORD>,
    responses_in: &SpscRing<OrderResponse, RESP>,
    clock: &TimestampSource,
) -> bool {
    let mut made_progress = false;

    for ring in market_data {
        // SAFETY: each ring has exactly one producer (its I/O thread) and
        // this run loop is the sole consumer.
        if let Some(update) = unsafe { ring.pop() } {
            made_progress = true;
            let now = clock.now();
            let batch = engine.on_market_update(&update, now);
            for order in &batch {
                // SAFETY: this run loop is the sole producer onto `orders_out`.
                let _ = unsafe { orders_out.push(*order) };
            }
        }
    }

    // SAFETY: this run loop is the sole consumer of `responses_in`.
    if let Some(response) = unsafe { responses_in.pop() } {
        made_progress = true;
        let now = clock.now();
        let _ = engine.on_order_response(response, now);
    }

    made_progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_batch::GatewayOrder;
    use common::market::{Side, UpdateType};
    use common::types::{Price, Qty, TickerId, Ts};
    use risk::RiskLimits;
    use strategy::StrategyKind;

    fn risk_limits() -> RiskLimits {
        RiskLimits {
            min_price: Price::from_f64(0.01),
            max_price: Price::from_f64(1_000_000.0),
            min_size: Qty::from_units(1),
            max_size: Qty::from_units(10_000),
            max_position_value: 1_000_000_000,
            position_limit_per_symbol: 100_000,
            max_daily_loss: 1_000_000,
            max_order_rate_per_sec: 1_000,
        }
    }

    #[test]
    fn shutdown_drains_a_queued_update_before_returning() {
        let mut engine: TradeEngine<5> = TradeEngine::new(16, risk_limits(), None, None, None);
        let ticker = TickerId::new(1).unwrap();
        engine.register_ticker(ticker, StrategyKind::LiquidityTaker);

        let market_ring: SpscRing<MarketUpdate, 4> = SpscRing::new();
        let order_ring: SpscRing<GatewayOrder, 4> = SpscRing::new();
        let response_ring: SpscRing<OrderResponse, 4> = SpscRing::new();
        let shutdown = AtomicBool::new(true);
        let clock = TimestampSource::new();

        unsafe {
            market_ring
                .push(MarketUpdate::level(ticker, UpdateType::Add, Side::Bid, Price::from_f64(100.0), Qty::from_units(10), 1, 0, Ts::ZERO))
                .unwrap();
        }

        run(&mut engine, &[&market_ring], &order_ring, &response_ring, &shutdown, &clock);

        assert!(market_ring.is_empty());
    }

    #[test]
    fn poll_once_reports_no_progress_on_empty_rings() {
        let mut engine: TradeEngine<5> = TradeEngine::new(16, risk_limits(), None, None, None);
        let market_ring: SpscRing<MarketUpdate, 4> = SpscRing::new();
        let order_ring: SpscRing<GatewayOrder, 4> = SpscRing::new();
        let response_ring: SpscRing<OrderResponse, 4> = SpscRing::new();
        let clock = TimestampSource::new();

        assert!(!poll_once(&mut engine, &[&market_ring], &order_ring, &response_ring, &clock));
    }
}
