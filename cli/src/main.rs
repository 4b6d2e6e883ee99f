//! `tradecore` — boots the trade-engine thread from a validated
//! configuration file, wires CPU pinning and the tick persistence sink,
//! and drives orderly shutdown on `SIGINT`/`SIGTERM`.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use config::EngineConfig;
use engine::TradeEngine;
use primitives::{SpscRing, TimestampSource};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Book depth every `OrderBook` is built with. Fixed at compile time; the
/// const generic can't track a runtime config value.
const BOOK_DEPTH: usize = 20;
/// Compiled SPSC ring capacities. `[performance]` validates its queue-size
/// fields are powers of two but this binary does not read them back into
/// these consts — see [`warn_on_queue_size_mismatch`].
const MARKET_DATA_RING: usize = 1024;
const ORDER_RING: usize = 1024;
const RESPONSE_RING: usize = 1024;

/// Rolling segment size for persisted ticks; `[paths]` names the directory
/// but `config` has no knob for segment size yet.
const PERSIST_SEGMENT_BYTES: u64 = 64 * 1024 * 1024;

/// `SIGINT`/`SIGTERM`: config load failure (spec.md §6/§7).
const EXIT_INIT_FAILURE: u8 = 1;
/// Orderly shutdown initiated by `SIGINT`.
const EXIT_SIGINT: u8 = 130;

#[derive(Parser)]
#[command(name = "tradecore")]
#[command(about = "Single-process ultra-low-latency trading core")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/tradecore.toml")]
    config: PathBuf,

    /// Load and validate configuration, then exit without starting the
    /// engine thread.
    #[arg(long)]
    dry_run: bool,

    /// Override `[logging].level` from the configuration file.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("fatal startup error: {err:#}");
            ExitCode::from(EXIT_INIT_FAILURE)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let cfg = config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    init_logging(cli.log_level.as_deref().unwrap_or(&cfg.logging.level));
    info!(config = %cli.config.display(), system = %cfg.system.name, "configuration loaded");
    warn_on_queue_size_mismatch(&cfg);

    if cli.dry_run {
        info!("dry run: configuration is valid, not starting the engine");
        return Ok(0);
    }

    let persist = engine_persist_sink(&cfg)?;
    let mut trade_engine: TradeEngine<BOOK_DEPTH> = TradeEngine::from_config(&cfg, persist);

    if cfg.performance.cpu_affinity_enabled {
        engine::cpu::apply(
            cfg.cpu_config.trading_core,
            cfg.cpu_config.enable_realtime,
            cfg.cpu_config.realtime_priority,
        )
        .context("pinning the trade-engine thread")?;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let sigint_received = Arc::new(AtomicBool::new(false));
    register_signal_handlers(&shutdown, &sigint_received)?;

    let market_data: SpscRing<common::market::MarketUpdate, MARKET_DATA_RING> = SpscRing::new();
    let orders_out: SpscRing<engine::GatewayOrder, ORDER_RING> = SpscRing::new();
    let responses_in: SpscRing<oms::OrderResponse, RESPONSE_RING> = SpscRing::new();
    let clock = TimestampSource::new();

    info!("trade-engine thread running; no market-data or order-gateway connections are wired in this core");
    engine::runtime::run(&mut trade_engine, &[&market_data], &orders_out, &responses_in, &shutdown, &clock);

    let counters = trade_engine.counters();
    info!(
        risk_rejections = counters.risk_rejections,
        invariant_violations = counters.invariant_violations,
        "engine thread drained, shutting down"
    );

    Ok(if sigint_received.load(std::sync::atomic::Ordering::Acquire) { EXIT_SIGINT } else { 0 })
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

fn engine_persist_sink(cfg: &EngineConfig) -> Result<Option<persist::PersistSink>> {
    let sink = persist::PersistSink::spawn(cfg.paths.data_dir.clone(), PERSIST_SEGMENT_BYTES)
        .with_context(|| format!("spawning persist writer rooted at {}", cfg.paths.data_dir))?;
    Ok(Some(sink))
}

/// `SIGTERM` only flips the shared shutdown flag the engine polls.
/// `SIGINT` flips both that flag and a dedicated flag so the final exit
/// code can distinguish the two per spec.md §6.
fn register_signal_handlers(shutdown: &Arc<AtomicBool>, sigint_received: &Arc<AtomicBool>) -> Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(shutdown))
        .context("registering SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(sigint_received))
        .context("registering SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(shutdown))
        .context("registering SIGTERM handler")?;
    Ok(())
}

/// `[performance]`'s queue-size fields are validated as powers of two at
/// load time but this binary compiles its ring capacities as consts; warn
/// loudly rather than silently ignoring an operator's sizing intent.
fn warn_on_queue_size_mismatch(cfg: &EngineConfig) {
    let mismatches = [
        ("market_data_queue_size", cfg.performance.market_data_queue_size as usize, MARKET_DATA_RING),
        ("order_queue_size", cfg.performance.order_queue_size as usize, ORDER_RING),
        ("response_queue_size", cfg.performance.response_queue_size as usize, RESPONSE_RING),
    ];
    for (field, configured, compiled) in mismatches {
        if configured != compiled {
            tracing::warn!(field, configured, compiled, "configured queue size ignored; ring capacity is fixed at compile time");
        }
    }
}
