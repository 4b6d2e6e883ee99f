//! Shape of the TOML configuration file: one struct per section.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// `[system]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSection {
    /// Deployment name, for logging and the status command.
    pub name: String,
    /// Config schema version, not the crate version.
    pub version: String,
    /// `"production"`, `"staging"`, or `"development"`.
    pub environment: String,
    /// ISO-8601 date this configuration took effect.
    pub start_date: String,
}

/// `[paths]`. Every directory field is created at load time if missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Root directory all other paths default relative to.
    pub base_dir: String,
    /// Log file destination.
    pub logs_dir: String,
    /// Persisted tick/snapshot destination (see [`crate`]'s `persist` sibling crate).
    pub data_dir: String,
    /// Scratch/cache destination.
    pub cache_dir: String,
    /// Per-run session artifacts.
    pub session_dir: String,
    /// Instrument master files.
    pub instruments_dir: String,
    /// `.env` file holding credential environment variables (never committed).
    pub env_file: String,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `tracing` filter directive, e.g. `"info"` or `"trade_core=debug"`.
    pub level: String,
    /// Rotate the active log file after it exceeds this size.
    pub max_file_size_mb: u32,
    /// Number of rotated files to retain.
    pub rotation_count: u32,
    /// Route hot-path logging through the async ring sink.
    pub async_enabled: bool,
    /// Target latency budget for a hot-path `emit` call, in nanoseconds.
    pub latency_target_ns: u64,
}

/// `[performance]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSection {
    /// Number of dedicated engine/IO threads to spawn.
    pub thread_count: u32,
    /// Pin threads to the cores named in `[cpu_config]`.
    pub cpu_affinity_enabled: bool,
    /// Request real-time scheduling priority for pinned threads.
    pub realtime_priority: bool,
    /// Size of the preallocated object-pool arena, in megabytes.
    pub memory_pool_size_mb: u32,
    /// Back pools with huge pages where the OS supports it.
    pub use_huge_pages: bool,
    /// Allocate pinned-thread memory on the local NUMA node.
    pub numa_aware: bool,
    /// Market-data SPSC ring capacity. Must be a power of two.
    pub market_data_queue_size: u32,
    /// Order-event SPSC ring capacity. Must be a power of two.
    pub order_queue_size: u32,
    /// Venue-response SPSC ring capacity. Must be a power of two.
    pub response_queue_size: u32,
}

/// `[cpu_config]`. Core fields default to `-1`, meaning "no affinity".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfigSection {
    /// Core pinned to the trade-engine thread.
    #[serde(default = "default_no_affinity")]
    pub trading_core: i32,
    /// Core pinned to the market-data I/O thread.
    #[serde(default = "default_no_affinity")]
    pub market_data_core: i32,
    /// Core pinned to the order-gateway thread.
    #[serde(default = "default_no_affinity")]
    pub order_gateway_core: i32,
    /// Core pinned to the log/persist drain threads.
    #[serde(default = "default_no_affinity")]
    pub logging_core: i32,
    /// NUMA node to allocate pinned-thread memory from.
    #[serde(default = "default_no_affinity")]
    pub numa_node: i32,
    /// Whether real-time scheduling is requested at all.
    pub enable_realtime: bool,
    /// Real-time priority level, platform-defined scale.
    pub realtime_priority: i32,
}

const fn default_no_affinity() -> i32 {
    -1
}

/// `[trading]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSection {
    /// Cap on one position's mark-to-market value.
    pub max_position_value: i64,
    /// Cap on realized-plus-unrealized loss, stored as a positive magnitude.
    pub max_daily_loss: i64,
    /// Token-bucket replenishment rate for new orders.
    pub max_order_rate_per_sec: u32,
    /// Cap on a single order's size.
    pub max_order_size: u64,
    /// Cap on absolute position size per instrument.
    pub position_limit_per_symbol: u64,
    /// Target nanosecond budget from wire read to book update.
    pub market_data_latency_target_ns: u64,
    /// Target microsecond budget from intent to order-gateway send.
    pub order_placement_latency_target_us: u64,
    /// Target nanosecond budget for one risk-gate check.
    pub risk_check_latency_target_ns: u64,
}

/// One venue's connection and subscription parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSection {
    /// Whether this venue connection is started at all.
    pub enabled: bool,
    /// REST endpoint, for snapshot fetches and order placement.
    pub api_endpoint: String,
    /// WebSocket endpoint, for the market-data feed.
    pub websocket_endpoint: String,
    /// Symbols subscribed to at startup.
    pub symbols: Vec<String>,
    /// Venue-imposed request-rate ceiling, separate from the core's own
    /// internal risk-gate rate limit.
    pub rate_limit_per_sec: u32,
    /// Default metadata stamped onto outbound orders (e.g. time-in-force).
    pub default_time_in_force: String,
}

/// `[strategies.market_maker]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMakerSection {
    /// Quoted spread in basis points around mid.
    pub spread_bps: u32,
    /// Minimum acceptable edge in basis points; `spread_bps` is widened to
    /// meet this floor.
    pub min_edge_bps: u32,
    /// Quote size in integer units.
    pub quote_size: u64,
    /// Inventory, in signed units, beyond which skew kicks in.
    pub inventory_limit: i64,
    /// Replace a resting quote after this many milliseconds even if price
    /// hasn't moved.
    pub quote_lifetime_ms: u64,
    /// Widen the quote on the over-exposed side once past `inventory_limit`.
    pub skew_enabled: bool,
}

/// `[strategies.arbitrage]`. Declared for forward compatibility; the
/// arbitrage strategy core is not implemented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageSection {
    /// Whether the (currently inert) arbitrage core should be considered
    /// enabled once implemented.
    pub enabled: bool,
}

/// `[strategies]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategiesSection {
    /// Market-making core parameters.
    pub market_maker: Option<MarketMakerSection>,
    /// Arbitrage core parameters; accepted but unused.
    pub arbitrage: Option<ArbitrageSection>,
}

/// `[testing]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingSection {
    /// Route orders to a paper broker instead of a live venue.
    pub paper_trading_enabled: bool,
    /// Enable historical replay mode.
    pub backtesting_enabled: bool,
    /// Run against a simulated market-data source.
    pub simulation_mode: bool,
}

/// Full configuration file shape, deserialized directly from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `[system]`
    pub system: SystemSection,
    /// `[paths]`
    pub paths: PathsSection,
    /// `[logging]`
    pub logging: LoggingSection,
    /// `[performance]`
    pub performance: PerformanceSection,
    /// `[cpu_config]`
    pub cpu_config: CpuConfigSection,
    /// `[trading]`
    pub trading: TradingSection,
    /// `[venues.*]`, keyed by venue name.
    #[serde(default)]
    pub venues: FxHashMap<String, VenueSection>,
    /// `[strategies]`
    pub strategies: StrategiesSection,
    /// `[testing]`
    pub testing: TestingSection,
}
