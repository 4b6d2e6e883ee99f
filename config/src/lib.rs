//! TOML configuration loading and startup validation. `load` is the only
//! entry point a binary needs: it reads the file, deserializes it into
//! [`EngineConfig`], validates every rule, and creates any configured
//! directory that doesn't exist yet — all before any hot thread starts.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod loader;
mod sections;
mod validate;

pub use loader::{load, ConfigError};
pub use sections::{
    ArbitrageSection, CpuConfigSection, EngineConfig, LoggingSection, MarketMakerSection, PathsSection,
    PerformanceSection, StrategiesSection, SystemSection, TestingSection, TradingSection, VenueSection,
};
pub use validate::ValidationError;
