//! Reads and validates the TOML configuration file, producing the
//! read-only snapshot published before any hot thread starts.

use crate::sections::EngineConfig;
use crate::validate::{self, ValidationError};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Failure loading configuration. Per the error-handling design, this is
/// always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },
    /// The file's contents were not valid TOML for [`EngineConfig`].
    #[error("could not parse config file {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying parse error.
        source: Box<toml::de::Error>,
    },
    /// The parsed configuration failed a startup validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Load and validate the configuration at `path`.
///
/// # Errors
/// Returns [`ConfigError::Read`] if the file can't be read,
/// [`ConfigError::Parse`] if it isn't valid TOML for [`EngineConfig`], or
/// the wrapped [`ValidationError`] if it fails a startup check.
pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    let config: EngineConfig = toml::from_str(&text)
        .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source: Box::new(source) })?;
    validate::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn sample_toml(dir: &TempDir) -> String {
        let p = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        format!(
            r#"
[system]
name = "tradecore"
version = "1"
environment = "development"
start_date = "2026-01-01"

[paths]
base_dir = "{base}"
logs_dir = "{logs}"
data_dir = "{data}"
cache_dir = "{cache}"
session_dir = "{session}"
instruments_dir = "{instruments}"
env_file = "{base}/.env"

[logging]
level = "info"
max_file_size_mb = 100
rotation_count = 5
async_enabled = true
latency_target_ns = 50

[performance]
thread_count = 4
cpu_affinity_enabled = false
realtime_priority = false
memory_pool_size_mb = 64
use_huge_pages = false
numa_aware = false
market_data_queue_size = 1024
order_queue_size = 1024
response_queue_size = 1024

[cpu_config]
enable_realtime = false
realtime_priority = 0

[trading]
max_position_value = 1000000
max_daily_loss = 50000
max_order_rate_per_sec = 100
max_order_size = 10000
position_limit_per_symbol = 50000
market_data_latency_target_ns = 1000
order_placement_latency_target_us = 50
risk_check_latency_target_ns = 200

[strategies]

[testing]
paper_trading_enabled = true
backtesting_enabled = false
simulation_mode = false
"#,
            base = p("base"),
            logs = p("logs"),
            data = p("data"),
            cache = p("cache"),
            session = p("session"),
            instruments = p("instruments"),
        )
    }

    #[test]
    fn loads_and_validates_a_well_formed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tradecore.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(sample_toml(&dir).as_bytes()).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.system.name, "tradecore");
        assert_eq!(config.cpu_config.trading_core, -1);
        assert!(Path::new(&config.paths.logs_dir).is_dir());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load("/nonexistent/tradecore.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tradecore.toml");
        fs::write(&path, "not valid = [[[").unwrap();
        assert!(matches!(load(&path).unwrap_err(), ConfigError::Parse { .. }));
    }
}
