//! Startup validation: rejects a configuration before any hot thread
//! starts, and creates any path that's missing rather than failing on it.

use crate::sections::EngineConfig;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A configuration failed validation and the process must not start.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A queue-size field was not a power of two.
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed the check.
        value: u32,
    },
    /// `max_position_value` was not strictly positive.
    #[error("trading.max_position_value must be > 0, got {0}")]
    NonPositivePositionValue(i64),
    /// A required path field was empty.
    #[error("paths.{0} must not be empty")]
    EmptyPath(&'static str),
    /// A required directory could not be created.
    #[error("could not create directory for paths.{field}: {source}")]
    PathCreation {
        /// Name of the offending field.
        field: &'static str,
        /// Underlying filesystem error.
        source: std::io::Error,
    },
}

/// Validate `config` in place, creating any configured directory that
/// doesn't exist yet.
///
/// # Errors
/// Returns the first [`ValidationError`] encountered.
pub fn validate(config: &EngineConfig) -> Result<(), ValidationError> {
    check_power_of_two("performance.market_data_queue_size", config.performance.market_data_queue_size)?;
    check_power_of_two("performance.order_queue_size", config.performance.order_queue_size)?;
    check_power_of_two("performance.response_queue_size", config.performance.response_queue_size)?;

    if config.trading.max_position_value <= 0 {
        return Err(ValidationError::NonPositivePositionValue(config.trading.max_position_value));
    }

    ensure_dir("base_dir", &config.paths.base_dir)?;
    ensure_dir("logs_dir", &config.paths.logs_dir)?;
    ensure_dir("data_dir", &config.paths.data_dir)?;
    ensure_dir("cache_dir", &config.paths.cache_dir)?;
    ensure_dir("session_dir", &config.paths.session_dir)?;
    ensure_dir("instruments_dir", &config.paths.instruments_dir)?;

    Ok(())
}

fn check_power_of_two(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if value == 0 || !value.is_power_of_two() {
        return Err(ValidationError::NotPowerOfTwo { field, value });
    }
    Ok(())
}

fn ensure_dir(field: &'static str, path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath(field));
    }
    let dir = Path::new(path);
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| ValidationError::PathCreation { field, source })?;
    }
    Ok(())
}
