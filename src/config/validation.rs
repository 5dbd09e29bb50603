//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use std::ops::RangeInclusive;

use super::{env_name, Config};
use crate::error::ConfigError;

/// Accepted concurrent agent limits.
pub const MAX_CONCURRENT_AGENTS_RANGE: RangeInclusive<u32> = 1..=100;

/// Accepted per-agent memory budgets, in MB.
pub const MAX_MEMORY_PER_AGENT_RANGE_MB: RangeInclusive<u32> = 50..=2000;

/// Accepted cache budgets, in GB.
pub const MAX_CACHE_SIZE_RANGE_GB: RangeInclusive<f64> = 0.1..=100.0;

/// Accepted log budgets, in GB.
pub const MAX_LOG_SIZE_RANGE_GB: RangeInclusive<f64> = 0.1..=10.0;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for the first value out of range:
/// - `ORCHESTRATOR_MAX_CONCURRENT_AGENTS` must be between 1 and 100
/// - `ORCHESTRATOR_MAX_MEMORY_PER_AGENT_MB` must be between 50 and 2000
/// - `ORCHESTRATOR_MAX_CACHE_SIZE_GB` must be between 0.1 and 100
/// - `ORCHESTRATOR_MAX_LOG_SIZE_GB` must be between 0.1 and 10
/// - `ORCHESTRATOR_MIN_RUNTIME_VERSION` must not be empty
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    check_range(
        "MAX_CONCURRENT_AGENTS",
        &config.max_concurrent_agents,
        &MAX_CONCURRENT_AGENTS_RANGE,
    )?;
    check_range(
        "MAX_MEMORY_PER_AGENT_MB",
        &config.max_memory_per_agent_mb,
        &MAX_MEMORY_PER_AGENT_RANGE_MB,
    )?;
    check_range(
        "MAX_CACHE_SIZE_GB",
        &config.max_cache_size_gb,
        &MAX_CACHE_SIZE_RANGE_GB,
    )?;
    check_range(
        "MAX_LOG_SIZE_GB",
        &config.max_log_size_gb,
        &MAX_LOG_SIZE_RANGE_GB,
    )?;

    if config.min_runtime_version.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: env_name("MIN_RUNTIME_VERSION"),
            reason: "must not be empty".into(),
        });
    }

    Ok(())
}

fn check_range<T>(suffix: &str, value: &T, range: &RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(value) {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        var: env_name(suffix),
        reason: format!(
            "{value} is outside {}..={}",
            range.start(),
            range.end()
        ),
    })
}
