//! Environment variable overrides.
//!
//! A narrow, explicit allow-list rather than a general `TIS_*` → field
//! mapping: only the four knobs an operator is likely to need to tune
//! without editing the config file.

use super::model::ResolvedConfig;
use crate::errors::TisError;
use std::env;

const VAR_CONCURRENT_REQUESTS: &str = "TIS_CONCURRENT_REQUESTS";
const VAR_RATE_LIMIT_DELAY_MS: &str = "TIS_RATE_LIMIT_DELAY_MS";
const VAR_LOG_LEVEL: &str = "TIS_LOG_LEVEL";
const VAR_BASE_URL: &str = "TIS_BASE_URL";

/// Apply the environment-variable allow-list on top of an already
/// file-merged [`ResolvedConfig`]. Returns a [`TisError::ConfigEnvError`]
/// (wrapped via [`TisError::config_invalid`]) if a present variable fails
/// to parse — an override that can't be understood is treated the same as
/// any other invalid configuration, not silently ignored.
pub fn apply_env_overrides(config: &mut ResolvedConfig) -> crate::errors::TisResult<()> {
    if let Ok(raw) = env::var(VAR_CONCURRENT_REQUESTS) {
        let parsed: usize = raw.parse().map_err(|_| {
            TisError::config_invalid(format!(
                "{VAR_CONCURRENT_REQUESTS} must be a positive integer, got '{raw}'"
            ))
        })?;
        config.optimization.concurrent_requests = parsed;
    }

    if let Ok(raw) = env::var(VAR_RATE_LIMIT_DELAY_MS) {
        let millis: f64 = raw.parse().map_err(|_| {
            TisError::config_invalid(format!(
                "{VAR_RATE_LIMIT_DELAY_MS} must be a number of milliseconds, got '{raw}'"
            ))
        })?;
        config.optimization.rate_limit_delay = millis / 1000.0;
    }

    if let Ok(raw) = env::var(VAR_LOG_LEVEL) {
        config.debug.log_level = raw;
    }

    if let Ok(raw) = env::var(VAR_BASE_URL) {
        config.api.base_url = raw;
    }

    Ok(())
}
