//! Environment-based configuration loading
//!
//! Credentials come from the environment (optionally via a `.env` file the
//! binary loads before calling in here); the data directory defaults to
//! `~/.vaultwatch` unless overridden.

use std::path::PathBuf;

use tracing::debug;
use vaultwatch_domain::{AppConfig, Result, VaultWatchError};

pub const ENV_CLIENT_ID: &str = "VAULTWATCH_CLIENT_ID";
pub const ENV_API_KEY: &str = "VAULTWATCH_API_KEY";
pub const ENV_DATA_DIR: &str = "VAULTWATCH_DATA_DIR";

const DEFAULT_DATA_DIR_NAME: &str = ".vaultwatch";

/// Load and validate configuration from the process environment.
///
/// # Errors
/// Returns [`VaultWatchError::Config`] when a required variable is absent
/// or blank, or when no home directory exists to root the default data
/// directory in.
pub fn load_config() -> Result<AppConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let client_id = require(&lookup, ENV_CLIENT_ID)?;
    let api_key = require(&lookup, ENV_API_KEY)?;

    let data_dir = match lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
            .ok_or_else(|| {
                VaultWatchError::Config(format!(
                    "no home directory found, set {ENV_DATA_DIR} explicitly"
                ))
            })?,
    };

    let config = AppConfig { client_id, api_key, data_dir };
    config.validate()?;
    debug!(data_dir = %config.data_dir.display(), "Configuration loaded");
    Ok(config)
}

fn require(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| VaultWatchError::Config(format!("{key} is not set")))
}
