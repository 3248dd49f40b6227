//! Application configuration structures

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultWatchError};

/// Top-level application configuration.
///
/// Built by the infra config loader from environment variables; validated
/// before any network request is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OAuth client id registered with Bungie.net.
    pub client_id: String,
    /// API key sent as `X-API-Key` on every Platform request.
    pub api_key: String,
    /// Directory holding the session file and the profile cache.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Path of the persisted session file.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Path of the profile cache file.
    pub fn profile_cache_path(&self) -> PathBuf {
        self.data_dir.join("cache").join("profile.json")
    }

    /// Ensure required identity-provider credentials are present.
    ///
    /// # Errors
    /// Returns `VaultWatchError::Config` when the client id or API key is
    /// empty. Checked up front so a misconfigured install fails before any
    /// browser or network interaction.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(VaultWatchError::Config("missing OAuth client id".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(VaultWatchError::Config("missing API key".to_string()));
        }
        Ok(())
    }

    /// Config rooted at an explicit data directory, used by tests.
    pub fn with_data_dir(client_id: &str, api_key: &str, data_dir: &Path) -> Self {
        Self {
            client_id: client_id.to_string(),
            api_key: api_key.to_string(),
            data_dir: data_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank_credentials() {
        let config = AppConfig::with_data_dir("", "key", Path::new("/tmp"));
        assert!(config.validate().is_err());

        let config = AppConfig::with_data_dir("client", "  ", Path::new("/tmp"));
        assert!(config.validate().is_err());

        let config = AppConfig::with_data_dir("client", "key", Path::new("/tmp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let config = AppConfig::with_data_dir("c", "k", Path::new("/data"));
        assert_eq!(config.session_path(), PathBuf::from("/data/session.json"));
        assert_eq!(config.profile_cache_path(), PathBuf::from("/data/cache/profile.json"));
    }
}
