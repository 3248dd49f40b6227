//! Disk-backed profile cache
//!
//! Holds the last successfully fetched profile so the app can render
//! something when the API is down. One entry, last writer wins; the single
//! desktop process needs no file locking. A stale entry is ignored on read
//! but kept on disk, since even a day-old profile beats an empty screen
//! for a caller that explicitly asks for it.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};
use vaultwatch_common::{Clock, SystemClock};
use vaultwatch_domain::constants::{CACHE_VERSION, PROFILE_CACHE_TTL_SECS};
use vaultwatch_domain::{CachedProfileEntry, Result, VaultWatchError};

/// Single-entry profile cache at a fixed path.
pub struct ProfileCache<C: Clock = SystemClock> {
    path: PathBuf,
    ttl_secs: i64,
    clock: C,
}

impl ProfileCache<SystemClock> {
    /// Cache with the default 24h TTL on the real clock.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> ProfileCache<C> {
    /// Cache with an injected clock, used by tests.
    #[must_use]
    pub fn with_clock(path: PathBuf, clock: C) -> Self {
        Self { path, ttl_secs: PROFILE_CACHE_TTL_SECS, clock }
    }

    /// Replace the cached profile, stamping it with the current time.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Io`] when the write fails.
    pub async fn store(&self, profile: &serde_json::Value) -> Result<()> {
        let entry = CachedProfileEntry {
            profile: profile.clone(),
            cached_at: self.clock.epoch_secs(),
            cache_version: CACHE_VERSION.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultWatchError::Io(format!("create {}: {e}", parent.display())))?;
        }

        let json = serde_json::to_vec(&entry)
            .map_err(|e| VaultWatchError::Io(format!("serialize cache entry: {e}")))?;

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| VaultWatchError::Io(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| VaultWatchError::Io(format!("replace {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "Profile cached");
        Ok(())
    }

    /// The cached profile, or `None` when absent, stale, unreadable, or
    /// written by an incompatible cache version.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Io`] only on read failures other than a
    /// missing file; a corrupt entry is logged and treated as a miss.
    pub async fn load(&self) -> Result<Option<serde_json::Value>> {
        let Some(entry) = self.entry().await? else {
            return Ok(None);
        };

        if !entry.is_fresh_at(self.clock.epoch_secs(), self.ttl_secs) {
            debug!(cached_at = entry.cached_at, "Cached profile is stale, ignoring");
            return Ok(None);
        }
        Ok(Some(entry.profile))
    }

    /// The raw cache entry regardless of freshness. Used by status
    /// reporting and explicit offline fallback.
    ///
    /// # Errors
    /// Returns [`VaultWatchError::Io`] when the file exists but cannot be
    /// read.
    pub async fn entry(&self) -> Result<Option<CachedProfileEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VaultWatchError::Io(format!("read {}: {e}", self.path.display())))
            }
        };

        let entry: CachedProfileEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable cache entry");
                return Ok(None);
            }
        };

        if entry.cache_version != CACHE_VERSION {
            warn!(version = %entry.cache_version, "Ignoring cache entry from another version");
            return Ok(None);
        }
        Ok(Some(entry))
    }
}
