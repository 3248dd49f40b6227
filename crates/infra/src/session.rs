//! File-backed session persistence
//!
//! The session file is the only persisted artifact of authentication. It is
//! written atomically (temp file then rename) and restricted to the owning
//! user on Unix, since it holds bearer and refresh tokens in the clear.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use vaultwatch_common::SessionStore;
use vaultwatch_domain::Session;

/// [`SessionStore`] implementation backed by a single JSON file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| format!("failed to serialize session: {e}"))?;

        // Write to a sibling temp file and rename so a crash mid-write
        // never leaves a truncated session behind.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| format!("failed to write {}: {e}", tmp.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| format!("failed to restrict {}: {e}", tmp.display()))?;
        }

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| format!("failed to replace {}: {e}", self.path.display()))?;

        debug!(path = %self.path.display(), "Session persisted");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| format!("failed to parse {}: {e}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("failed to read {}: {e}", self.path.display())),
        }
    }

    async fn clear(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("failed to remove {}: {e}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the file session store.
    use tempfile::tempdir;

    use super::*;

    fn sample_session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1_700_000_000),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        store.save(&sample_session()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, sample_session());
    }

    #[tokio::test]
    async fn load_without_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        store.save(&sample_session()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        store.save(&sample_session()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_surfaces_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = FileSessionStore::new(path);
        assert!(store.load().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&sample_session()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
