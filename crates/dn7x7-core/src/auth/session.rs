use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TokenStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub tokens: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Token store persisted as JSON in the cache directory.
///
/// The file is rewritten on every change and created with owner-only
/// permissions on Unix.
pub struct FileTokenStore {
    path: PathBuf,
    data: Mutex<SessionData>,
}

impl FileTokenStore {
    /// Open the store in `cache_dir`, loading an existing session file if present
    pub fn open(cache_dir: &Path) -> Result<Self> {
        let path = cache_dir.join(SESSION_FILE);
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            serde_json::from_str(&contents).context("Failed to parse session file")?
        } else {
            SessionData::default()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the stored tokens last changed
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.lock().updated_at
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        if data.tokens.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove session file")?;
                debug!(path = %self.path.display(), "Session file removed");
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .context("Failed to open session file")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().tokens.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.lock();
        data.tokens.insert(key.to_string(), value.to_string());
        data.updated_at = Some(Utc::now());
        self.save(&data)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut data = self.lock();
        if data.tokens.remove(key).is_some() {
            data.updated_at = Some(Utc::now());
            self.save(&data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    #[test]
    fn test_tokens_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileTokenStore::open(dir.path()).unwrap();
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r1").unwrap();
        assert!(store.updated_at().is_some());

        let reopened = FileTokenStore::open(dir.path()).unwrap();
        assert_eq!(reopened.access_token().unwrap().as_deref(), Some("a1"));
        assert_eq!(reopened.refresh_token().unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path()).unwrap();
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path()).unwrap();
        store.set(ACCESS_TOKEN_KEY, "a1").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
