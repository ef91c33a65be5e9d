use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::models::TokenPair;

/// Entry holding the short-lived bearer credential
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Entry holding the credential used to mint new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key/value storage for session credentials.
///
/// Implementations must be cheap to call from the request path: the client
/// reads the access token before every outbound request.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove an entry. Removing a missing entry is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Store both tokens returned by a login
    fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, &pair.access)?;
        self.set(REFRESH_TOKEN_KEY, &pair.refresh)
    }

    /// Destroy both entries
    fn clear(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

/// Process-local store. Tokens are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token pair
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let store = Self::new();
        {
            let mut entries = store.lock();
            if let Some(access) = access {
                entries.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
            }
            if let Some(refresh) = refresh {
                entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
            }
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}
