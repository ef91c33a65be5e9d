//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which holds
//! the backend URL, the last used email, the token storage backend and the
//! client tuning knobs.
//!
//! Configuration is stored at `~/.config/dn7x7/config.json`. The backend
//! URL can be overridden with the `DN7X7_API_URL` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ClientOptions, DEFAULT_BASE_URL};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "dn7x7";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "DN7X7_API_URL";

/// Environment variable holding a partner API key for the news commands
pub const API_KEY_ENV: &str = "DN7X7_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub request_timeout_secs: Option<u64>,
    pub refresh_timeout_secs: Option<u64>,
    pub max_pending_refresh: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend URL: environment first, then config, then the local default
    pub fn api_url(&self) -> String {
        self.resolve_api_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::with_base_url(self.api_url());
        if let Some(secs) = self.request_timeout_secs {
            options.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.refresh_timeout_secs {
            options.refresh_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_pending_refresh {
            options.max_pending_refresh = max;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_api_url(None), DEFAULT_BASE_URL);

        config.api_url = Some("https://api.dairynews7x7.com/api".to_string());
        assert_eq!(config.resolve_api_url(None), "https://api.dairynews7x7.com/api");

        assert_eq!(
            config.resolve_api_url(Some("http://localhost:9000/api".to_string())),
            "http://localhost:9000/api"
        );
        assert_eq!(
            config.resolve_api_url(Some("  ".to_string())),
            "https://api.dairynews7x7.com/api"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            last_email: Some("asha@example.com".to_string()),
            token_backend: TokenBackend::Keyring,
            refresh_timeout_secs: Some(5),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_email.as_deref(), Some("asha@example.com"));
        assert_eq!(loaded.token_backend, TokenBackend::Keyring);
    }

    #[test]
    fn test_missing_file_is_default_and_old_files_parse() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(loaded.token_backend, TokenBackend::File);

        let old: Config = serde_json::from_str(r#"{"api_url": null, "last_email": "a@b.c"}"#).unwrap();
        assert_eq!(old.token_backend, TokenBackend::File);
    }

    #[test]
    fn test_client_options_overrides() {
        let config = Config {
            api_url: Some("http://backend/api".to_string()),
            refresh_timeout_secs: Some(5),
            max_pending_refresh: Some(8),
            ..Config::default()
        };
        let options = config.client_options();
        assert_eq!(options.refresh_timeout, Duration::from_secs(5));
        assert_eq!(options.max_pending_refresh, 8);
        assert_eq!(options.request_timeout, ClientOptions::default().request_timeout);
    }
}
