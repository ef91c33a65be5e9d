//! Wiring between the on-disk configuration and the API client

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use dn7x7_core::auth::{FileTokenStore, KeyringTokenStore, Navigator, LOGIN_PATH};
use dn7x7_core::config::TokenBackend;
use dn7x7_core::{ApiClient, ClientOptions, Config, TokenStore};
use tracing::warn;

/// Keychain account used before anyone has logged in
const DEFAULT_ACCOUNT: &str = "default";

pub struct Context {
    pub config: Config,
    pub client: ApiClient,
    pub json: bool,
    api_url: Option<String>,
    login_prompt: Arc<LoginPrompt>,
}

impl Context {
    /// `api_url` from the command line wins over the environment and config
    pub fn new(config: Config, api_url: Option<String>, json: bool) -> Result<Self> {
        let login_prompt = Arc::new(LoginPrompt::default());
        let account = config.last_email.clone();
        let client = build_client(
            &config,
            api_url.as_deref(),
            account.as_deref(),
            login_prompt.clone(),
        )?;
        Ok(Self {
            config,
            client,
            json,
            api_url,
            login_prompt,
        })
    }

    /// True once the client has ended the session and asked for a new login
    pub fn login_requested(&self) -> bool {
        self.login_prompt.requested()
    }

    pub fn base_url(&self) -> String {
        self.api_url.clone().unwrap_or_else(|| self.config.api_url())
    }

    /// Rebuild the client for `email`. Keychain sessions are per account.
    pub fn switch_account(&mut self, email: &str) -> Result<()> {
        if self.config.token_backend == TokenBackend::Keyring {
            self.client = build_client(
                &self.config,
                self.api_url.as_deref(),
                Some(email),
                self.login_prompt.clone(),
            )?;
        }
        Ok(())
    }

    pub fn remember_email(&mut self, email: &str) {
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

fn open_store(config: &Config, account: Option<&str>) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match config.token_backend {
        TokenBackend::File => {
            let cache_dir = config.cache_dir()?;
            Arc::new(FileTokenStore::open(&cache_dir).context("Failed to open session file")?)
        }
        TokenBackend::Keyring => {
            Arc::new(KeyringTokenStore::new(account.unwrap_or(DEFAULT_ACCOUNT)))
        }
    };
    Ok(store)
}

fn client_options(config: &Config, api_url: Option<&str>) -> ClientOptions {
    let mut options = config.client_options();
    if let Some(url) = api_url {
        options.base_url = url.to_string();
    }
    options
}

fn build_client(
    config: &Config,
    api_url: Option<&str>,
    account: Option<&str>,
    login_prompt: Arc<LoginPrompt>,
) -> Result<ApiClient> {
    let store = open_store(config, account)?;
    let client = ApiClient::new(client_options(config, api_url), store)
        .context("Failed to create API client")?
        .with_navigator(login_prompt);
    Ok(client)
}

/// The terminal has no login page. Navigation to it is recorded and turned
/// into a hint once the command has finished.
#[derive(Debug, Default)]
pub struct LoginPrompt {
    requested: AtomicBool,
}

impl LoginPrompt {
    pub fn requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Navigator for LoginPrompt {
    fn navigate(&self, path: &str) {
        if path == LOGIN_PATH {
            self.requested.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_url_wins() {
        let config = Config {
            api_url: Some("http://from-config/api".to_string()),
            ..Config::default()
        };
        let options = client_options(&config, Some("http://from-flag/api"));
        assert_eq!(options.base_url, "http://from-flag/api");
    }

    #[test]
    fn test_login_prompt_only_tracks_login_page() {
        let prompt = LoginPrompt::default();
        prompt.navigate("/dashboard");
        assert!(!prompt.requested());
        prompt.navigate(LOGIN_PATH);
        assert!(prompt.requested());
    }
}
