//! Authentication module for token storage and refresh coordination.
//!
//! This module provides:
//! - `TokenStore`: the two-entry credential store (`access_token`, `refresh_token`)
//!   with in-memory, file and OS keyring backends
//! - `RefreshCoordinator`: single-flight gate for access token refresh
//! - `Navigator`: hook invoked when the session can no longer be recovered

pub mod credentials;
pub mod navigator;
pub mod refresh;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use navigator::{LogNavigator, Navigator, LOGIN_PATH};
pub use refresh::{Acquire, RefreshCoordinator, RefreshError, RefreshGuard, Waiter};
pub use session::FileTokenStore;
pub use store::{MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
