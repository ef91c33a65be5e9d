//! REST API client module for the DairyNews7x7 platform.
//!
//! This module provides the `ApiClient` for the dashboard backend and the
//! `NewsClient` for the public news API.
//!
//! Dashboard endpoints use JWT bearer authentication. Access tokens are
//! short-lived; when one is rejected the client refreshes it once through
//! `/accounts/jwt/refresh/` and replays every request that failed in the
//! meantime. The news API is authenticated with an `X-API-KEY` header
//! instead and never refreshes.

pub mod accounts;
pub mod admin;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod news;
pub mod request;

pub use client::{ApiClient, ClientOptions};
pub use error::{ApiError, FieldErrors};
pub use news::NewsClient;
pub use request::{ApiRequest, FormField, RequestBody};

/// Backend base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Token refresh endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/accounts/jwt/refresh/";
