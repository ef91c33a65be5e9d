//! Core library for dn7x7.
//!
//! This crate provides everything a DairyNews7x7 frontend needs to talk to
//! the platform backend:
//!
//! - `api`: the authenticated `ApiClient` with single-flight token refresh,
//!   typed service methods for accounts, dashboard and admin endpoints, and
//!   the API-key based `NewsClient`
//! - `auth`: credential storage backends and the refresh coordinator
//! - `models`: request and response types for every backend resource
//! - `config`: on-disk configuration and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, ClientOptions, NewsClient};
pub use auth::{Navigator, RefreshCoordinator, RefreshError, TokenStore};
pub use config::Config;
