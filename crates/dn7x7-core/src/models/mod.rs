//! Data models for DairyNews7x7 backend resources.
//!
//! This module contains the request and response types used by the
//! platform API:
//!
//! - Account types: `User`, `TokenPair`, signup and password payloads
//! - Billing types: `CreditBalance`, `ApiKey`, `ApiCallLog`, `LogFilter`
//! - Admin types: `AdminUser`, `UserUpdate` and action acknowledgements
//! - News types: `NewsSummary`, `NewsArticle`, `NewsPage`, `NewsCategory`
//!
//! With the `ts` feature enabled every type derives `ts_rs::TS` so the web
//! dashboard can share the definitions.

pub mod admin;
pub mod billing;
pub mod news;
pub mod user;

pub use admin::{AddCreditsResponse, AdminUser, ToggleActiveResponse, ToggleStaffResponse, UserUpdate};
pub use billing::{
    ApiCallLog, ApiKey, CreditBalance, LogFilter, NewApiKey, StatusFilter, StatusResponse,
    TimeRange, DEFAULT_DAILY_LIMIT,
};
pub use news::{NewsArticle, NewsCategory, NewsPage, NewsQuery, NewsSummary, MAX_PAGE_SIZE};
pub use user::{
    Activation, LoginRequest, NewUser, PasswordChange, PasswordReset, PasswordResetConfirm,
    ProfileImage, ProfileUpdate, RefreshRequest, RefreshResponse, Role, TokenPair, User,
};
