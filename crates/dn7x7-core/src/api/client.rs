//! Authenticated client for the DairyNews7x7 dashboard backend.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! stored access token and recovers from an expired one:
//!
//! 1. A 401 from the refresh endpoint itself is returned as is.
//! 2. If a refresh is already running the request waits for it and then
//!    replays with the new token (or fails with the refresh error).
//! 3. Otherwise this request leads a refresh. Success stores the new token
//!    and replays; failure, a missing refresh token or a store that cannot
//!    keep the new tokens clears the stored credentials and sends the
//!    navigator to the login page.
//!
//! The last installed access token is also kept as a default `Authorization`
//! header. It is sent when the store yields no token and never on public
//! requests.
//!
//! Replays are sent once and never intercepted, so a request is retried at
//! most once no matter how many 401s it sees.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::{
    Acquire, LogNavigator, Navigator, RefreshCoordinator, RefreshError, RefreshGuard, TokenStore,
    ACCESS_TOKEN_KEY, LOGIN_PATH, REFRESH_TOKEN_KEY,
};
use crate::auth::refresh::DEFAULT_MAX_PENDING;
use crate::models::{RefreshRequest, RefreshResponse, TokenPair};

use super::request::RequestBody;
use super::{ApiError, ApiRequest, DEFAULT_BASE_URL, REFRESH_PATH};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on a single refresh call. Requests queued behind it fail
/// with `RefreshError::TimedOut` instead of waiting forever.
const REFRESH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub request_timeout: Duration,
    pub refresh_timeout: Duration,
    /// Cap on requests queued behind one refresh
    pub max_pending_refresh: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            refresh_timeout: Duration::from_secs(REFRESH_TIMEOUT_SECS),
            max_pending_refresh: DEFAULT_MAX_PENDING,
        }
    }
}

impl ClientOptions {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// API client for the dashboard backend.
/// Clone is cheap - every clone shares the connection pool, token store and
/// refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
    navigator: Arc<dyn Navigator>,
    default_headers: Arc<RwLock<HeaderMap>>,
    refresh_timeout: Duration,
}

impl ApiClient {
    /// Create a new API client reading and writing tokens through `store`
    pub fn new(options: ClientOptions, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(options.request_timeout).build()?;

        let mut defaults = HeaderMap::new();
        defaults.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            store,
            coordinator: Arc::new(RefreshCoordinator::with_max_pending(
                options.max_pending_refresh,
            )),
            navigator: Arc::new(LogNavigator),
            default_headers: Arc::new(RwLock::new(defaults)),
            refresh_timeout: options.refresh_timeout,
        })
    }

    /// Replace the hook invoked when the session ends
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Share a refresh coordinator with other clients using the same token store
    pub fn with_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// True when an access token is stored. It may still be expired.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.access_token(), Ok(Some(_)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Session state =====

    /// Persist a freshly issued token pair and use it for later requests
    pub fn store_tokens(&self, pair: &TokenPair) -> Result<(), ApiError> {
        self.store.store_pair(pair).map_err(ApiError::storage)?;
        self.coordinator.forget();
        self.set_default_bearer(Some(&pair.access));
        Ok(())
    }

    /// Destroy both stored tokens and the default credential.
    /// Failures are logged, never returned: the session is over either way.
    pub fn clear_credentials(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %format!("{:#}", e), "Failed to clear stored credentials");
        }
        self.coordinator.forget();
        self.set_default_bearer(None);
    }

    fn set_default_bearer(&self, token: Option<&str>) {
        let mut defaults = self
            .default_headers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        match token.map(bearer_value) {
            Some(Ok(value)) => {
                defaults.insert(header::AUTHORIZATION, value);
            }
            Some(Err(e)) => {
                warn!(error = %e, "Refusing to install malformed access token");
                defaults.remove(header::AUTHORIZATION);
            }
            None => {
                defaults.remove(header::AUTHORIZATION);
            }
        }
    }

    /// Default headers with `token` as the bearer. Without a token the
    /// default credential, if any, is left in place.
    fn outbound_headers(&self, token: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = self
            .default_headers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(token) = token {
            headers.insert(header::AUTHORIZATION, bearer_value(token)?);
        }
        Ok(headers)
    }

    // ===== Sending =====

    fn build(&self, request: &ApiRequest, token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path));

        let mut headers = self.outbound_headers(token)?;
        if request.public {
            headers.remove(header::AUTHORIZATION);
        }
        builder = builder.headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(fields) => builder.multipart(ApiRequest::build_multipart(fields)?),
        };
        Ok(builder)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = token.is_some(),
            "Sending request"
        );
        Ok(self.build(request, token)?.send().await?)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, refreshing the access token once if it is rejected.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        if request.public {
            let response = self.dispatch(request, None).await?;
            return Self::check_response(response).await;
        }

        // Captured before sending so a refresh that completes while this
        // request is in flight is recognised afterwards
        let generation = self.coordinator.generation();
        let token = self.store.access_token().map_err(ApiError::storage)?;

        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_response(response).await;
        }

        if request.targets_refresh_endpoint() {
            debug!("Refresh endpoint returned 401, not refreshing");
            return Err(ApiError::Unauthorized);
        }

        match self.coordinator.acquire(generation)? {
            Acquire::Refreshed(token) => {
                debug!(path = %request.path, "Token refreshed while request was in flight");
                self.replay(request, &token).await
            }
            Acquire::Follower(waiter) => {
                let token = waiter.wait().await?;
                self.replay(request, &token).await
            }
            Acquire::Leader(guard) => self.lead_refresh(request, guard).await,
        }
    }

    /// Send once with an explicit token, outside the refresh protocol
    pub(crate) async fn send_with_token(&self, request: &ApiRequest, token: &str) -> Result<(), ApiError> {
        let response = self.dispatch(request, Some(token)).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    pub(crate) fn navigate(&self, path: &str) {
        self.navigator.navigate(path);
    }

    async fn replay(&self, request: &ApiRequest, token: &str) -> Result<Response, ApiError> {
        debug!(path = %request.path, "Replaying request with refreshed token");
        let response = self.dispatch(request, Some(token)).await?;
        Self::check_response(response).await
    }

    async fn lead_refresh(
        &self,
        request: &ApiRequest,
        guard: RefreshGuard<'_>,
    ) -> Result<Response, ApiError> {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Access token rejected and no refresh token stored, ending session");
                self.end_session(guard, RefreshError::MissingRefreshToken);
                return Err(ApiError::Unauthorized);
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Could not read refresh token, ending session");
                self.end_session(guard, RefreshError::MissingRefreshToken);
                return Err(ApiError::Unauthorized);
            }
        };

        info!("Access token rejected, refreshing");
        let outcome = match self.request_refresh(&refresh_token).await {
            Ok(refreshed) => self.install_refreshed(&refreshed).map(|_| refreshed),
            Err(error) => Err(error),
        };
        match outcome {
            Ok(refreshed) => {
                guard.resolve(refreshed.access.clone());
                self.replay(request, &refreshed.access).await
            }
            Err(error) => {
                warn!(error = %error, "Token refresh failed, ending session");
                self.end_session(guard, error.clone());
                Err(ApiError::RefreshFailed(error))
            }
        }
    }

    /// Clear credentials, settle the queued requests with `error` and send
    /// the user to the login page
    fn end_session(&self, guard: RefreshGuard<'_>, error: RefreshError) {
        self.clear_credentials();
        guard.reject(error);
        self.navigator.navigate(LOGIN_PATH);
    }

    /// Persist the refreshed tokens. Failing to keep either one fails the refresh.
    fn install_refreshed(&self, refreshed: &RefreshResponse) -> Result<(), RefreshError> {
        let persist = |key: &str, value: &str| {
            self.store
                .set(key, value)
                .map_err(|e| RefreshError::Storage(format!("{}: {:#}", key, e)))
        };

        persist(ACCESS_TOKEN_KEY, &refreshed.access)?;
        // Refresh tokens are rotated by the backend; the old one is now blacklisted
        if let Some(ref rotated) = refreshed.refresh {
            persist(REFRESH_TOKEN_KEY, rotated)?;
        }
        self.set_default_bearer(Some(&refreshed.access));
        info!(rotated = refreshed.refresh.is_some(), "Access token refreshed");
        Ok(())
    }

    /// POST the refresh token directly, outside the interception path
    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshResponse, RefreshError> {
        let url = self.url(REFRESH_PATH);
        let call = async {
            let response = self
                .client
                .post(&url)
                .header(header::ACCEPT, "application/json")
                .json(&RefreshRequest {
                    refresh: refresh_token,
                })
                .send()
                .await
                .map_err(|e| RefreshError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| RefreshError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(RefreshError::Rejected {
                    status: status.as_u16(),
                    body: ApiError::truncate_body(&body),
                });
            }

            serde_json::from_str::<RefreshResponse>(&body)
                .map_err(|e| RefreshError::InvalidResponse(e.to_string()))
        };

        match tokio::time::timeout(self.refresh_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::TimedOut(self.refresh_timeout.as_secs())),
        }
    }

    // ===== Typed helpers =====

    /// Execute a request and parse the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(&request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "Failed to parse JSON response from {}: {}",
                request.path, e
            ))
        })
    }

    /// Execute a request whose body is irrelevant
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(&request).await?;
        Ok(())
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        ApiError::Storage("Stored access token is not a valid header value".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}
