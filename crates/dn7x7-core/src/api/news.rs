//! Client for the public news API.
//!
//! Partners call these endpoints with an API key created on the dashboard.
//! Every successful call costs one credit; an exhausted balance surfaces as
//! `ApiError::InsufficientCredits`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{NewsArticle, NewsPage, NewsQuery};

use super::ApiError;

/// Header carrying the partner API key (`X-API-KEY`)
pub const API_KEY_HEADER: &str = "x-api-key";

const NEWS_PATH: &str = "/news/";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
}

impl NewsClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::InvalidResponse("API key is not a valid header value".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(String, String)]) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fetching news");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    /// One page of summaries, newest first
    pub async fn list(&self, query: &NewsQuery) -> Result<NewsPage, ApiError> {
        self.get(NEWS_PATH, &query.to_params()).await
    }

    pub async fn get_article(&self, id: i64) -> Result<NewsArticle, ApiError> {
        let path = format!("{}{}/", NEWS_PATH, id);
        self.get(&path, &[]).await
    }
}
