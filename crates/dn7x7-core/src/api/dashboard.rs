//! Per-user dashboard: credit balance, API keys and usage logs.

use crate::models::{ApiCallLog, ApiKey, CreditBalance, LogFilter, NewApiKey, StatusResponse};

use super::{ApiClient, ApiError, ApiRequest};

const CREDITS_PATH: &str = "/dashboard/credits/";
const LIST_KEYS_PATH: &str = "/dashboard/list_keys/";
const CREATE_KEY_PATH: &str = "/dashboard/create_key/";
const LOGS_PATH: &str = "/dashboard/logs/";

impl ApiClient {
    /// Current balance; the backend applies the daily free-credit reset first
    pub async fn credits(&self) -> Result<CreditBalance, ApiError> {
        self.send_json(ApiRequest::get(CREDITS_PATH)).await
    }

    pub async fn list_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        self.send_json(ApiRequest::get(LIST_KEYS_PATH)).await
    }

    /// Create a key. The returned value holds the full secret.
    pub async fn create_key(&self, key: &NewApiKey) -> Result<ApiKey, ApiError> {
        let request = ApiRequest::post(CREATE_KEY_PATH).json(key)?;
        self.send_json(request).await
    }

    /// Deactivate a key. Revoked keys stay listed with `is_active = false`.
    pub async fn revoke_key(&self, id: i64) -> Result<StatusResponse, ApiError> {
        let path = format!("/dashboard/{}/revoke_key/", id);
        self.send_json(ApiRequest::post(path)).await
    }

    /// Most recent calls across all of the user's keys, newest first
    pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<ApiCallLog>, ApiError> {
        let request = ApiRequest::get(LOGS_PATH)
            .query("time_range", filter.time_range.as_str())
            .query("status_filter", filter.status_filter.as_str());
        let logs: Vec<ApiCallLog> = self.send_json(request).await?;
        Ok(filter.apply(logs))
    }
}
