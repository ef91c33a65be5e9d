use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::auth::RefreshError;

/// Per-field messages from a 400 response, e.g. `{"email": ["Enter a valid email address."]}`.
/// Messages that belong to no field are kept under `non_field_errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    const NON_FIELD: &'static str = "non_field_errors";

    /// Parse a DRF style error body. Unknown shapes end up as a single
    /// non-field message.
    pub fn from_body(body: &str) -> Self {
        let mut fields = BTreeMap::new();
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => {
                for (field, value) in map {
                    let field = match field.as_str() {
                        "detail" | "error" => Self::NON_FIELD.to_string(),
                        _ => field,
                    };
                    let messages = Self::messages(&value);
                    fields.entry(field).or_insert_with(Vec::new).extend(messages);
                }
            }
            Ok(other) => {
                fields.insert(Self::NON_FIELD.to_string(), Self::messages(&other));
            }
            Err(_) if !body.trim().is_empty() => {
                fields.insert(Self::NON_FIELD.to_string(), vec![body.trim().to_string()]);
            }
            Err(_) => {}
        }
        Self(fields)
    }

    fn messages(value: &serde_json::Value) -> Vec<String> {
        match value {
            serde_json::Value::String(s) => vec![s.clone()],
            serde_json::Value::Array(items) => items.iter().flat_map(Self::messages).collect(),
            other => vec![other.to_string()],
        }
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            if field == Self::NON_FIELD {
                write!(f, "{}", messages.join(" "))?;
            } else {
                write!(f, "{}: {}", field, messages.join(" "))?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Session expired: {0}")]
    RefreshFailed(#[from] RefreshError),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Invalid request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => ApiError::Validation(FieldErrors::from_body(body)),
            401 => ApiError::Unauthorized,
            402 => ApiError::InsufficientCredits(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }

    /// True when the session is gone and the user has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::RefreshFailed(_))
    }
}
