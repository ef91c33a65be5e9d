use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;

use super::{ApiError, REFRESH_PATH};

/// One field of a multipart body
#[derive(Debug, Clone)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// Description of a backend call that can be sent any number of times.
///
/// The client rebuilds the HTTP request from this value for every attempt,
/// which is what makes replay after a token refresh possible.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/dashboard/credits/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Sent without a bearer credential and never refreshed (login, signup, ...)
    pub public: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            public: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Requests to the refresh endpoint are never themselves refreshed
    pub fn targets_refresh_endpoint(&self) -> bool {
        self.path.contains(REFRESH_PATH)
    }

    pub(crate) fn build_multipart(fields: &[FormField]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        part = part.mime_str(mime)?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}
