//! HTTP client for the query tool API with connection pooling.

use dbq_core::api::{ApiError, GENERIC_FAILURE_MESSAGE};
use dbq_core::config::ClientConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Thin JSON client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| ApiError::Transport(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and returns the parsed body, or `None` for
    /// `204 No Content` and empty success bodies.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "sending request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|error| {
            warn!(%method, %url, %error, "request did not complete");
            ApiError::Transport(error.to_string())
        })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        if !status.is_success() {
            let message = error_message(&bytes);
            warn!(%method, %url, status = status.as_u16(), %message, "request failed");
            return Err(ApiError::status(status.as_u16(), message));
        }

        if status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| ApiError::Decode(format!("failed to parse response: {error}")))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        require_body(self.fetch(Method::GET, path, None).await?)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        require_body(self.fetch(Method::POST, path, Some(to_json(body)?)).await?)
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        require_body(self.fetch(Method::POST, path, None).await?)
    }

    /// POST whose response body, if any, is ignored.
    pub(crate) async fn post_discarding<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.fetch::<Value>(Method::POST, path, Some(to_json(body)?))
            .await
            .map(|_| ())
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        require_body(self.fetch(Method::PUT, path, Some(to_json(body)?)).await?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.fetch::<Value>(Method::DELETE, path, None)
            .await
            .map(|_| ())
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|error| ApiError::Decode(format!("failed to encode request: {error}")))
}

fn require_body<T>(body: Option<T>) -> Result<T, ApiError> {
    body.ok_or_else(|| ApiError::Decode("response body was empty".to_string()))
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    detail: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Best-effort message of a failed response: `error.message`, then a string
/// `detail`, then the generic fallback.
#[must_use]
pub fn error_message(body: &[u8]) -> String {
    let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) else {
        return GENERIC_FAILURE_MESSAGE.to_string();
    };

    if let Some(message) = envelope
        .error
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
    {
        return message;
    }

    match envelope.detail {
        Some(Value::String(detail)) if !detail.trim().is_empty() => detail,
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

/// Percent-encodes an identifier so it stays a single path segment.
#[must_use]
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
