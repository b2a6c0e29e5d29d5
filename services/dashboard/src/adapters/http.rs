//! services/dashboard/src/adapters/http.rs
//!
//! A thin wrapper around `reqwest` shared by the backend adapters. Each client is
//! bound to one base URL and one injected `CredentialProvider`, so bearer tokens
//! and API keys never cross trust domains.

use std::sync::Arc;
use std::time::Duration;

use jaison_core::ports::{Credential, CredentialProvider, PortError, PortResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Starts a request with the provider's credential attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, credential = self.credentials.name(), "Sending request");
        let builder = self.client.request(method, url);
        match self.credentials.credential() {
            Some(Credential::Bearer(token)) => builder.bearer_auth(token),
            Some(Credential::ApiKey(key)) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Starts a request without any credential, for public endpoints.
    pub fn public_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Sending public request");
        self.client.request(method, url)
    }

    /// Sends the request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let response = checked(builder.send().await.map_err(transport_error)?).await?;
        response.json::<T>().await.map_err(|e| {
            error!("Failed to decode response body: {}", e);
            PortError::Unexpected(format!("Failed to decode response: {}", e))
        })
    }

    /// Sends the request and ignores any body.
    pub async fn send_empty(&self, builder: RequestBuilder) -> PortResult<()> {
        checked(builder.send().await.map_err(transport_error)?).await?;
        Ok(())
    }
}

async fn checked(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = error_from_body(status, &body);
    error!("Backend returned HTTP {}: {}", status.as_u16(), err);
    Err(err)
}

fn transport_error(e: reqwest::Error) -> PortError {
    error!("Network error: {}", e);
    if e.is_timeout() {
        PortError::Transport("the request timed out".to_string())
    } else {
        PortError::Transport(e.to_string())
    }
}

/// The error bodies the backends produce: `{message}` from the OCR API's own
/// handlers and `{detail}` from framework-level errors.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
        return Some(message);
    }
    match parsed.detail? {
        Value::String(detail) => Some(detail),
        // Validation errors come back as a list of `{loc, msg, type}` objects.
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(String::from),
        _ => None,
    }
}

/// Maps a non-success response onto the port error taxonomy.
pub fn error_from_body(status: StatusCode, body: &str) -> PortError {
    let message = extract_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        StatusCode::NOT_FOUND => {
            PortError::NotFound(message.unwrap_or_else(|| "resource not found".to_string()))
        }
        _ => PortError::Backend {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| format!("Request failed with HTTP {}", status.as_u16())),
        },
    }
}
