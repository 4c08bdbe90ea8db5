//! HTTP client plumbing shared by the platform adapters

use crosspost_domain::{Platform, RemoteError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("crosspost/", env!("CARGO_PKG_VERSION"));

/// Client options common to every platform
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Request timeout; `None` waits as long as the remote does
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    pub fn build_client(&self) -> Result<Client, RemoteError> {
        let mut builder = Client::builder().user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {}", e)))
    }
}

pub(crate) fn transport_error(error: reqwest::Error) -> RemoteError {
    RemoteError::Transport(error.to_string())
}

/// Turn a non-2xx response into `RemoteError::Http` carrying the response body
pub(crate) async fn ensure_success(
    platform: Platform,
    response: Response,
) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Http {
        status: status.as_u16(),
        message: format!("{} API request failed ({}): {}", platform, status, body),
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    response
        .json()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    let base_url: String = base_url.into();
    base_url.trim_end_matches('/').to_string()
}
