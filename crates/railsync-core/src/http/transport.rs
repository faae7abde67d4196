//! Transport collaborator interface
//!
//! The core never performs HTTP itself: it hands a fully built
//! `RestRequest` to an `HttpTransport` implementation and classifies the
//! `RestResponse` (or transport failure) that comes back. `ReqwestTransport`
//! is the default implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

pub use reqwest::Method;

/// A fully built request ready for the transport.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    /// Absolute URL, path and extension already assembled.
    pub url: String,
    /// Basic-auth credentials from the effective config.
    pub basic_auth: Option<(String, String)>,
    /// JSON body for write operations.
    pub body: Option<Value>,
}

/// The raw exchange result handed back by the transport.
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

/// A failure to complete the exchange at all (connectivity, timeout).
///
/// Surfaced to callers as [`Error::Transport`], uninterpreted.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport {
            message: err.message,
            source: err.source,
        }
    }
}

/// The HTTP client collaborator.
///
/// Implementations perform exactly one exchange per call and resolve with
/// either the raw response or a transport failure. The core issues no
/// retries; once a request is handed over it runs to completion.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: RestRequest) -> std::result::Result<RestResponse, TransportError>;
}

/// Default transport backed by a shared `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("failed to create HTTP client: {e}"),
                source: Some(anyhow::Error::new(e)),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: RestRequest) -> std::result::Result<RestResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError {
            message: e.to_string(),
            source: Some(anyhow::Error::new(e)),
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError {
            message: format!("failed to read response body: {e}"),
            source: Some(anyhow::Error::new(e)),
        })?;

        Ok(RestResponse { status, body })
    }
}
