//! Network transport for anonymized payloads.
//!
//! The engine only sees the [`Transport`] trait; the production
//! implementation posts JSON to the statistics backend with a fixed request
//! timeout.  Tests substitute stub transports.

use std::time::Duration;

use async_trait::async_trait;
use liftlog_shared::AnonymousDataPayload;
use thiserror::Error;
use tracing::debug;

/// Per-request timeout enforced by the HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced by a send attempt.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The backend answered with a non-success status code.
    #[error("HTTP {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    /// The request did not complete within [`REQUEST_TIMEOUT`].
    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    /// Connection-level failure (DNS, TLS, refused, ...).
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// A one-shot payload sender.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one payload.  `Ok(())` means the backend accepted it.
    async fn send(&self, payload: &AnonymousDataPayload) -> Result<(), TransportError>;
}

/// HTTP transport posting payloads as JSON.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &AnonymousDataPayload) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        endpoint: self.endpoint.clone(),
                        timeout: REQUEST_TIMEOUT,
                    }
                } else {
                    TransportError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        debug!(endpoint = %self.endpoint, "payload delivered");
        Ok(())
    }
}
