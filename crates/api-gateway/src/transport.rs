//! HTTP transport seam.
//!
//! The gateway talks to the network through this trait so its 401
//! recovery and classification logic can be exercised with scripted
//! in-memory transports.

use async_trait::async_trait;
use thiserror::Error;

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: reqwest::Method,
    pub url: String,
    /// Bearer token for the `Authorization` header, when signed.
    pub bearer_token: Option<String>,
    /// UI language for the `Accept-Language` header, when set.
    pub language: Option<String>,
    /// JSON request body, already envelope-wrapped.
    pub body: Option<serde_json::Value>,
}

/// Raw response: status plus unparsed body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Connection-level failure, before any status code exists.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),
}

/// Trait for executing prepared requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: TransportRequest)
        -> Result<TransportResponse, TransportError>;
}

/// Production transport over `reqwest`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(language) = &request.language {
            builder = builder.header("Accept-Language", language);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error.to_string())
    }
}
