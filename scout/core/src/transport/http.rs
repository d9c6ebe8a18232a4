//! HTTP transport for the agent service.
//!
//! `POST {endpoint}` with the request as JSON; the response body is streamed
//! back untouched. No read timeout is set because the service keeps the
//! stream open for as long as the search runs.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::{ByteStream, SearchTransport, TransportError};
use crate::config::ServiceConfig;
use crate::request::SearchRequest;

/// Agent service client
#[derive(Clone)]
pub struct HttpTransport {
    /// Search stream endpoint
    endpoint: String,
    /// Health endpoint
    health_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the configured service
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            health_url: config.health_url(),
            http_client,
        })
    }

    /// Search stream endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(&self.health_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, url = %self.health_url, "Health check failed");
                false
            }
        }
    }

    async fn open(&self, request: &SearchRequest) -> Result<ByteStream, TransportError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            planner = %request.planner(),
            executor = %request.executor(),
            max_listings = request.max_listings(),
            "Opening search stream"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Stream(e.to_string())));
        Ok(Box::pin(body))
    }
}
