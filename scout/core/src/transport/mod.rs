//! Agent Service Transport
//!
//! The seam between a search session and the network. A transport issues the
//! search request and hands back the response body as a raw byte stream; it
//! knows nothing about framing or events.
//!
//! # Available Transports
//!
//! - **Http**: `reqwest` client against the agent service (default)
//! - **Scripted**: replays canned response bodies, split into arbitrary
//!   chunks (replay mode and tests)

mod http;
mod scripted;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use crate::request::SearchRequest;

pub use http::HttpTransport;
pub use scripted::{ScriptedResponse, ScriptedTransport};

/// Response body as it arrives, chunk by chunk
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Failures between the client and the agent service
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with a non-success status; the body is not read
    #[error("Server error: {code} {reason}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Canonical reason phrase
        reason: String,
    },

    /// The request never got a response
    #[error("Request failed: {0}")]
    Request(String),

    /// The body stream broke after the response started
    #[error("Stream error: {0}")]
    Stream(String),
}

/// Transport trait
///
/// Implement this to reach the agent service some other way.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &str;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Send the request and return the response body stream.
    ///
    /// Must return [`TransportError::Status`] without touching the body when
    /// the service answers with a non-success status.
    async fn open(&self, request: &SearchRequest) -> Result<ByteStream, TransportError>;
}
