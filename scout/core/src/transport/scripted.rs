//! Scripted transport: replays canned responses.
//!
//! Each call to [`SearchTransport::open`] consumes the next scripted response.
//! Bodies are cut into fixed-size chunks (or explicit chunks) so framing can
//! be exercised against any split, and every request is recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use super::{ByteStream, SearchTransport, TransportError};
use crate::request::SearchRequest;

/// One canned answer to a search request
#[derive(Clone, Debug)]
pub enum ScriptedResponse {
    /// Non-success HTTP status
    Status {
        /// Status code
        code: u16,
        /// Reason phrase
        reason: String,
    },
    /// Successful response streaming these chunks
    Body {
        /// Chunks in delivery order
        chunks: Vec<Bytes>,
        /// Fail with this message after the last chunk
        fail_with: Option<String>,
        /// Keep the stream open after the last chunk instead of ending it
        hold_open: bool,
    },
}

impl ScriptedResponse {
    /// Successful response delivering `body` in one chunk
    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        Self::Body {
            chunks: vec![Bytes::from(body.into())],
            fail_with: None,
            hold_open: false,
        }
    }

    /// Successful response delivering these exact chunks
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::Body {
            chunks: chunks.into_iter().map(|c| Bytes::from(c.into())).collect(),
            fail_with: None,
            hold_open: false,
        }
    }

    /// Non-success status response
    pub fn status(code: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            code,
            reason: reason.into(),
        }
    }

    /// Re-cut the body into chunks of at most `size` bytes
    #[must_use]
    pub fn with_chunk_size(self, size: usize) -> Self {
        match self {
            Self::Body {
                chunks,
                fail_with,
                hold_open,
            } => {
                let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
                let chunks = joined
                    .chunks(size.max(1))
                    .map(Bytes::copy_from_slice)
                    .collect();
                Self::Body {
                    chunks,
                    fail_with,
                    hold_open,
                }
            }
            status @ Self::Status { .. } => status,
        }
    }

    /// Break the stream with an I/O error after the last chunk
    #[must_use]
    pub fn failing_with(self, message: impl Into<String>) -> Self {
        match self {
            Self::Body {
                chunks, hold_open, ..
            } => Self::Body {
                chunks,
                fail_with: Some(message.into()),
                hold_open,
            },
            status @ Self::Status { .. } => status,
        }
    }

    /// Never end the stream after the last chunk
    #[must_use]
    pub fn held_open(self) -> Self {
        match self {
            Self::Body {
                chunks, fail_with, ..
            } => Self::Body {
                chunks,
                fail_with,
                hold_open: true,
            },
            status @ Self::Status { .. } => status,
        }
    }
}

/// Transport that replays [`ScriptedResponse`]s in order
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    chunk_delay: Option<Duration>,
}

impl ScriptedTransport {
    /// Create a transport with a queue of responses
    pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Pause between chunks, to pace a replay like a live search
    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Queue another response
    pub fn push(&self, response: ScriptedResponse) {
        self.responses.lock().push_back(response);
    }

    /// Every request opened so far
    #[must_use]
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests opened so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn open(&self, request: &SearchRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().push(request.clone());

        let response = self
            .responses
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::Request("No scripted response left".to_string()))?;

        let (chunks, fail_with, hold_open) = match response {
            ScriptedResponse::Status { code, reason } => {
                return Err(TransportError::Status { code, reason })
            }
            ScriptedResponse::Body {
                chunks,
                fail_with,
                hold_open,
            } => (chunks, fail_with, hold_open),
        };

        let delay = self.chunk_delay;
        let body = stream::iter(chunks.into_iter().map(Ok::<Bytes, TransportError>)).then(
            move |chunk| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                chunk
            },
        );
        let tail = stream::iter(fail_with.map(|m| Err(TransportError::Stream(m))));

        let body = body.chain(tail);
        if hold_open {
            Ok(Box::pin(body.chain(stream::pending())))
        } else {
            Ok(Box::pin(body))
        }
    }
}
