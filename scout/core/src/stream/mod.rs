//! Event Stream Pipeline
//!
//! Converts the agent service's chunked response body into typed events.
//!
//! ```text
//!   bytes ──► EventFramer ──► blocks ──► decoder ──► StreamEvent
//!  (chunks)   (utf-8 + "\n\n")            (skip bad)
//! ```
//!
//! The framer is resumable across arbitrary chunk boundaries, including
//! boundaries inside a multi-byte character or inside the separator itself,
//! so the decoded event sequence does not depend on how the network split
//! the body. Undecodable blocks are logged and skipped; only a transport
//! failure surfaces as an `Err`.
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use scout_core::stream::decode_events;
//!
//! let mut events = std::pin::pin!(decode_events(byte_stream));
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?);
//! }
//! ```

mod decoder;
mod framer;

use futures::stream::{Stream, StreamExt};

pub use decoder::{decode_block, decode_or_skip, DecodeError, StreamEvent, DATA_PREFIX};
pub use framer::{frame_blocks, EventFramer, Utf8Decoder};

use crate::transport::{ByteStream, TransportError};

/// Frame and decode a byte stream into events, in arrival order
pub fn decode_events(bytes: ByteStream) -> impl Stream<Item = Result<StreamEvent, TransportError>> {
    frame_blocks(bytes).filter_map(|block| async move {
        match block {
            Ok(block) => decode_or_skip(&block).map(Ok),
            Err(e) => Some(Err(e)),
        }
    })
}
