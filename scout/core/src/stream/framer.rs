//! Event Framer
//!
//! Splits a chunked byte stream into blank-line separated message blocks.

use futures::stream::{self, Stream, StreamExt};

use crate::transport::{ByteStream, TransportError};

const BLOCK_SEPARATOR: &str = "\n\n";

// ============================================================================
// Resumable UTF-8
// ============================================================================

/// UTF-8 decoder that carries incomplete sequences across chunk boundaries.
///
/// Invalid bytes become U+FFFD; a multi-byte character split between two
/// chunks is held back until its remaining bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any held bytes) as forms complete text
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to() guarantees this prefix decodes
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Bytes held back waiting for the rest of a character
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ============================================================================
// Block Buffer
// ============================================================================

/// Push-based framer: feed chunks, get complete blocks back.
#[derive(Debug, Default)]
pub struct EventFramer {
    decoder: Utf8Decoder,
    buffer: String,
}

impl EventFramer {
    /// Create an empty framer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every block it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        // A lone '\r' at the end stays until its '\n' shows up
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut blocks = Vec::new();
        while let Some(pos) = self.buffer.find(BLOCK_SEPARATOR) {
            let block: String = self.buffer.drain(..pos + BLOCK_SEPARATOR.len()).collect();
            blocks.push(block[..pos].to_string());
        }
        blocks
    }

    /// Text held for a block that has not been terminated yet
    #[must_use]
    pub fn partial(&self) -> &str {
        &self.buffer
    }

    /// Drop whatever is left; an unterminated block cannot be decoded
    pub fn finish(self) {
        if !self.buffer.trim().is_empty() || self.decoder.pending_len() > 0 {
            tracing::debug!(
                partial_len = self.buffer.len(),
                pending_bytes = self.decoder.pending_len(),
                "Discarding unterminated block at end of stream"
            );
        }
    }
}

/// Frame a network byte stream into a lazy stream of blocks.
///
/// The result is tied to `bytes`; it ends when the transport does, and yields
/// a single `Err` (then ends) if the transport fails mid-stream.
pub fn frame_blocks(bytes: ByteStream) -> impl Stream<Item = Result<String, TransportError>> {
    struct State {
        bytes: ByteStream,
        framer: Option<EventFramer>,
        ready: std::collections::VecDeque<String>,
    }

    let state = State {
        bytes,
        framer: Some(EventFramer::new()),
        ready: std::collections::VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(block) = state.ready.pop_front() {
                return Some((Ok(block), state));
            }
            let framer = state.framer.as_mut()?;

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.ready.extend(framer.push(&chunk)),
                Some(Err(e)) => {
                    state.framer = None;
                    return Some((Err(e), state));
                }
                None => {
                    if let Some(framer) = state.framer.take() {
                        framer.finish();
                    }
                    return None;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_split_multibyte() {
        let text = "🏠 home";
        let bytes = text.as_bytes();
        let mut decoder = Utf8Decoder::new();

        assert_eq!(decoder.decode(&bytes[..2]), "");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.decode(&bytes[2..]), text);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_utf8_invalid_bytes_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_push_holds_partial_block() {
        let mut framer = EventFramer::new();
        assert!(framer.push(b"data: one").is_empty());
        assert_eq!(framer.partial(), "data: one");

        let blocks = framer.push(b"\n\ndata: two\n\ndata: thr");
        assert_eq!(blocks, vec!["data: one", "data: two"]);
        assert_eq!(framer.partial(), "data: thr");
    }

    #[test]
    fn test_separator_split_across_chunks() {
        let mut framer = EventFramer::new();
        assert!(framer.push(b"data: a\n").is_empty());
        assert_eq!(framer.push(b"\ndata: b\n\n"), vec!["data: a", "data: b"]);
    }

    #[test]
    fn test_crlf_normalized_across_chunks() {
        let mut framer = EventFramer::new();
        assert!(framer.push(b"data: a\r\n\r").is_empty());
        assert_eq!(framer.push(b"\n"), vec!["data: a"]);
    }

    #[tokio::test]
    async fn test_frame_blocks_discards_trailing_partial() {
        let chunks: Vec<Result<bytes::Bytes, TransportError>> = vec![
            Ok(bytes::Bytes::from_static(b"data: 1\n\nda")),
            Ok(bytes::Bytes::from_static(b"ta: 2\n\ndata: incomplete")),
        ];
        let bytes: ByteStream = Box::pin(stream::iter(chunks));
        let blocks: Vec<_> = frame_blocks(bytes).collect().await;
        let blocks: Vec<String> = blocks.into_iter().map(Result::unwrap).collect();
        assert_eq!(blocks, vec!["data: 1", "data: 2"]);
    }

    #[tokio::test]
    async fn test_frame_blocks_stops_after_transport_error() {
        let chunks: Vec<Result<bytes::Bytes, TransportError>> = vec![
            Ok(bytes::Bytes::from_static(b"data: 1\n\n")),
            Err(TransportError::Stream("connection reset".to_string())),
            Ok(bytes::Bytes::from_static(b"data: 2\n\n")),
        ];
        let bytes: ByteStream = Box::pin(stream::iter(chunks));
        let items: Vec<_> = frame_blocks(bytes).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(TransportError::Stream(_))));
    }
}
