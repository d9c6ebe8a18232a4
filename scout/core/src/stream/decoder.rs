//! Event Decoder
//!
//! Turns one framed block into a typed [`StreamEvent`]. This is the only place
//! untyped wire data becomes a `StreamEvent`; anything that does not convert
//! cleanly is reported as a [`DecodeError`] for the caller to log and skip.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::listing::ListingRecord;

/// Prefix that marks a block as carrying a payload
pub const DATA_PREFIX: &str = "data: ";

/// Events the agent service streams back during a search
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress line for the status log
    Status {
        /// Human-readable progress text
        message: String,
    },
    /// Listing pages the agent found and is about to inspect
    SearchResults {
        /// Listing URLs
        urls: Vec<String>,
    },
    /// Full replacement of the geocoded listing set
    Listings {
        /// Every listing known so far; records that do not decode are dropped
        #[serde(deserialize_with = "records_or_skip")]
        data: Vec<ListingRecord>,
    },
    /// The search failed on the service side
    Error {
        /// Failure description
        message: String,
    },
    /// The search finished
    Complete {
        /// Optional closing remark; logged, never shown
        #[serde(default)]
        message: Option<String>,
    },
}

impl StreamEvent {
    /// Discriminator value as it appears on the wire
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::SearchResults { .. } => "search_results",
            Self::Listings { .. } => "listings",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    /// Whether this event ends the session
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Complete { .. })
    }
}

/// Decode each listing on its own so one bad record costs only itself
fn records_or_skip<'de, D>(deserializer: D) -> Result<Vec<ListingRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let total = raw.len();
    let records: Vec<ListingRecord> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(index, %error, "Skipping undecodable listing record");
                None
            }
        })
        .collect();
    if records.len() < total {
        tracing::debug!(kept = records.len(), total, "Listing set partially decoded");
    }
    Ok(records)
}

const KNOWN_TYPES: [&str; 5] = ["status", "search_results", "listings", "error", "complete"];

/// Why a block could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON
    #[error("Malformed payload: {0}")]
    Json(#[source] serde_json::Error),

    /// Payload is JSON but has no string `type` field
    #[error("Payload has no type discriminator")]
    MissingType,

    /// `type` names an event this client does not know
    #[error("Unknown event type: {0}")]
    UnknownType(String),

    /// `type` is known but the fields do not match it
    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        /// The discriminator that was found
        kind: String,
        /// The underlying field error
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one block.
///
/// Returns `Ok(None)` for blocks without the `data: ` prefix (comments,
/// keep-alives, other SSE fields), which are not errors.
pub fn decode_block(block: &str) -> Result<Option<StreamEvent>, DecodeError> {
    let Some(payload) = block.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(payload).map_err(DecodeError::Json)?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(DecodeError::UnknownType(kind));
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| DecodeError::InvalidPayload { kind, source })
}

/// Decode one block, logging and discarding anything unusable
pub fn decode_or_skip(block: &str) -> Option<StreamEvent> {
    match decode_block(block) {
        Ok(Some(event)) => Some(event),
        Ok(None) => {
            tracing::trace!(len = block.len(), "Ignoring block without data prefix");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Skipping undecodable event block");
            None
        }
    }
}
