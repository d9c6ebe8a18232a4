//! Search Requests
//!
//! The request a surface submits to the agent service, and the client-side
//! validation that guards it. A [`SearchRequest`] can only be obtained through
//! [`SearchForm::validate`], so a value that fails validation never reaches
//! the transport.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "description": "2br near the park under $3500",
//!   "planner": "gpt-4o",
//!   "executor": "gpt-4o-mini",
//!   "headless_mode": true,
//!   "max_listings": 10
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest number of listings a search may ask for
pub const MIN_LISTINGS: u8 = 1;

/// Largest number of listings a search may ask for
pub const MAX_LISTINGS: u8 = 50;

/// Default listing count when the form leaves it untouched
pub const DEFAULT_MAX_LISTINGS: u8 = 10;

// ============================================================================
// Model Identifiers
// ============================================================================

/// Models the agent service accepts for its planner and executor roles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// Small, fast model (default executor)
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    /// Larger model (default planner)
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    /// Anthropic model
    #[serde(rename = "claude-3-5-sonnet-latest")]
    Claude35Sonnet,
}

impl ModelId {
    /// Every accepted model, in the order a picker would list them
    pub const ALL: [ModelId; 3] = [Self::Gpt4oMini, Self::Gpt4o, Self::Claude35Sonnet];

    /// Identifier sent on the wire
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt4o => "gpt-4o",
            Self::Claude35Sonnet => "claude-3-5-sonnet-latest",
        }
    }

    /// Short label for pickers
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt4o => "gpt-4o",
            Self::Claude35Sonnet => "claude-3.5-sonnet",
        }
    }

    /// Default planner model
    #[must_use]
    pub fn default_planner() -> Self {
        Self::Gpt4o
    }

    /// Default executor model
    #[must_use]
    pub fn default_executor() -> Self {
        Self::Gpt4oMini
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known model identifier
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Unknown model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == trimmed || m.label() == trimmed)
            .ok_or_else(|| UnknownModel(trimmed.to_string()))
    }
}

// ============================================================================
// Validated Request
// ============================================================================

/// A validated search request, ready to be sent
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    description: String,
    planner: ModelId,
    executor: ModelId,
    headless_mode: bool,
    max_listings: u8,
}

impl SearchRequest {
    /// Free-text description of the apartment
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Planner model
    #[must_use]
    pub fn planner(&self) -> ModelId {
        self.planner
    }

    /// Executor model
    #[must_use]
    pub fn executor(&self) -> ModelId {
        self.executor
    }

    /// Whether the agent's browser runs headless
    #[must_use]
    pub fn headless_mode(&self) -> bool {
        self.headless_mode
    }

    /// Upper bound on listings the agent should inspect
    #[must_use]
    pub fn max_listings(&self) -> u8 {
        self.max_listings
    }
}

// ============================================================================
// Form Validation
// ============================================================================

/// Form fields that can fail validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// The free-text description
    Description,
    /// Planner model picker
    Planner,
    /// Executor model picker
    Executor,
    /// Maximum listings input
    MaxListings,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Description => "description",
            Self::Planner => "planner",
            Self::Executor => "executor",
            Self::MaxListings => "max listings",
        };
        f.write_str(name)
    }
}

/// Per-field validation messages
#[derive(Clone, Debug, Default, Error, PartialEq, Eq)]
#[error("Invalid search form: {}", summarize(.0))]
pub struct FieldErrors(BTreeMap<Field, String>);

fn summarize(errors: &BTreeMap<Field, String>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{field}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Message for a field, if it failed
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// True when no field failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over failed fields in display order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Raw, unvalidated form input as a surface collects it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchForm {
    /// Free-text description
    pub description: String,
    /// Planner identifier
    pub planner: String,
    /// Executor identifier
    pub executor: String,
    /// Headless checkbox
    pub headless_mode: bool,
    /// Max listings, exactly as typed
    pub max_listings: String,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            description: String::new(),
            planner: ModelId::default_planner().as_str().to_string(),
            executor: ModelId::default_executor().as_str().to_string(),
            headless_mode: true,
            max_listings: DEFAULT_MAX_LISTINGS.to_string(),
        }
    }
}

impl SearchForm {
    /// Create a form with defaults and the given description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Set the planner identifier
    pub fn with_planner(mut self, planner: impl Into<String>) -> Self {
        self.planner = planner.into();
        self
    }

    /// Set the executor identifier
    pub fn with_executor(mut self, executor: impl Into<String>) -> Self {
        self.executor = executor.into();
        self
    }

    /// Set headless mode
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless_mode = headless;
        self
    }

    /// Set the raw max listings text
    pub fn with_max_listings(mut self, max_listings: impl Into<String>) -> Self {
        self.max_listings = max_listings.into();
        self
    }

    /// Validate every field, collecting all failures
    pub fn validate(&self) -> Result<SearchRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let description = self.description.trim();
        if description.is_empty() {
            errors.insert(
                Field::Description,
                "Please describe the apartment you are looking for",
            );
        }

        let planner = self
            .planner
            .parse::<ModelId>()
            .map_err(|e| errors.insert(Field::Planner, e.to_string()))
            .ok();
        let executor = self
            .executor
            .parse::<ModelId>()
            .map_err(|e| errors.insert(Field::Executor, e.to_string()))
            .ok();

        let max_listings = match parse_max_listings(&self.max_listings) {
            Ok(n) => Some(n),
            Err(message) => {
                errors.insert(Field::MaxListings, message);
                None
            }
        };

        match (planner, executor, max_listings) {
            (Some(planner), Some(executor), Some(max_listings)) if errors.is_empty() => {
                Ok(SearchRequest {
                    description: description.to_string(),
                    planner,
                    executor,
                    headless_mode: self.headless_mode,
                    max_listings,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parse the max listings field, returning the user-facing message on failure
fn parse_max_listings(raw: &str) -> Result<u8, &'static str> {
    let value: i64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => "Cannot exceed 50",
        IntErrorKind::NegOverflow => "Must be at least 1",
        _ => "Please enter a valid number",
    })?;

    if value < i64::from(MIN_LISTINGS) {
        return Err("Must be at least 1");
    }
    if value > i64::from(MAX_LISTINGS) {
        return Err("Cannot exceed 50");
    }
    u8::try_from(value).map_err(|_| "Please enter a valid number")
}
