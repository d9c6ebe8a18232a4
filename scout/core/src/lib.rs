//! Scout Core - Headless Search Pipeline for rental-scout
//!
//! This crate turns an apartment description into a live, map-backed listing
//! view. It talks to the agent service's streaming search endpoint, folds the
//! event stream into a single view state and keeps a map surface in sync with
//! it. It has no UI dependencies: the CLI, a web front end or the tests drive
//! the same types.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │   ┌──────────┐   ┌──────────────┐   ┌──────────────────────────┐ │
//! │   │   CLI    │   │ Gallery view │   │ MapSurface (HeadlessMap) │ │
//! │   └────┬─────┘   └──────▲───────┘   └────────────▲─────────────┘ │
//! └────────┼────────────────┼────────────────────────┼───────────────┘
//!          │ SearchForm     │ ViewState              │ MapSync
//! ┌────────┼────────────────┼────────────────────────┼───────────────┐
//! │        ▼                │        SCOUT CORE      │               │
//! │  ┌───────────────┐   ┌──┴───────────┐   ┌────────┴─────────────┐ │
//! │  │ SearchSession │──►│  ViewState   │──►│       MapSync        │ │
//! │  │ guard + gen   │   │  (reducer)   │   │ markers/camera/select│ │
//! │  └──────┬────────┘   └──────▲───────┘   └──────────────────────┘ │
//! │         │ open()            │ StreamEvent                        │
//! │  ┌──────▼────────┐   ┌──────┴───────┐                            │
//! │  │ SearchTransport──►│ EventFramer  │                            │
//! │  │ (http/scripted)   │ + decoder    │                            │
//! │  └───────────────┘   └──────────────┘                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use scout_core::{load_config, HttpTransport, SearchSession};
//!
//! let config = load_config()?;
//! let transport = HttpTransport::new(&config.service)?;
//! let mut session = SearchSession::new(Arc::new(transport));
//!
//! session.submit_form(&config.search.form("2br near a park")).await?;
//! while let Some(transition) = session.next_transition().await {
//!     println!("{transition:?}: {:?}", session.state().status_log().last());
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`request`]: Search form validation and the wire request
//! - [`listing`]: Listing records and their display helpers
//! - [`geo`]: Coordinates and bounding boxes
//! - [`transport`]: Network seam (HTTP, scripted replay)
//! - [`stream`]: Byte framing and event decoding
//! - [`view_state`]: The reducer and its state
//! - [`session`]: One request/stream lifecycle at a time
//! - [`map`]: Map surface abstraction and reconciliation
//! - [`gallery`]: Status panel and listing card view model
//! - [`config`]: TOML, environment and CLI configuration

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod gallery;
pub mod geo;
pub mod listing;
pub mod map;
pub mod request;
pub mod session;
pub mod stream;
pub mod transport;
pub mod view_state;

// Re-exports for convenience
pub use geo::{Bounds, LngLat};
pub use listing::{ListingDetails, ListingRecord, PLACEHOLDER_IMAGE};
pub use request::{
    Field, FieldErrors, ModelId, SearchForm, SearchRequest, UnknownModel, DEFAULT_MAX_LISTINGS,
    MAX_LISTINGS, MIN_LISTINGS,
};
pub use session::{SearchSession, SubmitError};
pub use view_state::{reduce, Generation, ListingsKey, Transition, ViewState};

// Pipeline exports
pub use stream::{decode_block, decode_events, DecodeError, EventFramer, StreamEvent};
pub use transport::{
    ByteStream, HttpTransport, ScriptedResponse, ScriptedTransport, SearchTransport,
    TransportError,
};

// Map exports
pub use map::{
    HeadlessMap, MapControl, MapError, MapSurface, MapSync, MarkerId, ResetViewControl,
    SyncReport,
};

// Gallery exports
pub use gallery::{display_url, Gallery, GalleryView, ListingCard, StatusLine, StatusPanel};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, MapConfig, ScoutConfig, SearchDefaults, ServiceConfig,
};
