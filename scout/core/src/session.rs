//! Search Session
//!
//! Owns the single active [`ViewState`] and drives one request/stream
//! lifecycle at a time.
//!
//! # Lifecycle
//!
//! ```text
//!  submit() ──► guard ──► reset state ──► transport.open()
//!                                            │
//!                 non-success status ◄───────┤
//!                 (error, inactive)          │ body
//!                                            ▼
//!                                   reader task: frame + decode
//!                                            │ (generation, signal)
//!                                            ▼
//!                     next_transition(): apply in arrival order, publish
//! ```
//!
//! The reader task only forwards decoded events; every state mutation happens
//! in [`SearchSession::next_transition`] on the caller's task. Signals are
//! tagged with the [`Generation`] of the session that produced them, so a
//! stale reader can never touch a newer session's state.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::request::{FieldErrors, SearchForm, SearchRequest};
use crate::stream::{decode_events, StreamEvent};
use crate::transport::{ByteStream, SearchTransport, TransportError};
use crate::view_state::{Generation, Transition, ViewState};

/// Error shown when a submission was cancelled before the service answered
pub const ABANDONED_MESSAGE: &str = "Search request was abandoned";

/// Why a submission was refused
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A search is already running
    #[error("A search is already running (session {0})")]
    AlreadyActive(Generation),

    /// The form did not validate
    #[error(transparent)]
    Invalid(#[from] FieldErrors),
}

/// What the reader task reports
#[derive(Debug)]
enum Signal {
    Event(StreamEvent),
    Failed(TransportError),
    Ended,
}

#[derive(Debug)]
struct Tagged {
    generation: Generation,
    signal: Signal,
}

/// One search at a time, from request to terminal state
pub struct SearchSession {
    transport: Arc<dyn SearchTransport>,
    state: ViewState,
    generation: Generation,
    inbox: Option<mpsc::UnboundedReceiver<Tagged>>,
    reader: Option<JoinHandle<()>>,
    updates: watch::Sender<Arc<ViewState>>,
}

impl SearchSession {
    /// Create an idle session on top of a transport
    pub fn new(transport: Arc<dyn SearchTransport>) -> Self {
        let state = ViewState::idle();
        let (updates, _) = watch::channel(Arc::new(state.clone()));
        Self {
            transport,
            state,
            generation: Generation::default(),
            inbox: None,
            reader: None,
            updates,
        }
    }

    /// Current view state
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Whether a search is running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Generation of the latest session
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Receive every new view state as soon as it changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.updates.subscribe()
    }

    /// Validate a form and submit it
    pub async fn submit_form(&mut self, form: &SearchForm) -> Result<Generation, SubmitError> {
        let request = form.validate()?;
        self.submit(request).await
    }

    /// Start a new search.
    ///
    /// Refused without side effects while a search is running. A non-success
    /// response ends the new session immediately with an error; the returned
    /// generation is still the new session's. Dropping the returned future
    /// before the response arrives leaves a session with no reader, which the
    /// next call to this method or [`SearchSession::next_transition`] ends
    /// with [`ABANDONED_MESSAGE`].
    pub async fn submit(&mut self, request: SearchRequest) -> Result<Generation, SubmitError> {
        self.end_abandoned();
        if self.state.is_active() {
            tracing::warn!(generation = %self.generation, "Ignoring submit while a search is running");
            return Err(SubmitError::AlreadyActive(self.generation));
        }

        self.stop_reader();
        self.generation = self.generation.next();
        self.state = ViewState::begin(self.generation);
        self.publish();

        tracing::info!(
            generation = %self.generation,
            transport = self.transport.name(),
            max_listings = request.max_listings(),
            "Starting search"
        );

        match self.transport.open(&request).await {
            Ok(body) => self.spawn_reader(body),
            Err(e) => {
                tracing::warn!(generation = %self.generation, error = %e, "Search request failed");
                let _ = self.state.fail(e.to_string());
                self.publish();
            }
        }

        Ok(self.generation)
    }

    fn spawn_reader(&mut self, body: ByteStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = self.generation;

        self.inbox = Some(rx);
        self.reader = Some(tokio::spawn(async move {
            let mut events = std::pin::pin!(decode_events(body));

            while let Some(item) = events.next().await {
                let (signal, last) = match item {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        (Signal::Event(event), terminal)
                    }
                    Err(e) => (Signal::Failed(e), true),
                };
                if tx.send(Tagged { generation, signal }).is_err() {
                    tracing::debug!(%generation, "Session gone, stopping reader");
                    return;
                }
                if last {
                    return;
                }
            }

            let _ = tx.send(Tagged {
                generation,
                signal: Signal::Ended,
            });
        }));
    }

    /// End a session whose `submit` was dropped before its reader started
    fn end_abandoned(&mut self) -> Option<Transition> {
        if !self.state.is_active() || self.inbox.is_some() {
            return None;
        }
        tracing::warn!(generation = %self.generation, "Search request abandoned before a response");
        let transition = self.state.fail(ABANDONED_MESSAGE);
        self.publish();
        Some(transition)
    }

    fn stop_reader(&mut self) {
        self.inbox = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    /// Wait for the next signal of the running search and apply it.
    ///
    /// Returns `None` once the session is inactive.
    pub async fn next_transition(&mut self) -> Option<Transition> {
        if let Some(transition) = self.end_abandoned() {
            return Some(transition);
        }

        while self.state.is_active() {
            let inbox = self.inbox.as_mut()?;

            let Some(Tagged { generation, signal }) = inbox.recv().await else {
                // Reader dropped its sender without a final signal
                return Some(self.apply_signal(self.generation, Signal::Ended));
            };

            let transition = self.apply_signal(generation, signal);
            if transition.changed() {
                return Some(transition);
            }
        }
        None
    }

    /// Drive the running search to its end and return the final state
    pub async fn run_to_end(&mut self) -> &ViewState {
        while self.next_transition().await.is_some() {}
        &self.state
    }

    /// Apply a stream event on behalf of `generation`.
    ///
    /// Events from any generation other than the current one are dropped.
    pub fn apply_event(&mut self, generation: Generation, event: StreamEvent) -> Transition {
        self.apply_signal(generation, Signal::Event(event))
    }

    fn apply_signal(&mut self, generation: Generation, signal: Signal) -> Transition {
        if generation != self.generation {
            tracing::trace!(
                stale = %generation,
                current = %self.generation,
                "Dropping signal from an older session"
            );
            return Transition::Ignored;
        }

        let transition = match signal {
            Signal::Event(event) => {
                tracing::debug!(%generation, kind = event.kind(), "Applying event");
                self.state.apply(event)
            }
            Signal::Failed(e) => {
                tracing::warn!(%generation, error = %e, "Search stream failed");
                self.state.fail(e.to_string())
            }
            Signal::Ended => self.state.finish_stream(),
        };

        if transition.changed() {
            self.publish();
        }
        if let Transition::Terminated { failed } = transition {
            tracing::info!(
                %generation,
                failed,
                listings = self.state.listings().len(),
                "Search finished"
            );
            self.inbox = None;
        }
        transition
    }

    /// Select a listing (or clear the selection)
    pub fn select(&mut self, index: Option<usize>) -> bool {
        let changed = self.state.select(index);
        if changed {
            self.publish();
        }
        changed
    }

    /// Select a listing, or clear it if it is already selected
    pub fn toggle_selection(&mut self, index: usize) -> bool {
        let changed = self.state.toggle_selection(index);
        if changed {
            self.publish();
        }
        changed
    }

    fn publish(&self) {
        self.updates.send_replace(Arc::new(self.state.clone()));
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.stop_reader();
    }
}
