//! View State and Reducer
//!
//! The view model a search produces, and the pure fold that builds it from
//! stream events.
//!
//! | Event            | Effect                                         |
//! |------------------|------------------------------------------------|
//! | `Status`         | append to the status log                       |
//! | `SearchResults`  | replace discovered URLs                        |
//! | `Listings`       | replace listings, clear selection              |
//! | `Error`          | record error, deactivate (terminal)            |
//! | `Complete`       | deactivate (terminal)                          |
//! | end of stream    | deactivate (terminal)                          |
//! | transport failure| record error, deactivate (terminal)            |
//!
//! Once a state is inactive it is a sink: further stream events are ignored.
//! Each state carries the [`Generation`] of the session that created it so
//! events from an older session can be told apart by identity.

use std::fmt;

use serde::Serialize;

use crate::listing::ListingRecord;
use crate::stream::StreamEvent;

/// Identity of one search session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    /// The generation after this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one particular listing set: which session, which replacement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ListingsKey {
    /// Session that produced the set
    pub generation: Generation,
    /// Replacement count within that session (0 = nothing received yet)
    pub revision: u64,
}

/// What applying an input did to the state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Transition {
    /// The state is inactive; nothing changed
    Ignored,
    /// A status line was appended
    StatusAppended,
    /// The discovered URL list was replaced
    UrlsReplaced,
    /// The listing set was replaced (selection cleared)
    ListingsReplaced,
    /// The session ended
    Terminated {
        /// Whether it ended with an error
        failed: bool,
    },
}

impl Transition {
    /// Whether the state changed at all
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Everything a surface needs to render one search
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ViewState {
    generation: Generation,
    status_log: Vec<String>,
    discovered_urls: Vec<String>,
    listings: Vec<ListingRecord>,
    listings_revision: u64,
    selected: Option<usize>,
    error: Option<String>,
    active: bool,
}

impl ViewState {
    /// Inactive state before any search has run
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh, active state for a new session
    #[must_use]
    pub fn begin(generation: Generation) -> Self {
        Self {
            generation,
            active: true,
            ..Self::default()
        }
    }

    /// Session that owns this state
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Progress lines, oldest first
    #[must_use]
    pub fn status_log(&self) -> &[String] {
        &self.status_log
    }

    /// Listing URLs the agent reported
    #[must_use]
    pub fn discovered_urls(&self) -> &[String] {
        &self.discovered_urls
    }

    /// Current listing set
    #[must_use]
    pub fn listings(&self) -> &[ListingRecord] {
        &self.listings
    }

    /// Identity of the current listing set
    #[must_use]
    pub fn listings_key(&self) -> ListingsKey {
        ListingsKey {
            generation: self.generation,
            revision: self.listings_revision,
        }
    }

    /// Index of the selected listing
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The selected listing
    #[must_use]
    pub fn selected_listing(&self) -> Option<&ListingRecord> {
        self.selected.and_then(|i| self.listings.get(i))
    }

    /// Terminal error, if the session failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the session is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply one stream event
    pub fn apply(&mut self, event: StreamEvent) -> Transition {
        if !self.active {
            return Transition::Ignored;
        }

        match event {
            StreamEvent::Status { message } => {
                self.status_log.push(message);
                Transition::StatusAppended
            }
            StreamEvent::SearchResults { urls } => {
                self.discovered_urls = urls;
                Transition::UrlsReplaced
            }
            StreamEvent::Listings { data } => {
                self.listings = data;
                self.listings_revision += 1;
                self.selected = None;
                Transition::ListingsReplaced
            }
            StreamEvent::Error { message } => self.terminate(Some(message)),
            StreamEvent::Complete { message } => {
                if let Some(message) = message {
                    tracing::debug!(generation = %self.generation, %message, "Search complete");
                }
                self.terminate(None)
            }
        }
    }

    /// The body ended without an explicit terminal event
    pub fn finish_stream(&mut self) -> Transition {
        if !self.active {
            return Transition::Ignored;
        }
        self.terminate(None)
    }

    /// The transport failed; record why and stop
    pub fn fail(&mut self, message: impl Into<String>) -> Transition {
        if !self.active {
            return Transition::Ignored;
        }
        self.terminate(Some(message.into()))
    }

    fn terminate(&mut self, error: Option<String>) -> Transition {
        let failed = error.is_some();
        self.error = error;
        self.active = false;
        Transition::Terminated { failed }
    }

    /// Select a listing by index, or clear the selection.
    ///
    /// Out-of-range indices are refused. Returns whether the selection changed.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        if index.is_some_and(|i| i >= self.listings.len()) || index == self.selected {
            return false;
        }
        self.selected = index;
        true
    }

    /// Select `index`, or clear the selection if it is already selected
    pub fn toggle_selection(&mut self, index: usize) -> bool {
        if self.selected == Some(index) {
            self.select(None)
        } else {
            self.select(Some(index))
        }
    }
}

/// Pure reducer: `(state, event) -> state'`
#[must_use]
pub fn reduce(mut state: ViewState, event: StreamEvent) -> ViewState {
    let _ = state.apply(event);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::tests::listing;
    use pretty_assertions::assert_eq;

    fn status(message: &str) -> StreamEvent {
        StreamEvent::Status {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_then_complete() {
        let state = [status("searching"), StreamEvent::Complete { message: None }]
            .into_iter()
            .fold(ViewState::begin(Generation::default().next()), reduce);

        assert_eq!(state.status_log(), ["searching".to_string()]);
        assert!(state.listings().is_empty());
        assert!(!state.is_active());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_listings_replace_wholesale_and_clear_selection() {
        let mut state = ViewState::begin(Generation::default().next());
        let _ = state.apply(StreamEvent::Listings {
            data: vec![listing("a", &[1.0, 1.0]), listing("b", &[2.0, 2.0])],
        });
        assert!(state.select(Some(1)));
        let first_key = state.listings_key();

        let transition = state.apply(StreamEvent::Listings {
            data: vec![listing("c", &[3.0, 3.0])],
        });
        assert_eq!(transition, Transition::ListingsReplaced);

        let titles: Vec<&str> = state.listings().iter().map(ListingRecord::title).collect();
        assert_eq!(titles, vec!["c"]);
        assert_eq!(state.selected(), None);
        assert_ne!(state.listings_key(), first_key);
    }

    #[test]
    fn test_terminal_state_is_a_sink() {
        let mut state = ViewState::begin(Generation::default().next());
        let _ = state.apply(status("one"));
        let transition = state.apply(StreamEvent::Error {
            message: "agent crashed".to_string(),
        });
        assert_eq!(transition, Transition::Terminated { failed: true });

        let frozen = state.clone();
        assert_eq!(state.apply(status("two")), Transition::Ignored);
        assert_eq!(
            state.apply(StreamEvent::Complete { message: None }),
            Transition::Ignored
        );
        assert_eq!(state.finish_stream(), Transition::Ignored);
        assert_eq!(state.fail("late"), Transition::Ignored);
        assert_eq!(state, frozen);
        assert_eq!(state.error(), Some("agent crashed"));
    }

    #[test]
    fn test_end_of_stream_terminates_without_error() {
        let mut state = ViewState::begin(Generation::default().next());
        assert_eq!(
            state.finish_stream(),
            Transition::Terminated { failed: false }
        );
        assert!(!state.is_active());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_status_log_monotonic() {
        let mut state = ViewState::begin(Generation::default().next());
        let mut last_len = 0;
        for event in [
            status("a"),
            StreamEvent::SearchResults { urls: vec![] },
            status("b"),
            StreamEvent::Listings { data: vec![] },
            status("c"),
        ] {
            let _ = state.apply(event);
            assert!(state.status_log().len() >= last_len);
            last_len = state.status_log().len();
        }
        assert_eq!(last_len, 3);
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut state = ViewState::begin(Generation::default().next());
        assert!(!state.select(Some(0)));
        let _ = state.apply(StreamEvent::Listings {
            data: vec![listing("a", &[1.0, 1.0])],
        });
        assert!(state.select(Some(0)));
        assert!(!state.select(Some(0)));
        assert!(!state.select(Some(5)));
        assert_eq!(state.selected_listing().map(ListingRecord::title), Some("a"));
        assert!(state.toggle_selection(0));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_idle_state_ignores_events() {
        let mut state = ViewState::idle();
        assert_eq!(state.apply(status("stray")), Transition::Ignored);
        assert!(state.status_log().is_empty());
    }
}
