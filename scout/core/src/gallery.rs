//! Gallery view model.
//!
//! Display-ready data for the status panel and the listing list, computed
//! from a [`ViewState`] plus the little bit of presentation state that belongs
//! to the surface rather than to the search: which cards are expanded and
//! whether the discovered-URL panel is open.

use std::collections::BTreeSet;

use serde::Serialize;
use url::Url;

use crate::view_state::{ListingsKey, ViewState};

/// Status messages containing this marker get the discovered-URL toggle
pub const INSPECTING_MARKER: &str = "inspecting listings";

const URL_DISPLAY_LIMIT: usize = 50;
const URL_DISPLAY_KEEP: usize = 47;

/// Shorten a URL to `host + path` for display.
///
/// Longer than 50 characters is cut to 47 plus `...`. Text that does not
/// parse as a URL is returned as is.
#[must_use]
pub fn display_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let display = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
    if display.chars().count() > URL_DISPLAY_LIMIT {
        let kept: String = display.chars().take(URL_DISPLAY_KEEP).collect();
        format!("{kept}...")
    } else {
        display
    }
}

/// One line of the status panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    /// Message as received
    pub text: String,
    /// Last line of a running search
    pub in_progress: bool,
    /// Discovered-URL count, on the "inspecting listings" line once URLs exist
    pub url_count: Option<usize>,
}

/// A discovered URL in the expanded panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UrlEntry {
    /// Link target
    pub url: String,
    /// Shortened text
    pub display: String,
}

/// Status panel contents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusPanel {
    /// Shown while searching or when there is anything to show
    pub visible: bool,
    /// Status log, oldest first
    pub lines: Vec<StatusLine>,
    /// Discovered URLs, when the panel is open and non-empty
    pub urls: Option<Vec<UrlEntry>>,
    /// Error of the last session
    pub error: Option<String>,
}

/// One listing card
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingCard {
    /// Position in the listing set
    pub index: usize,
    /// Headline
    pub title: String,
    /// Listing page on the rental site
    pub url: String,
    /// Neighborhood or city
    pub location: String,
    /// Monthly price, e.g. `$3,200/mo`
    pub price: String,
    /// Bedrooms/bathrooms
    pub specs: String,
    /// First image or the placeholder
    pub thumbnail: String,
    /// Currently selected
    pub selected: bool,
    /// Details shown
    pub expanded: bool,
    /// Description, only when expanded
    pub description: Option<String>,
    /// All images, only when expanded
    pub images: Vec<String>,
}

/// Everything a surface renders apart from the map
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GalleryView {
    /// Status panel
    pub status: StatusPanel,
    /// Listing cards in listing order
    pub cards: Vec<ListingCard>,
}

/// Presentation state kept next to the session
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    expanded: BTreeSet<usize>,
    urls_panel_open: bool,
    synced: Option<ListingsKey>,
}

impl Gallery {
    /// Fresh gallery, everything collapsed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget expansion state when the listing set was replaced
    pub fn sync(&mut self, state: &ViewState) {
        let key = state.listings_key();
        if self.synced != Some(key) {
            self.expanded.clear();
            self.synced = Some(key);
        }
    }

    /// Expand or collapse a card; returns whether it is now expanded
    pub fn toggle_expanded(&mut self, index: usize) -> bool {
        if self.expanded.remove(&index) {
            false
        } else {
            self.expanded.insert(index);
            true
        }
    }

    /// Whether a card is expanded
    #[must_use]
    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    /// Open or close the discovered-URL panel; returns whether it is open
    pub fn toggle_urls_panel(&mut self) -> bool {
        self.urls_panel_open = !self.urls_panel_open;
        self.urls_panel_open
    }

    /// Compute the view for `state`.
    ///
    /// Call [`Gallery::sync`] first so stale expansion state is dropped.
    #[must_use]
    pub fn view(&self, state: &ViewState) -> GalleryView {
        GalleryView {
            status: self.status_panel(state),
            cards: self.cards(state),
        }
    }

    fn status_panel(&self, state: &ViewState) -> StatusPanel {
        let log = state.status_log();
        let urls = state.discovered_urls();
        let last = log.len().checked_sub(1);

        let lines = log
            .iter()
            .enumerate()
            .map(|(i, text)| StatusLine {
                text: text.clone(),
                in_progress: state.is_active() && Some(i) == last,
                url_count: (text.contains(INSPECTING_MARKER) && !urls.is_empty())
                    .then_some(urls.len()),
            })
            .collect();

        let urls = (self.urls_panel_open && !urls.is_empty()).then(|| {
            urls.iter()
                .map(|url| UrlEntry {
                    url: url.clone(),
                    display: display_url(url),
                })
                .collect()
        });

        StatusPanel {
            visible: state.is_active() || !log.is_empty(),
            lines,
            urls,
            error: state.error().map(str::to_string),
        }
    }

    fn cards(&self, state: &ViewState) -> Vec<ListingCard> {
        state
            .listings()
            .iter()
            .enumerate()
            .map(|(index, listing)| {
                let expanded = self.is_expanded(index);
                let details = &listing.details;
                ListingCard {
                    index,
                    title: listing.title().to_string(),
                    url: listing.url().to_string(),
                    location: details.location.clone(),
                    price: listing.monthly_price(),
                    specs: listing.specs(),
                    thumbnail: listing.thumbnail().to_string(),
                    selected: state.selected() == Some(index),
                    expanded,
                    description: expanded.then(|| details.description.clone()),
                    images: if expanded {
                        details.images.clone()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect()
    }
}
