//! The narrow interface MapSync drives a map through.

use std::time::Duration;

use serde::Serialize;

use crate::geo::{Bounds, LngLat};
use crate::listing::ListingRecord;

/// Handle to a marker on a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerId(pub u64);

/// Handle to a control attached to a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ControlHandle(pub u64);

/// Popup attached to a marker
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Popup {
    /// Listing headline, linked to `url`
    pub title: String,
    /// Listing page on the rental site
    pub url: String,
    /// Monthly price, e.g. `$3,200/mo`
    pub price: String,
    /// Bedrooms/bathrooms line
    pub specs: String,
    /// First photo; surfaces show a "no image" box when absent
    pub image: Option<String>,
}

impl Popup {
    /// Summarize a listing for its marker popup
    #[must_use]
    pub fn for_listing(listing: &ListingRecord) -> Self {
        Self {
            title: listing.title().to_string(),
            url: listing.url().to_string(),
            price: listing.monthly_price(),
            specs: listing.specs(),
            image: listing.first_image().map(str::to_string),
        }
    }
}

/// Everything a surface needs to draw one marker
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// Where to put it
    pub position: LngLat,
    /// Text inside the marker (price)
    pub label: String,
    /// Popup shown on click
    pub popup: Popup,
}

/// Camera fit parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FitOptions {
    /// Pixels kept clear around the region
    pub padding: u32,
    /// Never zoom in closer than this
    pub max_zoom: f64,
    /// Animation length; `None` uses the surface default
    pub duration: Option<Duration>,
}

/// Where a control sits on the map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ControlPosition {
    /// Top-right corner
    #[default]
    TopRight,
    /// Top-left corner
    TopLeft,
    /// Bottom-right corner
    BottomRight,
    /// Bottom-left corner
    BottomLeft,
}

/// What happens when a control is activated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ControlAction {
    /// Fit the camera back to the last listing region
    ResetView,
}

/// A button-like control as the surface should render it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlDescriptor {
    /// Accessible label and tooltip
    pub label: String,
    /// Placement
    pub position: ControlPosition,
    /// Action reported back when activated
    pub action: ControlAction,
}

/// A map the client can draw on.
///
/// Only [`MapSync`](super::MapSync) calls the mutating methods; everything
/// else goes through it.
pub trait MapSurface {
    /// Draw a marker and return its handle
    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId;

    /// Remove every marker and its popup
    fn remove_all_markers(&mut self);

    /// Move the camera so `bounds` is fully visible
    fn fit_bounds(&mut self, bounds: &Bounds, options: FitOptions);

    /// Animate the camera to `center` at `zoom`
    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration);

    /// Emphasize one marker, or none
    fn highlight_marker(&mut self, marker: Option<MarkerId>);

    /// Render a control and return its handle
    fn add_control(&mut self, control: ControlDescriptor) -> ControlHandle;

    /// Remove a previously added control
    fn remove_control(&mut self, handle: ControlHandle);
}
