//! Map Reconciliation
//!
//! [`MapSync`] owns a [`MapSurface`] for its whole lifetime and keeps it
//! consistent with the latest [`ViewState`]:
//!
//! - When the listing set changes (by [`ListingsKey`]), every marker is
//!   removed and the set is rebuilt from scratch. Listing counts are capped
//!   at 50, so a full rebuild is cheaper than diffing.
//! - Listings without a placeable position get no marker and no error.
//! - A non-empty marker region is fitted with fixed padding and a zoom cap;
//!   an empty one leaves the camera alone.
//! - Selection highlights the listing's marker and flies to it.
//! - The reset-view control restores the last fitted region.

use std::collections::HashMap;

use thiserror::Error;

use super::controls::MapControl;
use super::surface::{
    ControlAction, ControlHandle, FitOptions, MapSurface, MarkerId, MarkerSpec, Popup,
};
use crate::config::MapConfig;
use crate::geo::Bounds;
use crate::view_state::{ListingsKey, ViewState};

/// Map setup failures
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// No access token was configured for the map provider
    #[error("Map access token is missing; set MAPBOX_ACCESS_TOKEN or [map].access_token")]
    MissingAccessToken,
}

/// What a call to [`MapSync::sync`] did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Markers were rebuilt
    pub rebuilt: bool,
    /// Markers now on the map
    pub markers: usize,
    /// Listings left off the map for lack of a position
    pub unplaced: usize,
    /// The camera was fitted to the new region
    pub fitted: bool,
    /// The selection changed
    pub selection_changed: bool,
}

struct AttachedControl {
    handle: ControlHandle,
    control: Box<dyn MapControl>,
}

/// Keeps one map surface in step with the view state
pub struct MapSync<S: MapSurface> {
    surface: S,
    config: MapConfig,
    controls: Vec<AttachedControl>,
    actions: HashMap<ControlHandle, ControlAction>,
    marker_listing: HashMap<MarkerId, usize>,
    listing_marker: HashMap<usize, MarkerId>,
    last_bounds: Bounds,
    synced: Option<ListingsKey>,
    selected: Option<usize>,
}

impl<S: MapSurface> MapSync<S> {
    /// Take ownership of a surface.
    ///
    /// Fails if no access token is configured.
    pub fn new(surface: S, config: &MapConfig) -> Result<Self, MapError> {
        if config
            .access_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
        {
            return Err(MapError::MissingAccessToken);
        }

        Ok(Self {
            surface,
            config: config.clone(),
            controls: Vec::new(),
            actions: HashMap::new(),
            marker_listing: HashMap::new(),
            listing_marker: HashMap::new(),
            last_bounds: Bounds::new(),
            synced: None,
            selected: None,
        })
    }

    /// Attach a control plugin that reports `action` when activated
    pub fn attach_control(
        &mut self,
        mut control: Box<dyn MapControl>,
        action: ControlAction,
    ) -> ControlHandle {
        let handle = control.attach(&mut self.surface);
        self.actions.insert(handle, action);
        self.controls.push(AttachedControl { handle, control });
        handle
    }

    /// The owned surface
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Region of the markers from the last rebuild
    #[must_use]
    pub fn last_bounds(&self) -> &Bounds {
        &self.last_bounds
    }

    /// Listing index a marker stands for
    #[must_use]
    pub fn listing_for_marker(&self, marker: MarkerId) -> Option<usize> {
        self.marker_listing.get(&marker).copied()
    }

    /// Marker drawn for a listing index
    #[must_use]
    pub fn marker_for_listing(&self, index: usize) -> Option<MarkerId> {
        self.listing_marker.get(&index).copied()
    }

    /// Bring the surface in line with `state`
    pub fn sync(&mut self, state: &ViewState) -> SyncReport {
        let mut report = SyncReport::default();

        if self.synced != Some(state.listings_key()) {
            self.rebuild(state, &mut report);
            self.synced = Some(state.listings_key());
        } else {
            report.markers = self.marker_listing.len();
        }

        if state.selected() != self.selected {
            self.apply_selection(state);
            report.selection_changed = true;
        }

        report
    }

    fn rebuild(&mut self, state: &ViewState, report: &mut SyncReport) {
        self.surface.remove_all_markers();
        self.marker_listing.clear();
        self.listing_marker.clear();
        // remove_all_markers drops the highlight along with the markers
        self.selected = None;

        let mut bounds = Bounds::new();
        for (index, listing) in state.listings().iter().enumerate() {
            let Some(position) = listing.position() else {
                report.unplaced += 1;
                continue;
            };

            let marker = self.surface.add_marker(MarkerSpec {
                position,
                label: listing.price_label(),
                popup: Popup::for_listing(listing),
            });
            self.marker_listing.insert(marker, index);
            self.listing_marker.insert(index, marker);
            bounds.extend(position);
        }

        report.rebuilt = true;
        report.markers = self.marker_listing.len();
        self.last_bounds = bounds;

        if !bounds.is_empty() {
            self.surface.fit_bounds(&bounds, self.fit_options(None));
            report.fitted = true;
        }

        tracing::debug!(
            generation = %state.generation(),
            markers = report.markers,
            unplaced = report.unplaced,
            "Rebuilt map markers"
        );
    }

    fn apply_selection(&mut self, state: &ViewState) {
        self.selected = state.selected();

        let marker = self.selected.and_then(|i| self.marker_for_listing(i));
        self.surface.highlight_marker(marker);

        if let Some(position) = state.selected_listing().and_then(|l| l.position()) {
            self.surface.fly_to(
                position,
                self.config.select_zoom,
                self.config.animation_duration(),
            );
        }
    }

    fn fit_options(&self, duration: Option<std::time::Duration>) -> FitOptions {
        FitOptions {
            padding: self.config.fit_padding,
            max_zoom: self.config.max_fit_zoom,
            duration,
        }
    }

    /// Refit the camera to the last listing region.
    ///
    /// Returns `false` when there is no region to return to.
    pub fn reset_view(&mut self) -> bool {
        if self.last_bounds.is_empty() {
            return false;
        }
        let bounds = self.last_bounds;
        let options = self.fit_options(Some(self.config.animation_duration()));
        self.surface.fit_bounds(&bounds, options);
        true
    }

    /// Run the action of an activated control
    pub fn control_activated(&mut self, handle: ControlHandle) -> bool {
        match self.actions.get(&handle) {
            Some(ControlAction::ResetView) => self.reset_view(),
            None => {
                tracing::debug!(?handle, "Activation from unknown control");
                false
            }
        }
    }

    /// Detach every control, clear the markers and hand the surface back
    pub fn teardown(mut self) -> S {
        for mut attached in std::mem::take(&mut self.controls) {
            attached.control.detach(&mut self.surface, attached.handle);
        }
        self.surface.remove_all_markers();
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LngLat;
    use crate::listing::tests::listing;
    use crate::map::controls::ResetViewControl;
    use crate::map::headless::{HeadlessMap, SurfaceOp};
    use crate::stream::StreamEvent;
    use crate::view_state::Generation;

    fn config() -> MapConfig {
        MapConfig {
            access_token: Some("pk.test".to_string()),
            ..MapConfig::default()
        }
    }

    fn map_sync() -> MapSync<HeadlessMap> {
        let config = config();
        MapSync::new(HeadlessMap::new(&config), &config).unwrap()
    }

    fn state_with(listings: Vec<crate::listing::ListingRecord>) -> ViewState {
        let mut state = ViewState::begin(Generation::default().next());
        let _ = state.apply(StreamEvent::Listings { data: listings });
        state
    }

    #[test]
    fn test_missing_token_refused() {
        let config = MapConfig::default();
        assert_eq!(
            MapSync::new(HeadlessMap::new(&config), &config).err(),
            Some(MapError::MissingAccessToken)
        );
        let blank = MapConfig {
            access_token: Some("  ".to_string()),
            ..MapConfig::default()
        };
        assert!(MapSync::new(HeadlessMap::new(&blank), &blank).is_err());
    }

    #[test]
    fn test_sentinel_listing_gets_no_marker() {
        let mut sync = map_sync();
        let state = state_with(vec![
            listing("placed", &[-122.41, 37.77]),
            listing("sentinel", &[0.0, 0.0]),
            listing("short", &[-122.41]),
        ]);

        let report = sync.sync(&state);
        assert_eq!(report.markers, 1);
        assert_eq!(report.unplaced, 2);
        assert_eq!(state.listings().len(), 3);
        assert_eq!(sync.surface().markers().len(), 1);
        assert_eq!(sync.marker_for_listing(1), None);
    }

    #[test]
    fn test_sync_is_idempotent_for_same_listings() {
        let mut sync = map_sync();
        let state = state_with(vec![listing("a", &[-122.41, 37.77])]);

        assert!(sync.sync(&state).rebuilt);
        let ops = sync.surface().ops().len();
        let report = sync.sync(&state);
        assert!(!report.rebuilt);
        assert_eq!(report.markers, 1);
        assert_eq!(sync.surface().ops().len(), ops);
    }

    #[test]
    fn test_empty_region_leaves_camera() {
        let mut sync = map_sync();
        let before = sync.surface().camera();
        let report = sync.sync(&state_with(vec![listing("nowhere", &[0.0, 0.0])]));
        assert!(report.rebuilt);
        assert!(!report.fitted);
        assert_eq!(sync.surface().camera(), before);
        assert!(!sync.reset_view());
    }

    #[test]
    fn test_marker_click_selection_flies_and_highlights() {
        let mut sync = map_sync();
        let mut state = state_with(vec![
            listing("a", &[-122.41, 37.77]),
            listing("b", &[-122.27, 37.80]),
        ]);
        sync.sync(&state);

        let marker = sync.marker_for_listing(1).unwrap();
        let index = sync.listing_for_marker(marker).unwrap();
        assert!(state.select(Some(index)));

        let report = sync.sync(&state);
        assert!(report.selection_changed);
        assert_eq!(sync.surface().highlighted(), Some(marker));
        let camera = sync.surface().camera();
        assert_eq!(camera.center, LngLat::new(-122.27, 37.80));
        assert!((camera.zoom - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_view_control_refits_last_bounds() {
        let mut sync = map_sync();
        let handle = sync.attach_control(Box::new(ResetViewControl::new()), ControlAction::ResetView);
        assert_eq!(sync.surface().controls().len(), 1);

        let mut state = state_with(vec![
            listing("a", &[-122.41, 37.77]),
            listing("b", &[-122.27, 37.80]),
        ]);
        sync.sync(&state);
        let fitted = sync.surface().camera();

        assert!(state.select(Some(0)));
        sync.sync(&state);
        assert_ne!(sync.surface().camera(), fitted);

        assert!(sync.control_activated(handle));
        assert_eq!(sync.surface().camera(), fitted);
        assert!(matches!(
            sync.surface().ops().last(),
            Some(SurfaceOp::FitBounds { duration: Some(_), .. })
        ));
    }

    #[test]
    fn test_new_session_clears_previous_markers() {
        let mut sync = map_sync();
        sync.sync(&state_with(vec![listing("old", &[-122.41, 37.77])]));
        assert_eq!(sync.surface().markers().len(), 1);

        let fresh = ViewState::begin(Generation::default().next().next());
        let report = sync.sync(&fresh);
        assert!(report.rebuilt);
        assert!(sync.surface().markers().is_empty());
    }

    #[test]
    fn test_teardown_detaches_controls() {
        let mut sync = map_sync();
        sync.attach_control(Box::new(ResetViewControl::new()), ControlAction::ResetView);
        sync.sync(&state_with(vec![listing("a", &[-122.41, 37.77])]));

        let surface = sync.teardown();
        assert!(surface.controls().is_empty());
        assert!(surface.markers().is_empty());
    }
}
