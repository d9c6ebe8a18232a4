//! In-memory map surface.
//!
//! Keeps the markers, camera, highlight and controls a real map would show,
//! plus a log of every operation in order. The CLI renders from it and tests
//! assert against it.

use std::time::Duration;

use serde::Serialize;

use super::surface::{
    ControlDescriptor, ControlHandle, FitOptions, MapSurface, MarkerId, MarkerSpec,
};
use crate::config::MapConfig;
use crate::geo::{Bounds, LngLat};

/// Camera position
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Camera {
    /// Map center
    pub center: LngLat,
    /// Zoom level
    pub zoom: f64,
}

/// One call made against the surface
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SurfaceOp {
    /// `add_marker`
    AddMarker(MarkerId),
    /// `remove_all_markers`
    RemoveAllMarkers {
        /// Markers that were on the map
        removed: usize,
    },
    /// `fit_bounds`
    FitBounds {
        /// Camera after the fit
        camera: Camera,
        /// Requested animation length
        duration: Option<Duration>,
    },
    /// `fly_to`
    FlyTo {
        /// Camera after the flight
        camera: Camera,
        /// Requested animation length
        duration: Duration,
    },
    /// `highlight_marker`
    Highlight(Option<MarkerId>),
    /// `add_control`
    AddControl(ControlHandle),
    /// `remove_control`
    RemoveControl(ControlHandle),
}

/// A map surface that draws nothing
#[derive(Clone, Debug, Serialize)]
pub struct HeadlessMap {
    style: String,
    camera: Camera,
    markers: Vec<(MarkerId, MarkerSpec)>,
    highlighted: Option<MarkerId>,
    controls: Vec<(ControlHandle, ControlDescriptor)>,
    ops: Vec<SurfaceOp>,
    next_id: u64,
}

impl HeadlessMap {
    /// Create a surface at the configured default camera
    #[must_use]
    pub fn new(config: &MapConfig) -> Self {
        Self {
            style: config.style.clone(),
            camera: Camera {
                center: config.default_center,
                zoom: config.default_zoom,
            },
            markers: Vec::new(),
            highlighted: None,
            controls: Vec::new(),
            ops: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Map style URL
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Current camera
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Markers currently drawn, in insertion order
    #[must_use]
    pub fn markers(&self) -> &[(MarkerId, MarkerSpec)] {
        &self.markers
    }

    /// Highlighted marker
    #[must_use]
    pub fn highlighted(&self) -> Option<MarkerId> {
        self.highlighted
    }

    /// Attached controls
    #[must_use]
    pub fn controls(&self) -> &[(ControlHandle, ControlDescriptor)] {
        &self.controls
    }

    /// Every operation so far
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Forget the operation log
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

/// Zoom level at which `bounds` fills the view, capped at `max_zoom`
fn zoom_to_fit(bounds: &Bounds, max_zoom: f64) -> f64 {
    let (Some(sw), Some(ne)) = (bounds.south_west(), bounds.north_east()) else {
        return max_zoom;
    };
    let span = (ne.lng - sw.lng).max(ne.lat - sw.lat);
    if span <= f64::EPSILON {
        return max_zoom;
    }
    (360.0 / span).log2().min(max_zoom).max(0.0)
}

impl MapSurface for HeadlessMap {
    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id());
        self.markers.push((id, marker));
        self.ops.push(SurfaceOp::AddMarker(id));
        id
    }

    fn remove_all_markers(&mut self) {
        let removed = self.markers.len();
        self.markers.clear();
        self.highlighted = None;
        self.ops.push(SurfaceOp::RemoveAllMarkers { removed });
    }

    fn fit_bounds(&mut self, bounds: &Bounds, options: FitOptions) {
        let Some(center) = bounds.center() else {
            return;
        };
        self.camera = Camera {
            center,
            zoom: zoom_to_fit(bounds, options.max_zoom),
        };
        self.ops.push(SurfaceOp::FitBounds {
            camera: self.camera,
            duration: options.duration,
        });
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64, duration: Duration) {
        self.camera = Camera { center, zoom };
        self.ops.push(SurfaceOp::FlyTo {
            camera: self.camera,
            duration,
        });
    }

    fn highlight_marker(&mut self, marker: Option<MarkerId>) {
        self.highlighted = marker;
        self.ops.push(SurfaceOp::Highlight(marker));
    }

    fn add_control(&mut self, control: ControlDescriptor) -> ControlHandle {
        let handle = ControlHandle(self.next_id());
        self.controls.push((handle, control));
        self.ops.push(SurfaceOp::AddControl(handle));
        handle
    }

    fn remove_control(&mut self, handle: ControlHandle) {
        self.controls.retain(|(h, _)| *h != handle);
        self.ops.push(SurfaceOp::RemoveControl(handle));
    }
}
