//! Map Surface Abstraction
//!
//! The client never talks to a concrete map provider directly. Listings reach
//! the map through [`MapSync`], which owns one [`MapSurface`] and reconciles it
//! with the current view state:
//!
//! ```text
//!   ViewState ──► MapSync::sync ──► MapSurface (markers, camera, highlight)
//!                     ▲
//!   MapControl ───────┘ activation (reset view)
//! ```
//!
//! [`HeadlessMap`] is the in-memory surface used by the CLI and the tests.

mod controls;
mod headless;
mod surface;
mod sync;

pub use controls::{MapControl, ResetViewControl};
pub use headless::{Camera, HeadlessMap, SurfaceOp};
pub use surface::{
    ControlAction, ControlDescriptor, ControlHandle, ControlPosition, FitOptions, MapSurface,
    MarkerId, MarkerSpec, Popup,
};
pub use sync::{MapError, MapSync, SyncReport};
