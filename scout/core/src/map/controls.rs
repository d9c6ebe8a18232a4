//! Map control plugins.
//!
//! A control is attached once when MapSync takes ownership of a surface and
//! detached on teardown. Controls never move the camera themselves: they
//! describe an action, and MapSync carries it out when the surface reports
//! the control was activated.

use super::surface::{
    ControlAction, ControlDescriptor, ControlHandle, ControlPosition, MapSurface,
};

/// Two-method plugin interface for map controls
pub trait MapControl: Send {
    /// Add the control to `surface`
    fn attach(&mut self, surface: &mut dyn MapSurface) -> ControlHandle;

    /// Remove the control again
    fn detach(&mut self, surface: &mut dyn MapSurface, handle: ControlHandle);
}

/// Button that restores the camera to the last listing region
#[derive(Clone, Debug, Default)]
pub struct ResetViewControl {
    position: ControlPosition,
}

impl ResetViewControl {
    /// Create the control at the default (top-right) position
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the control somewhere else
    #[must_use]
    pub fn at(mut self, position: ControlPosition) -> Self {
        self.position = position;
        self
    }

    /// What the surface renders for this control
    #[must_use]
    pub fn descriptor(&self) -> ControlDescriptor {
        ControlDescriptor {
            label: "Reset map view".to_string(),
            position: self.position,
            action: ControlAction::ResetView,
        }
    }
}

impl MapControl for ResetViewControl {
    fn attach(&mut self, surface: &mut dyn MapSurface) -> ControlHandle {
        surface.add_control(self.descriptor())
    }

    fn detach(&mut self, surface: &mut dyn MapSurface, handle: ControlHandle) {
        surface.remove_control(handle);
    }
}
