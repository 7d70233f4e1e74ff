//! Map camera interfaces and camera follow.
//!
//! The overlay does not own the map's camera engine. It talks to it through
//! two traits:
//!
//! - [`Projection`]: read-only geometry (where a position lands on screen)
//! - [`MapCamera`]: camera commands and the user-gesture flag
//!
//! [`HeadlessCamera`] implements both for simulation and tests.

mod follow;
mod headless;

pub use follow::{CameraFollowController, FollowOutcome};
pub use headless::{CameraMove, HeadlessCamera};

use crate::geo::{LatLng, ScreenPoint};

/// Screen geometry of the current map view.
pub trait Projection {
    /// Screen point of `position`, `None` if it cannot be projected.
    fn project(&self, position: LatLng) -> Option<ScreenPoint>;

    /// Screen point the camera is centered on.
    fn focal_point(&self) -> ScreenPoint;

    /// Ground resolution at `latitude` for the current zoom.
    fn meters_per_pixel(&self, latitude: f64) -> f64;
}

/// The map's camera subsystem.
pub trait MapCamera: Projection + Send {
    /// Center the camera on `target`, rotating to `bearing` when given.
    fn move_camera_to(&mut self, target: LatLng, bearing: Option<f64>);

    /// Whether the user is currently panning, zooming or rotating the map.
    fn is_user_gesture_in_progress(&self) -> bool;

    /// Abort any animated camera transition in flight.
    fn cancel_transitions(&mut self) {}
}
