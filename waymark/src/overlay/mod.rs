//! Overlay composition root.
//!
//! # Architecture
//!
//! ```text
//! LocationProvider ─┐                      ┌──► MarkerRenderer ──► RenderSurface
//!                   ├─► EventBus ─► OverlayView ─► TrackingStateMachine
//! BearingProvider ──┘   (channel)          └──► CameraFollowController ──► MapCamera
//!                                                │
//!                                                └──► SharedOverlayStatus (read-only)
//! ```
//!
//! [`OverlayView`] is the single entry point for the host. Every setter and
//! every provider event becomes a [`StateChange`](crate::tracking::StateChange)
//! which is applied in a fixed order:
//!
//! 1. provider subscriptions (failures degrade the state and queue a follow-up)
//! 2. camera follow
//! 3. marker redraw
//! 4. status publication

mod builder;
mod status;
mod view;

pub use builder::OverlayViewBuilder;
pub use status::{OverlayStatus, SharedOverlayStatus};
pub use view::{OverlayView, ANIMATION_FRAME_INTERVAL};
