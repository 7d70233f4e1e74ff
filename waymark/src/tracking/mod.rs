//! Tracking state: enabled flag, tracking mode, bearing source and the
//! render mode derived from them.

mod machine;
mod mode;
mod state;

pub use machine::{
    FollowDirective, RenderRequest, StateChange, SubscriptionChange, TrackingStateMachine,
};
pub use mode::{RenderMode, TrackingMode};
pub use state::OverlayState;
