//! Read-only overlay status for verification tooling.
//!
//! The overlay publishes a fresh [`OverlayStatus`] after every applied
//! change. Readers take snapshots from any thread; reading never triggers a
//! redraw.
//!
//! ```
//! use waymark::overlay::SharedOverlayStatus;
//! use std::sync::Arc;
//!
//! let status = SharedOverlayStatus::new();
//! let reader = Arc::clone(&status);
//! assert!(!reader.is_visible());
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::marker::{DrawableId, RenderedMarker};
use crate::tracking::{OverlayState, RenderMode};

/// Point-in-time view of the overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayStatus {
    pub state: OverlayState,
    pub render_mode: RenderMode,
    pub marker: RenderedMarker,
    /// State redraws so far.
    pub redraw_count: u64,
    /// Frames drawn for the rotation animation.
    pub animation_frames: u64,
    /// Whether camera follow is paused by a user gesture.
    pub follow_suspended: bool,
    /// Whether a render is waiting for surface layout.
    pub pending_layout: bool,
    pub detached: bool,
}

/// Status shared between the overlay and its observers.
#[derive(Debug, Default)]
pub struct SharedOverlayStatus {
    inner: RwLock<OverlayStatus>,
}

impl SharedOverlayStatus {
    /// Create an empty status behind an `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of the current status.
    pub fn snapshot(&self) -> OverlayStatus {
        self.inner.read().clone()
    }

    /// Whether the marker is on screen.
    pub fn is_visible(&self) -> bool {
        self.inner.read().marker.visible
    }

    /// Whether camera follow was paused by a user gesture at the last publish.
    pub fn is_follow_suspended(&self) -> bool {
        self.inner.read().follow_suspended
    }

    /// Identity of the drawable on screen, `None` while hidden.
    pub fn active_drawable_id(&self) -> Option<DrawableId> {
        self.inner.read().marker.drawable
    }

    pub(crate) fn update(&self, status: OverlayStatus) {
        *self.inner.write() = status;
    }
}
