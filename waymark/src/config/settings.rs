//! Typed configuration structs and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::bearing::{
    BearingSource, DEFAULT_COMPASS_SMOOTHING, DEFAULT_COMPASS_UPDATE_INTERVAL,
    DEFAULT_HISTORY_SAMPLES, DEFAULT_MIN_SPEED_MPS,
};
use crate::tracking::TrackingMode;

// =============================================================================
// Defaults
// =============================================================================

/// Shortest allowed compass update interval.
pub const MIN_COMPASS_UPDATE_INTERVAL_MS: u64 = 1;

/// Longest allowed compass update interval. Heading updates stay sub-second.
pub const MAX_COMPASS_UPDATE_INTERVAL_MS: u64 = 999;

/// Default time automatic follow stays suspended after a user gesture.
pub const DEFAULT_GESTURE_DISMISS_TIMEOUT_MS: u64 = 3_000;

/// Default marker rotation animation length.
pub const DEFAULT_ROTATION_ANIMATION_MS: u64 = 250;

/// Default smallest accuracy circle worth drawing.
pub const DEFAULT_MIN_ACCURACY_RADIUS_PX: f64 = 4.0;

// =============================================================================
// Settings
// =============================================================================

/// Complete overlay configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayConfig {
    pub overlay: OverlaySettings,
    pub compass: CompassSettings,
    pub gps: GpsSettings,
    pub camera: CameraSettings,
    pub marker: MarkerSettings,
}

/// Initial overlay state applied on attach.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlaySettings {
    pub enabled: bool,
    pub tracking_mode: TrackingMode,
    pub bearing_source: BearingSource,
}

/// Compass filter settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassSettings {
    /// Minimum spacing between delivered compass readings.
    pub update_interval: Duration,
    /// Weight of each new azimuth sample, in `(0, 1]`.
    pub smoothing: f64,
}

impl Default for CompassSettings {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_COMPASS_UPDATE_INTERVAL,
            smoothing: DEFAULT_COMPASS_SMOOTHING,
        }
    }
}

/// GPS course estimation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsSettings {
    /// Below this speed the receiver's bearing is ignored.
    pub min_speed_mps: f32,
    /// Positions retained for derived course.
    pub history_samples: usize,
}

impl Default for GpsSettings {
    fn default() -> Self {
        Self {
            min_speed_mps: DEFAULT_MIN_SPEED_MPS,
            history_samples: DEFAULT_HISTORY_SAMPLES,
        }
    }
}

/// Camera follow settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// How long follow stays suspended after the last user gesture.
    pub gesture_dismiss_timeout: Duration,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            gesture_dismiss_timeout: Duration::from_millis(DEFAULT_GESTURE_DISMISS_TIMEOUT_MS),
        }
    }
}

/// Marker rendering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSettings {
    pub rotation_animation: Duration,
    pub accuracy_circle: bool,
    pub min_accuracy_radius_px: f64,
    /// PNG replacing the built-in foreground marker.
    pub foreground_icon: Option<PathBuf>,
    /// PNG replacing the built-in bearing marker.
    pub bearing_icon: Option<PathBuf>,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            rotation_animation: Duration::from_millis(DEFAULT_ROTATION_ANIMATION_MS),
            accuracy_circle: true,
            min_accuracy_radius_px: DEFAULT_MIN_ACCURACY_RADIUS_PX,
            foreground_icon: None,
            bearing_icon: None,
        }
    }
}

impl OverlayConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.overlay.enabled = enabled;
        self
    }

    pub fn with_tracking_mode(mut self, mode: TrackingMode) -> Self {
        self.overlay.tracking_mode = mode;
        self
    }

    pub fn with_bearing_source(mut self, source: BearingSource) -> Self {
        self.overlay.bearing_source = source;
        self
    }

    /// Set the compass update interval, clamped to 1..=999 ms.
    pub fn with_compass_update_interval(mut self, interval: Duration) -> Self {
        self.compass.update_interval = interval.clamp(
            Duration::from_millis(MIN_COMPASS_UPDATE_INTERVAL_MS),
            Duration::from_millis(MAX_COMPASS_UPDATE_INTERVAL_MS),
        );
        self
    }

    pub fn with_compass_smoothing(mut self, smoothing: f64) -> Self {
        self.compass.smoothing = smoothing;
        self
    }

    pub fn with_gesture_dismiss_timeout(mut self, timeout: Duration) -> Self {
        self.camera.gesture_dismiss_timeout = timeout;
        self
    }

    pub fn with_rotation_animation(mut self, duration: Duration) -> Self {
        self.marker.rotation_animation = duration;
        self
    }

    pub fn with_accuracy_circle(mut self, enabled: bool) -> Self {
        self.marker.accuracy_circle = enabled;
        self
    }

    pub fn with_foreground_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker.foreground_icon = Some(path.into());
        self
    }

    pub fn with_bearing_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker.bearing_icon = Some(path.into());
        self
    }
}
