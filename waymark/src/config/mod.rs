//! Overlay configuration.
//!
//! Settings live in an INI file at `~/.waymark/config.ini`. A missing file
//! means defaults; a present file only needs the keys it wants to change.
//!
//! # Example
//!
//! ```
//! use waymark::config::OverlayConfig;
//! use waymark::tracking::TrackingMode;
//!
//! let config = OverlayConfig::from_ini_str("[overlay]\ntracking_mode = follow\n").unwrap();
//! assert_eq!(config.overlay.tracking_mode, TrackingMode::Follow);
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CameraSettings, CompassSettings, GpsSettings, MarkerSettings, OverlayConfig, OverlaySettings,
    DEFAULT_GESTURE_DISMISS_TIMEOUT_MS, DEFAULT_MIN_ACCURACY_RADIUS_PX,
    DEFAULT_ROTATION_ANIMATION_MS, MAX_COMPASS_UPDATE_INTERVAL_MS, MIN_COMPASS_UPDATE_INTERVAL_MS,
};
