//! INI parsing: `Ini` → `OverlayConfig`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::{
    OverlayConfig, MAX_COMPASS_UPDATE_INTERVAL_MS, MIN_COMPASS_UPDATE_INTERVAL_MS,
};

/// Parse an `Ini` into an `OverlayConfig`.
///
/// Starts from `OverlayConfig::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<OverlayConfig, ConfigFileError> {
    let mut config = OverlayConfig::default();

    // [overlay] section
    if let Some(section) = ini.section(Some("overlay")) {
        if let Some(v) = section.get("enabled") {
            config.overlay.enabled = parse_bool("overlay", "enabled", v)?;
        }
        if let Some(v) = section.get("tracking_mode") {
            config.overlay.tracking_mode = parse_value("overlay", "tracking_mode", v)?;
        }
        if let Some(v) = section.get("bearing_source") {
            config.overlay.bearing_source = parse_value("overlay", "bearing_source", v)?;
        }
    }

    // [compass] section
    if let Some(section) = ini.section(Some("compass")) {
        if let Some(v) = section.get("update_interval_ms") {
            let ms: u64 = parse_value("compass", "update_interval_ms", v)?;
            if !(MIN_COMPASS_UPDATE_INTERVAL_MS..=MAX_COMPASS_UPDATE_INTERVAL_MS).contains(&ms) {
                return Err(invalid(
                    "compass",
                    "update_interval_ms",
                    v,
                    "must be between 1 and 999",
                ));
            }
            config.compass.update_interval = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("smoothing") {
            let smoothing: f64 = parse_value("compass", "smoothing", v)?;
            if !(smoothing > 0.0 && smoothing <= 1.0) {
                return Err(invalid(
                    "compass",
                    "smoothing",
                    v,
                    "must be greater than 0 and at most 1",
                ));
            }
            config.compass.smoothing = smoothing;
        }
    }

    // [gps] section
    if let Some(section) = ini.section(Some("gps")) {
        if let Some(v) = section.get("min_speed_mps") {
            let speed: f32 = parse_value("gps", "min_speed_mps", v)?;
            if !speed.is_finite() || speed < 0.0 {
                return Err(invalid("gps", "min_speed_mps", v, "must be non-negative"));
            }
            config.gps.min_speed_mps = speed;
        }
        if let Some(v) = section.get("history_samples") {
            let samples: usize = parse_value("gps", "history_samples", v)?;
            if samples < 2 {
                return Err(invalid("gps", "history_samples", v, "must be at least 2"));
            }
            config.gps.history_samples = samples;
        }
    }

    // [camera] section
    if let Some(section) = ini.section(Some("camera")) {
        if let Some(v) = section.get("gesture_dismiss_timeout_ms") {
            let ms: u64 = parse_value("camera", "gesture_dismiss_timeout_ms", v)?;
            config.camera.gesture_dismiss_timeout = Duration::from_millis(ms);
        }
    }

    // [marker] section
    if let Some(section) = ini.section(Some("marker")) {
        if let Some(v) = section.get("rotation_animation_ms") {
            let ms: u64 = parse_value("marker", "rotation_animation_ms", v)?;
            config.marker.rotation_animation = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("accuracy_circle") {
            config.marker.accuracy_circle = parse_bool("marker", "accuracy_circle", v)?;
        }
        if let Some(v) = section.get("min_accuracy_radius_px") {
            let px: f64 = parse_value("marker", "min_accuracy_radius_px", v)?;
            if !px.is_finite() || px < 0.0 {
                return Err(invalid(
                    "marker",
                    "min_accuracy_radius_px",
                    v,
                    "must be non-negative",
                ));
            }
            config.marker.min_accuracy_radius_px = px;
        }
        if let Some(v) = section.get("foreground_icon") {
            config.marker.foreground_icon = parse_path(v);
        }
        if let Some(v) = section.get("bearing_icon") {
            config.marker.bearing_icon = parse_path(v);
        }
    }

    Ok(config)
}

fn parse_value<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(section, key, value, &e.to_string()))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn parse_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
