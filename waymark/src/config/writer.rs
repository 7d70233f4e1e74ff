//! INI serialization: `OverlayConfig` → commented INI string.

use std::path::Path;

use super::settings::OverlayConfig;

/// Convert an `OverlayConfig` to the commented INI written to `config.ini`.
pub(super) fn to_config_string(config: &OverlayConfig) -> String {
    let foreground_icon = optional_path(config.marker.foreground_icon.as_deref());
    let bearing_icon = optional_path(config.marker.bearing_icon.as_deref());

    format!(
        r#"[overlay]
; Show the location marker when the overlay is attached.
enabled = {enabled}
; Camera tracking: none, follow, follow_with_bearing
tracking_mode = {tracking_mode}
; Marker rotation source: none, gps, compass
bearing_source = {bearing_source}

[compass]
; Minimum spacing between compass readings in milliseconds (1-999).
update_interval_ms = {update_interval_ms}
; Weight of each new azimuth sample (0 < x <= 1, 1 disables smoothing).
smoothing = {smoothing}

[gps]
; Below this speed (m/s) the receiver's bearing is ignored.
min_speed_mps = {min_speed_mps}
; Positions retained for deriving course when no bearing is reported.
history_samples = {history_samples}

[camera]
; How long automatic follow stays paused after a map gesture, in milliseconds.
gesture_dismiss_timeout_ms = {gesture_dismiss_timeout_ms}

[marker]
; Marker rotation animation length in milliseconds (0 disables animation).
rotation_animation_ms = {rotation_animation_ms}
; Draw the accuracy circle beneath the marker.
accuracy_circle = {accuracy_circle}
; Smallest accuracy circle radius worth drawing, in pixels.
min_accuracy_radius_px = {min_accuracy_radius_px}
; Optional PNG files replacing the built-in markers.
foreground_icon = {foreground_icon}
bearing_icon = {bearing_icon}
"#,
        enabled = config.overlay.enabled,
        tracking_mode = config.overlay.tracking_mode,
        bearing_source = config.overlay.bearing_source,
        update_interval_ms = config.compass.update_interval.as_millis(),
        smoothing = config.compass.smoothing,
        min_speed_mps = config.gps.min_speed_mps,
        history_samples = config.gps.history_samples,
        gesture_dismiss_timeout_ms = config.camera.gesture_dismiss_timeout.as_millis(),
        rotation_animation_ms = config.marker.rotation_animation.as_millis(),
        accuracy_circle = config.marker.accuracy_circle,
        min_accuracy_radius_px = config.marker.min_accuracy_radius_px,
        foreground_icon = foreground_icon,
        bearing_icon = bearing_icon,
    )
}

fn optional_path(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}
