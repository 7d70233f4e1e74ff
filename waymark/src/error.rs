//! Error types for the location overlay.
//!
//! None of these errors are fatal to the host application. The overlay
//! recovers from each of them locally, logs a diagnostic, and falls back to
//! the least-capable correct rendering mode.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigFileError;

/// Result type for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Which provider an event, subscription or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// The platform location source.
    Location,
    /// The GPS or compass heading source.
    Bearing,
}

impl ProviderKind {
    /// Lowercase name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Location => "location",
            ProviderKind::Bearing => "bearing",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur inside the overlay core.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A location fix had NaN or out-of-range values. The fix is dropped.
    #[error("Invalid location fix ({latitude}, {longitude}): {reason}")]
    InvalidFix {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    /// A provider could not be subscribed or stopped delivering.
    #[error("{kind} provider unavailable: {reason}")]
    ProviderUnavailable { kind: ProviderKind, reason: String },

    /// The render surface has not been laid out yet; the render is deferred.
    #[error("Render surface is not laid out yet")]
    RenderSurfaceNotReady,

    /// A render surface could not be allocated.
    #[error("Invalid render surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    /// Drawable pixel data was inconsistent with its dimensions.
    #[error("Invalid drawable '{name}': {reason}")]
    InvalidDrawable { name: String, reason: String },

    /// A marker icon could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A snapshot could not be encoded.
    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    /// I/O error while reading icons or writing snapshots.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigFileError),

    /// The overlay builder was missing a collaborator.
    #[error("Overlay is missing a required component: {0}")]
    MissingComponent(&'static str),

    /// The overlay has already been detached from its map.
    #[error("Overlay has been detached")]
    Detached,
}

/// A mode or source name could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    /// What was being parsed, e.g. "tracking mode".
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Accepted spellings, comma separated.
    pub expected: &'static str,
}

impl OverlayError {
    /// Build an [`OverlayError::ProviderUnavailable`].
    pub fn provider_unavailable(kind: ProviderKind, reason: impl Into<String>) -> Self {
        OverlayError::ProviderUnavailable {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fix_display() {
        let err = OverlayError::InvalidFix {
            latitude: f64::NAN,
            longitude: 10.0,
            reason: "latitude is not finite".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid location fix"));
        assert!(msg.contains("latitude is not finite"));
    }

    #[test]
    fn test_provider_unavailable_display() {
        let err = OverlayError::provider_unavailable(ProviderKind::Bearing, "no magnetometer");
        assert_eq!(
            err.to_string(),
            "bearing provider unavailable: no magnetometer"
        );
    }

    #[test]
    fn test_parse_enum_error_display() {
        let err = ParseEnumError {
            kind: "bearing source",
            value: "sonar".to_string(),
            expected: "none, gps, compass",
        };
        assert_eq!(
            err.to_string(),
            "unknown bearing source 'sonar' (expected one of: none, gps, compass)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "icon.png");
        let err: OverlayError = io.into();
        assert!(matches!(err, OverlayError::Io(_)));
    }
}
