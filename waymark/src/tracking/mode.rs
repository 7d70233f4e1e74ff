//! Tracking and render modes.

use std::fmt;
use std::str::FromStr;

use crate::bearing::BearingSource;
use crate::error::ParseEnumError;

/// Whether and how the camera follows the user's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingMode {
    /// The camera is free; the marker sits at the map's focal point.
    #[default]
    None,
    /// The camera follows position.
    Follow,
    /// The camera follows position and rotates with the heading.
    FollowWithBearing,
}

impl TrackingMode {
    /// Config and CLI spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::None => "none",
            TrackingMode::Follow => "follow",
            TrackingMode::FollowWithBearing => "follow_with_bearing",
        }
    }

    /// Whether the camera follows position in this mode.
    pub fn is_tracking(&self) -> bool {
        !matches!(self, TrackingMode::None)
    }

    /// Whether the camera also rotates with the heading.
    pub fn rotates_camera(&self) -> bool {
        matches!(self, TrackingMode::FollowWithBearing)
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(TrackingMode::None),
            "follow" => Ok(TrackingMode::Follow),
            "follow_with_bearing" => Ok(TrackingMode::FollowWithBearing),
            _ => Err(ParseEnumError {
                kind: "tracking mode",
                value: s.to_string(),
                expected: "none, follow, follow_with_bearing",
            }),
        }
    }
}

/// Visual state of the overlay, derived from enabled/tracking/bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Overlay hidden.
    #[default]
    None,
    /// Default marker at the map's focal point.
    Default,
    /// Bearing marker rotated to the heading.
    Bearing,
    /// Default marker at the user's position.
    FollowNoBearing,
}

impl RenderMode {
    /// Derive the render mode.
    ///
    /// ```text
    /// !enabled                  -> None
    /// tracking == None          -> Default
    /// bearing_source != None    -> Bearing
    /// otherwise                 -> FollowNoBearing
    /// ```
    pub fn derive(enabled: bool, tracking: TrackingMode, source: BearingSource) -> Self {
        if !enabled {
            RenderMode::None
        } else if tracking == TrackingMode::None {
            RenderMode::Default
        } else if source != BearingSource::None {
            RenderMode::Bearing
        } else {
            RenderMode::FollowNoBearing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::None => "none",
            RenderMode::Default => "default",
            RenderMode::Bearing => "bearing",
            RenderMode::FollowNoBearing => "follow_no_bearing",
        }
    }

    /// Whether anything is drawn in this mode.
    pub fn is_visible(&self) -> bool {
        !matches!(self, RenderMode::None)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
