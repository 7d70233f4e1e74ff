//! Overlay state record.

use super::mode::{RenderMode, TrackingMode};
use crate::bearing::{BearingReading, BearingSource};
use crate::location::LocationFix;

/// The overlay's mutable state.
///
/// Owned by [`TrackingStateMachine`](super::TrackingStateMachine); every other
/// component works from a clone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    pub enabled: bool,
    pub tracking_mode: TrackingMode,
    pub bearing_source: BearingSource,
    pub last_fix: Option<LocationFix>,
    pub last_bearing: Option<BearingReading>,
}

impl OverlayState {
    /// Current render mode.
    pub fn render_mode(&self) -> RenderMode {
        RenderMode::derive(self.enabled, self.tracking_mode, self.bearing_source)
    }

    /// The cached reading, if it came from the currently selected source.
    pub fn active_bearing(&self) -> Option<BearingReading> {
        let sensor = self.bearing_source.sensor()?;
        self.last_bearing.filter(|reading| reading.source == sensor)
    }

    /// Whether the camera should follow position.
    pub fn is_following(&self) -> bool {
        self.enabled && self.tracking_mode.is_tracking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bearing::HeadingSensor;

    #[test]
    fn test_default_state_is_hidden() {
        let state = OverlayState::default();
        assert_eq!(state.render_mode(), RenderMode::None);
        assert!(!state.is_following());
    }

    #[test]
    fn test_active_bearing_filters_by_source() {
        let mut state = OverlayState {
            bearing_source: BearingSource::Compass,
            last_bearing: Some(BearingReading::new(90.0, 1.0, HeadingSensor::Gps, 0)),
            ..Default::default()
        };
        assert_eq!(state.active_bearing(), None);

        state.bearing_source = BearingSource::Gps;
        assert!(state.active_bearing().is_some());

        state.bearing_source = BearingSource::None;
        assert_eq!(state.active_bearing(), None);
    }
}
