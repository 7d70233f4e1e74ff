//! Location fix model.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{OverlayError, OverlayResult};
use crate::geo::LatLng;

/// A single position sample reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters (68% confidence).
    pub accuracy_m: f32,
    /// Direction of travel in degrees, when the receiver reports one.
    pub bearing_degrees: Option<f64>,
    /// Ground speed in meters per second, when known.
    pub speed_mps: Option<f32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl LocationFix {
    /// Create a fix without bearing or speed.
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f32, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            bearing_degrees: None,
            speed_mps: None,
            timestamp_ms,
        }
    }

    /// Set the reported direction of travel.
    pub fn with_bearing(mut self, bearing_degrees: f64) -> Self {
        self.bearing_degrees = Some(bearing_degrees);
        self
    }

    /// Set the reported ground speed.
    pub fn with_speed(mut self, speed_mps: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// Position of the fix.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Reject fixes that cannot be placed on the map.
    pub fn validate(&self) -> OverlayResult<()> {
        let reason = if !self.latitude.is_finite() {
            Some("latitude is not finite")
        } else if !self.longitude.is_finite() {
            Some("longitude is not finite")
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            Some("latitude out of range")
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            Some("longitude out of range")
        } else if !self.accuracy_m.is_finite() || self.accuracy_m < 0.0 {
            Some("accuracy must be a non-negative number")
        } else if self.bearing_degrees.is_some_and(|b| !b.is_finite()) {
            Some("bearing is not finite")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(OverlayError::InvalidFix {
                latitude: self.latitude,
                longitude: self.longitude,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fix() {
        let fix = LocationFix::new(53.55, 9.99, 12.0, 1_700_000_000_000)
            .with_bearing(45.0)
            .with_speed(1.4);
        assert!(fix.validate().is_ok());
        assert_eq!(fix.position(), LatLng::new(53.55, 9.99));
        assert_eq!(fix.bearing_degrees, Some(45.0));
        assert_eq!(fix.speed_mps, Some(1.4));
    }

    #[test]
    fn test_nan_latitude_rejected() {
        let fix = LocationFix::new(f64::NAN, 9.99, 12.0, 0);
        match fix.validate() {
            Err(OverlayError::InvalidFix { reason, .. }) => {
                assert_eq!(reason, "latitude is not finite")
            }
            other => panic!("expected InvalidFix, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(LocationFix::new(90.1, 0.0, 1.0, 0).validate().is_err());
        assert!(LocationFix::new(0.0, 181.0, 1.0, 0).validate().is_err());
    }

    #[test]
    fn test_bad_accuracy_rejected() {
        assert!(LocationFix::new(0.0, 0.0, -1.0, 0).validate().is_err());
        assert!(LocationFix::new(0.0, 0.0, f32::NAN, 0).validate().is_err());
        assert!(LocationFix::new(0.0, 0.0, 0.0, 0).validate().is_ok());
    }

    #[test]
    fn test_nan_bearing_rejected() {
        let fix = LocationFix::new(0.0, 0.0, 3.0, 0).with_bearing(f64::NAN);
        assert!(fix.validate().is_err());
    }

    #[test]
    fn test_now_timestamp_is_recent() {
        // 2020-01-01
        assert!(now_timestamp_ms() > 1_577_836_800_000);
    }
}
