//! Compass smoothing and throttling.
//!
//! Raw magnetometer azimuth is noisy and arrives far faster than the marker
//! needs it. [`CompassFilter`] low-pass filters the heading along the shortest
//! arc (so 359° → 1° does not swing through south) and emits at most one
//! reading per update interval.

use std::time::{Duration, Instant};

use super::source::{BearingReading, HeadingSensor};
use crate::geo::{normalize_degrees, signed_angle_delta};

/// Default minimum spacing between emitted compass readings.
pub const DEFAULT_COMPASS_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Default exponential smoothing factor.
pub const DEFAULT_COMPASS_SMOOTHING: f64 = 0.35;

/// Smooths and throttles raw azimuth samples.
#[derive(Debug, Clone)]
pub struct CompassFilter {
    update_interval: Duration,
    smoothing: f64,
    smoothed: Option<f64>,
    last_emit: Option<Instant>,
}

impl CompassFilter {
    /// Create a filter.
    ///
    /// `smoothing` is the weight given to each new sample, clamped to
    /// `(0, 1]`; 1.0 disables smoothing.
    pub fn new(update_interval: Duration, smoothing: f64) -> Self {
        let smoothing = if smoothing.is_finite() {
            smoothing.clamp(f64::EPSILON, 1.0)
        } else {
            1.0
        };
        Self {
            update_interval,
            smoothing,
            smoothed: None,
            last_emit: None,
        }
    }

    /// Create a filter with default interval and smoothing.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_COMPASS_UPDATE_INTERVAL, DEFAULT_COMPASS_SMOOTHING)
    }

    /// Feed a raw azimuth sample.
    ///
    /// Returns a reading when the update interval has elapsed since the last
    /// emitted one. Non-finite samples are ignored.
    pub fn push(
        &mut self,
        azimuth_degrees: f64,
        accuracy_degrees: f64,
        now: Instant,
        timestamp_ms: i64,
    ) -> Option<BearingReading> {
        if !azimuth_degrees.is_finite() {
            return None;
        }

        let heading = match self.smoothed {
            None => normalize_degrees(azimuth_degrees),
            Some(previous) => normalize_degrees(
                previous + self.smoothing * signed_angle_delta(previous, azimuth_degrees),
            ),
        };
        self.smoothed = Some(heading);

        let due = self
            .last_emit
            .map_or(true, |last| now.duration_since(last) >= self.update_interval);
        if !due {
            return None;
        }

        self.last_emit = Some(now);
        Some(BearingReading::new(
            heading,
            accuracy_degrees,
            HeadingSensor::Compass,
            timestamp_ms,
        ))
    }

    /// Current smoothed heading, if any sample has been seen.
    pub fn smoothed_heading(&self) -> Option<f64> {
        self.smoothed
    }

    /// Forget filter history.
    pub fn reset(&mut self) {
        self.smoothed = None;
        self.last_emit = None;
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

impl Default for CompassFilter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::angular_difference;

    #[test]
    fn test_first_sample_emits_immediately() {
        let mut filter = CompassFilter::with_defaults();
        let reading = filter.push(42.0, 3.0, Instant::now(), 1).unwrap();
        assert!((reading.heading_degrees - 42.0).abs() < 1e-9);
        assert_eq!(reading.source, HeadingSensor::Compass);
    }

    #[test]
    fn test_throttles_within_interval() {
        let mut filter = CompassFilter::new(Duration::from_millis(100), 1.0);
        let t0 = Instant::now();

        assert!(filter.push(10.0, 3.0, t0, 0).is_some());
        assert!(filter.push(20.0, 3.0, t0 + Duration::from_millis(50), 0).is_none());
        let reading = filter
            .push(30.0, 3.0, t0 + Duration::from_millis(100), 0)
            .unwrap();
        assert!((reading.heading_degrees - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_takes_short_arc_across_north() {
        let mut filter = CompassFilter::new(Duration::ZERO, 0.5);
        let t0 = Instant::now();

        filter.push(350.0, 3.0, t0, 0);
        let reading = filter.push(10.0, 3.0, t0, 0).unwrap();

        // Halfway along the 20° arc, not halfway around through south.
        assert!(angular_difference(reading.heading_degrees, 0.0) < 1e-9);
    }

    #[test]
    fn test_nan_sample_ignored() {
        let mut filter = CompassFilter::with_defaults();
        assert!(filter.push(f64::NAN, 3.0, Instant::now(), 0).is_none());
        assert_eq!(filter.smoothed_heading(), None);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = CompassFilter::new(Duration::from_secs(10), 0.1);
        let t0 = Instant::now();
        filter.push(100.0, 3.0, t0, 0);
        filter.reset();

        let reading = filter.push(200.0, 3.0, t0, 0).unwrap();
        assert!((reading.heading_degrees - 200.0).abs() < 1e-9);
    }
}
