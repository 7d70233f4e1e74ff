//! GPS course estimation.
//!
//! Turns location fixes into GPS-source heading readings.
//!
//! # Design
//!
//! - Trusts the receiver's reported bearing while moving faster than
//!   `min_speed_mps` (or when speed is unknown)
//! - Otherwise derives course from the oldest retained position to the newest
//! - Emits nothing while the derived displacement is under `min_distance_m`,
//!   since the course of a stationary user is noise

use std::collections::VecDeque;

use super::source::{BearingReading, HeadingSensor};
use crate::geo::{course_between, distance_m, LatLng};
use crate::location::LocationFix;

/// Default speed below which the receiver's bearing is ignored.
pub const DEFAULT_MIN_SPEED_MPS: f32 = 0.5;

/// Default number of positions retained for course derivation.
pub const DEFAULT_HISTORY_SAMPLES: usize = 10;

/// Minimum displacement for a derived course.
const MIN_DISTANCE_FOR_COURSE_M: f64 = 5.0;

/// Accuracy reported for receiver-provided bearings.
const REPORTED_BEARING_ACCURACY_DEG: f64 = 10.0;

/// Accuracy reported for bearings derived from position history.
const DERIVED_BEARING_ACCURACY_DEG: f64 = 20.0;

/// Derives GPS heading readings from a stream of fixes.
#[derive(Debug, Clone)]
pub struct GpsBearingEstimator {
    min_speed_mps: f32,
    min_distance_m: f64,
    capacity: usize,
    history: VecDeque<LatLng>,
}

impl GpsBearingEstimator {
    /// Create an estimator. `history_samples` is clamped to at least 2.
    pub fn new(min_speed_mps: f32, history_samples: usize) -> Self {
        let capacity = history_samples.max(2);
        Self {
            min_speed_mps,
            min_distance_m: MIN_DISTANCE_FOR_COURSE_M,
            capacity,
            history: VecDeque::with_capacity(capacity),
        }
    }

    /// Create an estimator with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MIN_SPEED_MPS, DEFAULT_HISTORY_SAMPLES)
    }

    /// Override the minimum displacement for derived courses.
    pub fn with_min_distance(mut self, meters: f64) -> Self {
        self.min_distance_m = meters;
        self
    }

    /// Record a fix and return a heading reading if one can be determined.
    pub fn push(&mut self, fix: &LocationFix) -> Option<BearingReading> {
        let position = fix.position();
        if !position.is_valid() {
            return None;
        }

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(position);

        let moving = fix.speed_mps.map_or(true, |s| s >= self.min_speed_mps);
        if let Some(bearing) = fix.bearing_degrees.filter(|b| b.is_finite()) {
            if moving {
                return Some(BearingReading::new(
                    bearing,
                    REPORTED_BEARING_ACCURACY_DEG,
                    HeadingSensor::Gps,
                    fix.timestamp_ms,
                ));
            }
        }

        self.derived_course().map(|course| {
            BearingReading::new(
                course,
                DERIVED_BEARING_ACCURACY_DEG,
                HeadingSensor::Gps,
                fix.timestamp_ms,
            )
        })
    }

    /// Course from the oldest to the newest retained position.
    pub fn derived_course(&self) -> Option<f64> {
        let oldest = *self.history.front()?;
        let newest = *self.history.back()?;
        if distance_m(oldest, newest) < self.min_distance_m {
            return None;
        }
        Some(course_between(oldest, newest))
    }

    /// Number of retained positions.
    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    /// Forget retained positions.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for GpsBearingEstimator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
