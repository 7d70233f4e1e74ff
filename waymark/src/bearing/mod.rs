//! Bearing provider adapter.
//!
//! A [`BearingProvider`] delivers heading readings for one sensor at a time.
//! The overlay subscribes it with the [`HeadingSensor`] matching the current
//! [`BearingSource`] and unsubscribes it when the source changes or the
//! overlay is disabled.
//!
//! Two helpers turn raw platform data into readings:
//!
//! - [`CompassFilter`] smooths and throttles magnetometer azimuth
//! - [`GpsBearingEstimator`] derives direction of travel from fixes

mod compass;
mod gps;
mod source;

pub use compass::{CompassFilter, DEFAULT_COMPASS_SMOOTHING, DEFAULT_COMPASS_UPDATE_INTERVAL};
pub use gps::{GpsBearingEstimator, DEFAULT_HISTORY_SAMPLES, DEFAULT_MIN_SPEED_MPS};
pub use source::{BearingReading, BearingSource, HeadingSensor};

use crate::error::OverlayResult;
use crate::event::EventSink;

/// A source of heading readings.
pub trait BearingProvider: Send {
    /// Start delivering readings from `sensor` into `sink`.
    ///
    /// Any previous subscription has already been released by the caller.
    fn subscribe(&mut self, sensor: HeadingSensor, sink: EventSink) -> OverlayResult<()>;

    /// Stop delivering readings.
    fn unsubscribe(&mut self);

    /// Short name for log output.
    fn name(&self) -> &str {
        "bearing"
    }
}
