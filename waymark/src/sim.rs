//! Simulated providers and a scripted walk.
//!
//! Used by the CLI simulator and by integration tests. The providers hand
//! their subscription sink to a *feed* handle that can be moved to a
//! background thread; the feed turns raw samples into events the same way a
//! platform integration would.
//!
//! # Architecture
//!
//! ```text
//! ScriptedWalk ──► feeder thread ──► LocationFeed ──► EventSink (location)
//!                               └──► BearingFeed ──► CompassFilter / GpsBearingEstimator
//!                                                           └──► EventSink (bearing)
//! ```

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::bearing::{BearingProvider, CompassFilter, GpsBearingEstimator, HeadingSensor};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult, ProviderKind};
use crate::event::EventSink;
use crate::geo::{normalize_degrees, LatLng, EARTH_RADIUS_M};
use crate::location::{now_timestamp_ms, LocationFix, LocationProvider};

/// Default spacing between walk steps.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(1_000);

/// Default reported accuracy of walk fixes.
pub const DEFAULT_WALK_ACCURACY_M: f32 = 6.0;

// =============================================================================
// Scripted walk
// =============================================================================

/// One sample of a [`ScriptedWalk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    pub index: usize,
    pub fix: LocationFix,
    /// Raw compass azimuth at this step.
    pub azimuth_degrees: f64,
    /// Time since the walk started.
    pub elapsed: Duration,
}

/// A clockwise walk around a circle, starting due north of the center.
#[derive(Debug, Clone)]
pub struct ScriptedWalk {
    center: LatLng,
    radius_m: f64,
    steps_per_lap: usize,
    step_interval: Duration,
    accuracy_m: f32,
    start_timestamp_ms: i64,
}

impl ScriptedWalk {
    /// Create a walk. `steps_per_lap` is clamped to at least 3.
    pub fn new(center: LatLng, radius_m: f64, steps_per_lap: usize) -> Self {
        Self {
            center,
            radius_m,
            steps_per_lap: steps_per_lap.max(3),
            step_interval: DEFAULT_STEP_INTERVAL,
            accuracy_m: DEFAULT_WALK_ACCURACY_M,
            start_timestamp_ms: now_timestamp_ms(),
        }
    }

    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = interval;
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = accuracy_m;
        self
    }

    pub fn with_start_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.start_timestamp_ms = timestamp_ms;
        self
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Sample `index`; walks continue past the first lap.
    pub fn step(&self, index: usize) -> WalkStep {
        let fraction = (index % self.steps_per_lap) as f64 / self.steps_per_lap as f64;
        let angle = fraction * TAU;

        let north_m = self.radius_m * angle.cos();
        let east_m = self.radius_m * angle.sin();
        let latitude = self.center.latitude + (north_m / EARTH_RADIUS_M).to_degrees();
        let longitude = self.center.longitude
            + (east_m / (EARTH_RADIUS_M * self.center.latitude.to_radians().cos())).to_degrees();

        // Clockwise travel is a quarter turn right of the radial direction.
        let heading = normalize_degrees(angle.to_degrees() + 90.0);
        let step_length_m = TAU * self.radius_m / self.steps_per_lap as f64;
        let interval_s = self.step_interval.as_secs_f64();
        let speed = if interval_s > 0.0 {
            (step_length_m / interval_s) as f32
        } else {
            0.0
        };

        let elapsed = self.step_interval * index as u32;
        let fix = LocationFix::new(
            latitude,
            longitude,
            self.accuracy_m,
            self.start_timestamp_ms + elapsed.as_millis() as i64,
        )
        .with_bearing(heading)
        .with_speed(speed);

        WalkStep {
            index,
            fix,
            azimuth_degrees: heading,
            elapsed,
        }
    }

    /// The first `count` steps.
    pub fn steps(&self, count: usize) -> impl Iterator<Item = WalkStep> + '_ {
        (0..count).map(move |index| self.step(index))
    }
}

// =============================================================================
// Location
// =============================================================================

/// Location provider fed from outside, typically a background thread.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLocationProvider {
    sink: Arc<Mutex<Option<EventSink>>>,
    unavailable: Option<String>,
}

impl SimulatedLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose subscribe always fails, as with revoked permission.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Handle for pushing fixes into the current subscription.
    pub fn feed(&self) -> LocationFeed {
        LocationFeed {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl LocationProvider for SimulatedLocationProvider {
    fn subscribe(&mut self, sink: EventSink) -> OverlayResult<()> {
        if let Some(reason) = &self.unavailable {
            return Err(OverlayError::provider_unavailable(
                ProviderKind::Location,
                reason.clone(),
            ));
        }
        debug!(generation = sink.generation(), "Simulated location subscribed");
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.sink.lock().take();
    }

    fn name(&self) -> &str {
        "simulated-location"
    }
}

/// Pushes fixes into a [`SimulatedLocationProvider`]'s subscription.
#[derive(Debug, Clone)]
pub struct LocationFeed {
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl LocationFeed {
    /// Deliver a fix. Returns `false` when not subscribed.
    pub fn push(&self, fix: LocationFix) -> bool {
        self.sink
            .lock()
            .as_ref()
            .is_some_and(|sink| sink.send_fix(fix))
    }

    /// Report loss of the location source.
    pub fn report_unavailable(&self, reason: &str) -> bool {
        self.sink
            .lock()
            .as_ref()
            .is_some_and(|sink| sink.report_unavailable(reason))
    }

    /// Whether a live subscription is attached.
    pub fn is_subscribed(&self) -> bool {
        self.sink
            .lock()
            .as_ref()
            .is_some_and(|sink| !sink.is_closed())
    }
}

// =============================================================================
// Bearing
// =============================================================================

#[derive(Debug)]
struct BearingFeedState {
    subscription: Option<(HeadingSensor, EventSink)>,
    compass: CompassFilter,
    gps: GpsBearingEstimator,
}

/// Bearing provider backed by a [`CompassFilter`] and a [`GpsBearingEstimator`].
#[derive(Debug, Clone)]
pub struct SimulatedBearingProvider {
    state: Arc<Mutex<BearingFeedState>>,
}

impl SimulatedBearingProvider {
    pub fn new(compass: CompassFilter, gps: GpsBearingEstimator) -> Self {
        Self {
            state: Arc::new(Mutex::new(BearingFeedState {
                subscription: None,
                compass,
                gps,
            })),
        }
    }

    /// Build filters from the compass and GPS settings.
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self::new(
            CompassFilter::new(config.compass.update_interval, config.compass.smoothing),
            GpsBearingEstimator::new(config.gps.min_speed_mps, config.gps.history_samples),
        )
    }

    /// Handle for pushing raw samples into the current subscription.
    pub fn feed(&self) -> BearingFeed {
        BearingFeed {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulatedBearingProvider {
    fn default() -> Self {
        Self::new(CompassFilter::with_defaults(), GpsBearingEstimator::with_defaults())
    }
}

impl BearingProvider for SimulatedBearingProvider {
    fn subscribe(&mut self, sensor: HeadingSensor, sink: EventSink) -> OverlayResult<()> {
        let mut state = self.state.lock();
        state.compass.reset();
        state.gps.clear();
        info!(sensor = %sensor, generation = sink.generation(), "Simulated bearing subscribed");
        state.subscription = Some((sensor, sink));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.state.lock().subscription = None;
    }

    fn name(&self) -> &str {
        "simulated-bearing"
    }
}

/// Pushes raw heading data into a [`SimulatedBearingProvider`].
#[derive(Debug, Clone)]
pub struct BearingFeed {
    state: Arc<Mutex<BearingFeedState>>,
}

impl BearingFeed {
    /// Feed a raw compass azimuth. Only forwarded while subscribed to the
    /// compass, and at most once per update interval.
    ///
    /// Returns whether a reading was delivered.
    pub fn push_azimuth(
        &self,
        azimuth_degrees: f64,
        accuracy_degrees: f64,
        now: Instant,
        timestamp_ms: i64,
    ) -> bool {
        let mut state = self.state.lock();
        let BearingFeedState {
            subscription,
            compass,
            ..
        } = &mut *state;
        match subscription {
            Some((HeadingSensor::Compass, sink)) => compass
                .push(azimuth_degrees, accuracy_degrees, now, timestamp_ms)
                .is_some_and(|reading| sink.send_bearing(reading)),
            _ => false,
        }
    }

    /// Feed a fix for GPS course estimation. Only forwarded while subscribed
    /// to GPS. Returns whether a reading was delivered.
    pub fn push_fix(&self, fix: &LocationFix) -> bool {
        let mut state = self.state.lock();
        let BearingFeedState {
            subscription, gps, ..
        } = &mut *state;
        match subscription {
            Some((HeadingSensor::Gps, sink)) => gps
                .push(fix)
                .is_some_and(|reading| sink.send_bearing(reading)),
            _ => false,
        }
    }

    /// Report loss of the heading sensor.
    pub fn report_unavailable(&self, reason: &str) -> bool {
        self.state
            .lock()
            .subscription
            .as_ref()
            .is_some_and(|(_, sink)| sink.report_unavailable(reason))
    }

    /// Sensor of the live subscription, if any.
    pub fn sensor(&self) -> Option<HeadingSensor> {
        self.state
            .lock()
            .subscription
            .as_ref()
            .filter(|(_, sink)| !sink.is_closed())
            .map(|(sensor, _)| *sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventBus, OverlayEvent};
    use crate::geo::{angular_difference, distance_m};

    fn walk() -> ScriptedWalk {
        ScriptedWalk::new(LatLng::new(53.55, 9.99), 50.0, 8).with_start_timestamp(1_000)
    }

    #[test]
    fn test_walk_stays_on_circle() {
        let walk = walk();
        for step in walk.steps(8) {
            let d = distance_m(walk.center(), step.fix.position());
            assert!((d - 50.0).abs() < 0.5, "step {} at {} m", step.index, d);
            assert!(step.fix.validate().is_ok());
        }
    }

    #[test]
    fn test_walk_starts_north_heading_east() {
        let step = walk().step(0);
        assert!(step.fix.latitude > 53.55);
        assert!(angular_difference(step.azimuth_degrees, 90.0) < 1e-9);
        assert_eq!(step.fix.timestamp_ms, 1_000);
    }

    #[test]
    fn test_walk_timestamps_and_laps() {
        let walk = walk();
        let step = walk.step(9);
        assert_eq!(step.elapsed, Duration::from_secs(9));
        assert_eq!(step.fix.timestamp_ms, 10_000);
        assert_eq!(step.fix.latitude, walk.step(1).fix.latitude);
    }

    #[test]
    fn test_location_feed_requires_subscription() {
        let mut provider = SimulatedLocationProvider::new();
        let feed = provider.feed();
        let mut bus = EventBus::new();
        let fix = walk().step(0).fix;

        assert!(!feed.push(fix));

        provider.subscribe(bus.open(ProviderKind::Location)).unwrap();
        assert!(feed.is_subscribed());
        assert!(feed.push(fix));
        assert_eq!(bus.try_next(), Some(OverlayEvent::Fix(fix)));

        provider.unsubscribe();
        assert!(!feed.push(fix));
    }

    #[test]
    fn test_unavailable_location_provider_fails_subscribe() {
        let mut provider = SimulatedLocationProvider::unavailable("permission revoked");
        let mut bus = EventBus::new();
        let err = provider
            .subscribe(bus.open(ProviderKind::Location))
            .unwrap_err();
        assert!(matches!(
            err,
            OverlayError::ProviderUnavailable {
                kind: ProviderKind::Location,
                ..
            }
        ));
    }

    #[test]
    fn test_compass_feed_throttles() {
        let mut provider = SimulatedBearingProvider::default();
        let feed = provider.feed();
        let mut bus = EventBus::new();
        provider
            .subscribe(HeadingSensor::Compass, bus.open(ProviderKind::Bearing))
            .unwrap();

        let t0 = Instant::now();
        assert!(feed.push_azimuth(90.0, 2.0, t0, 0));
        assert!(!feed.push_azimuth(91.0, 2.0, t0 + Duration::from_millis(50), 50));
        assert!(feed.push_azimuth(92.0, 2.0, t0 + Duration::from_millis(100), 100));
        assert!(!feed.push_fix(&walk().step(0).fix));

        match bus.try_next() {
            Some(OverlayEvent::Bearing(reading)) => {
                assert_eq!(reading.source, HeadingSensor::Compass);
                assert_eq!(reading.heading_degrees, 90.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_gps_feed_uses_fix_bearing() {
        let mut provider = SimulatedBearingProvider::default();
        let feed = provider.feed();
        let mut bus = EventBus::new();
        provider
            .subscribe(HeadingSensor::Gps, bus.open(ProviderKind::Bearing))
            .unwrap();

        assert_eq!(feed.sensor(), Some(HeadingSensor::Gps));
        assert!(!feed.push_azimuth(10.0, 1.0, Instant::now(), 0));
        assert!(feed.push_fix(&walk().step(0).fix));
        match bus.try_next() {
            Some(OverlayEvent::Bearing(reading)) => {
                assert_eq!(reading.source, HeadingSensor::Gps);
                assert!(angular_difference(reading.heading_degrees, 90.0) < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
