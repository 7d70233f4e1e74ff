//! Shared fakes and harness for overlay integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use waymark::bearing::{BearingProvider, BearingReading, HeadingSensor};
use waymark::camera::HeadlessCamera;
use waymark::clock::{Clock, ManualClock};
use waymark::config::OverlayConfig;
use waymark::event::EventSink;
use waymark::geo::LatLng;
use waymark::location::{LocationFix, LocationProvider};
use waymark::marker::{MarkerDrawable, PixmapSurface};
use waymark::sim::{BearingFeed, SimulatedBearingProvider};
use waymark::{OverlayError, OverlayResult, OverlayView, ProviderKind};

// ============================================================================
// Fake location provider
// ============================================================================

#[derive(Debug, Default)]
struct RecordingState {
    sink: Option<EventSink>,
    subscribes: usize,
    unsubscribes: usize,
    fail_with: Option<String>,
}

/// Location provider that records calls and exposes the captured sink.
///
/// Clones share state, so the test keeps one handle while the overlay owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct RecordingLocationProvider {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent subscribes fail.
    pub fn fail_subscribe(&self, reason: &str) {
        self.state.lock().fail_with = Some(reason.to_string());
    }

    pub fn sink(&self) -> Option<EventSink> {
        self.state.lock().sink.clone()
    }

    pub fn subscribes(&self) -> usize {
        self.state.lock().subscribes
    }

    pub fn unsubscribes(&self) -> usize {
        self.state.lock().unsubscribes
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().sink.is_some()
    }
}

impl LocationProvider for RecordingLocationProvider {
    fn subscribe(&mut self, sink: EventSink) -> OverlayResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_with {
            return Err(OverlayError::provider_unavailable(
                ProviderKind::Location,
                reason.clone(),
            ));
        }
        state.subscribes += 1;
        state.sink = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        let mut state = self.state.lock();
        state.unsubscribes += 1;
        state.sink = None;
    }
}

// ============================================================================
// Harness
// ============================================================================

pub const VIEW_SIZE: u32 = 256;
pub const HAMBURG: LatLng = LatLng {
    latitude: 53.5511,
    longitude: 9.9937,
};

/// An attached overlay plus handles to every fake behind it.
pub struct Harness {
    pub view: OverlayView,
    pub location: RecordingLocationProvider,
    pub bearing: BearingFeed,
    pub camera: HeadlessCamera,
    pub surface: PixmapSurface,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(OverlayConfig::default())
    }

    pub fn with_config(config: OverlayConfig) -> Self {
        let surface = PixmapSurface::new(VIEW_SIZE, VIEW_SIZE).expect("surface");
        Self::build(config, surface)
    }

    /// Harness whose surface has not been laid out yet.
    pub fn unlaid() -> Self {
        let surface = PixmapSurface::unlaid(VIEW_SIZE, VIEW_SIZE).expect("surface");
        Self::build(OverlayConfig::default(), surface)
    }

    fn build(config: OverlayConfig, surface: PixmapSurface) -> Self {
        let location = RecordingLocationProvider::new();
        let bearing = SimulatedBearingProvider::from_config(&config);
        let feed = bearing.feed();
        let camera = HeadlessCamera::new(HAMBURG, 16.0, VIEW_SIZE, VIEW_SIZE);
        let clock = ManualClock::new();

        let view = OverlayView::builder()
            .with_config(config)
            .with_location_provider(location.clone())
            .with_bearing_provider(bearing)
            .with_camera(camera.clone())
            .with_surface(surface.clone())
            .with_clock(Arc::new(clock.clone()))
            .attach()
            .expect("attach overlay");

        Self {
            view,
            location,
            bearing: feed,
            camera,
            surface,
            clock,
        }
    }

    /// Deliver a fix through the location subscription and apply it.
    pub fn deliver_fix(&mut self, fix: LocationFix) -> bool {
        let sent = self
            .location
            .sink()
            .is_some_and(|sink| sink.send_fix(fix));
        self.view.process_events();
        sent
    }

    /// Feed a raw compass azimuth at the current clock time and apply it.
    pub fn deliver_azimuth(&mut self, azimuth: f64) -> bool {
        let now = self.clock.now();
        let sent = self.bearing.push_azimuth(azimuth, 2.0, now, 0);
        self.view.process_events();
        sent
    }

    /// Advance the manual clock.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn default_marker() -> MarkerDrawable {
        MarkerDrawable::default_marker().expect("built-in marker")
    }

    pub fn bearing_marker() -> MarkerDrawable {
        MarkerDrawable::bearing_marker().expect("built-in marker")
    }
}

/// A fix near the harness camera center.
pub fn fix_near(north_offset_deg: f64, timestamp_ms: i64) -> LocationFix {
    LocationFix::new(
        HAMBURG.latitude + north_offset_deg,
        HAMBURG.longitude,
        5.0,
        timestamp_ms,
    )
}

/// A compass reading, bypassing the filter.
pub fn compass(heading: f64) -> BearingReading {
    BearingReading::new(heading, 2.0, HeadingSensor::Compass, 0)
}

// ============================================================================
// Failing bearing provider
// ============================================================================

/// Bearing provider that never manages to subscribe.
#[derive(Debug, Default)]
pub struct BrokenCompass;

impl BearingProvider for BrokenCompass {
    fn subscribe(&mut self, _sensor: HeadingSensor, _sink: EventSink) -> OverlayResult<()> {
        Err(OverlayError::provider_unavailable(
            ProviderKind::Bearing,
            "sensor missing",
        ))
    }

    fn unsubscribe(&mut self) {}
}
