//! Integration tests for provider event marshalling.
//!
//! Providers deliver from background threads through their `EventSink`. These
//! tests check that events reach the overlay in order, that events from
//! released subscriptions never take effect, and that the async run loop
//! applies events until cancelled.
//!
//! Run with: `cargo test --test event_marshalling`

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use waymark::bearing::{BearingSource, HeadingSensor};
use waymark::camera::HeadlessCamera;
use waymark::clock::ManualClock;
use waymark::geo::LatLng;
use waymark::marker::PixmapSurface;
use waymark::sim::{ScriptedWalk, SimulatedBearingProvider, SimulatedLocationProvider};
use waymark::tracking::TrackingMode;
use waymark::{OverlayError, OverlayView, ProviderKind};

use common::{fix_near, Harness, HAMBURG};

// ============================================================================
// Helper Functions
// ============================================================================

fn simulated_view(location: &SimulatedLocationProvider) -> OverlayView {
    OverlayView::builder()
        .with_location_provider(location.clone())
        .with_bearing_provider(SimulatedBearingProvider::default())
        .with_camera(HeadlessCamera::new(HAMBURG, 17.0, 128, 128))
        .with_surface(PixmapSurface::new(128, 128).unwrap())
        .with_clock(Arc::new(ManualClock::new()))
        .attach()
        .unwrap()
}

fn walk() -> ScriptedWalk {
    ScriptedWalk::new(LatLng::new(HAMBURG.latitude, HAMBURG.longitude), 40.0, 16)
        .with_start_timestamp(10_000)
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Fixes pushed from a background thread are applied in arrival order.
#[test]
fn test_background_thread_delivery_in_order() {
    let location = SimulatedLocationProvider::new();
    let mut view = simulated_view(&location);
    view.set_enabled(true);
    view.set_tracking_mode(TrackingMode::Follow);

    let feed = location.feed();
    let producer = thread::spawn(move || {
        let walk = walk();
        walk.steps(20).filter(|step| feed.push(step.fix)).count()
    });
    let sent = producer.join().unwrap();
    assert_eq!(sent, 20);

    assert_eq!(view.process_events(), 20);
    let last = walk().step(19).fix;
    assert_eq!(view.state().last_fix, Some(last));
    assert_eq!(view.process_events(), 0);
}

/// Events queued under a released subscription are discarded.
#[test]
fn test_stale_generation_is_dropped() {
    let mut h = Harness::new();
    h.view.set_enabled(true);
    let old_sink = h.location.sink().unwrap();
    let old_generation = old_sink.generation();

    // Queued but not yet applied when the subscription goes away.
    assert!(old_sink.send_fix(fix_near(0.001, 1)));
    h.view.set_enabled(false);
    h.view.set_enabled(true);

    let new_sink = h.view.event_sink(ProviderKind::Location).unwrap();
    assert!(new_sink.generation() > old_generation);
    assert!(!old_sink.send_fix(fix_near(0.002, 2)));
    assert!(old_sink.is_closed());

    assert_eq!(h.view.process_events(), 0);
    assert_eq!(h.view.stale_events_dropped(), 1);
    assert_eq!(h.view.state().last_fix, None);

    assert!(new_sink.send_fix(fix_near(0.003, 3)));
    assert_eq!(h.view.process_events(), 1);
    assert_eq!(h.view.state().last_fix, Some(fix_near(0.003, 3)));
}

/// Once detached, a provider thread's sends fail and it winds down.
#[test]
fn test_no_event_takes_effect_after_detach() {
    let location = SimulatedLocationProvider::new();
    let mut view = simulated_view(&location);
    view.set_enabled(true);
    let status = view.status_handle();

    let feed = location.feed();
    let producer = thread::spawn(move || {
        let walk = walk();
        let mut delivered = 0usize;
        for step in walk.steps(usize::MAX) {
            if !feed.push(step.fix) {
                break;
            }
            delivered += 1;
            thread::sleep(Duration::from_millis(1));
        }
        delivered
    });

    thread::sleep(Duration::from_millis(20));
    view.detach();

    let delivered = producer.join().unwrap();
    assert!(delivered > 0);
    assert!(!location.feed().is_subscribed());

    let snapshot = status.snapshot();
    assert!(snapshot.detached);
    assert!(!snapshot.marker.visible);
}

/// A reading for the old sensor does not leak into a new bearing source.
#[test]
fn test_bearing_resubscribe_switches_sensor() {
    let mut h = Harness::new();
    h.view.set_enabled(true);
    h.view.set_tracking_mode(TrackingMode::FollowWithBearing);
    h.view.set_bearing_source(BearingSource::Compass);
    assert_eq!(h.bearing.sensor(), Some(HeadingSensor::Compass));

    h.view.set_bearing_source(BearingSource::Gps);
    assert_eq!(h.bearing.sensor(), Some(HeadingSensor::Gps));
    assert!(!h.deliver_azimuth(10.0));
    assert_eq!(h.view.state().last_bearing, None);
}

/// The async loop applies events until its token is cancelled.
#[tokio::test]
async fn test_run_loop_applies_events_until_cancelled() {
    let location = SimulatedLocationProvider::new();
    let mut view = simulated_view(&location);
    view.set_enabled(true);

    let feed = location.feed();
    let expected = walk().step(9).fix;
    let producer = thread::spawn(move || {
        for step in walk().steps(10) {
            feed.push(step.fix);
        }
    });

    let cancel = CancellationToken::new();
    let watcher_token = cancel.clone();
    let status = view.status_handle();
    tokio::spawn(async move {
        loop {
            if status.snapshot().state.last_fix == Some(expected) {
                watcher_token.cancel();
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    });

    let result = tokio::time::timeout(Duration::from_secs(5), view.run(cancel)).await;
    producer.join().unwrap();

    assert!(matches!(result, Ok(Ok(()))));
    assert_eq!(view.state().last_fix, Some(expected));
    view.detach();
}

/// An already cancelled token returns without waiting for events.
#[tokio::test]
async fn test_run_loop_cancelled_immediately() {
    let location = SimulatedLocationProvider::new();
    let mut view = simulated_view(&location);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result: Result<(), OverlayError> = view.run(cancel).await;
    assert!(result.is_ok());
}
