//! Tracking state machine.
//!
//! Owns [`OverlayState`] and turns every setter call and provider event into
//! a [`StateChange`]: what to redraw, what to tell the camera, and which
//! provider subscriptions to open or close. The machine performs no I/O of
//! its own; the overlay applies the change.
//!
//! # State Machine
//!
//! ```text
//!                     set_enabled(true)
//!   None ────────────────────────────────────────► Default | FollowNoBearing | Bearing
//!     ▲                                                        │
//!     └────────────────── set_enabled(false) ──────────────────┘
//!
//!   Default ──set_tracking_mode(Follow*)──► FollowNoBearing ──set_bearing_source(Gps|Compass)──► Bearing
//!   Default ◄──set_tracking_mode(None)───── FollowNoBearing ◄──set_bearing_source(None)───────── Bearing
//!                                                           ◄──bearing provider unavailable──── Bearing
//! ```
//!
//! Mode setters called while disabled only record the new value; it takes
//! effect on the next enable.

use tracing::{debug, info, warn};

use super::mode::{RenderMode, TrackingMode};
use super::state::OverlayState;
use crate::bearing::{BearingReading, BearingSource, HeadingSensor};
use crate::error::{OverlayResult, ProviderKind};
use crate::geo::LatLng;
use crate::location::LocationFix;

/// What the marker renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub mode: RenderMode,
    /// Last known fix, if enabled.
    pub fix: Option<LocationFix>,
    /// Heading from the active source, only in [`RenderMode::Bearing`].
    pub bearing: Option<BearingReading>,
}

/// What the camera follow controller should do.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FollowDirective {
    #[default]
    Unchanged,
    /// Arm follow; the next fix moves the camera.
    Start,
    /// Disarm follow and cancel in-flight camera transitions.
    Stop,
    /// Move the camera to `target`, rotating to `bearing` when given.
    MoveTo {
        target: LatLng,
        bearing: Option<f64>,
    },
}

/// Requested change to a provider subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange<T> {
    Keep,
    /// Open (or replace) the subscription.
    Acquire(T),
    /// Close the subscription.
    Release,
}

impl<T> Default for SubscriptionChange<T> {
    fn default() -> Self {
        SubscriptionChange::Keep
    }
}

/// Side effects of a single input to the state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateChange {
    pub redraw: Option<RenderRequest>,
    pub follow: FollowDirective,
    pub location: SubscriptionChange<()>,
    pub bearing: SubscriptionChange<HeadingSensor>,
}

impl StateChange {
    /// A change with no effects.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether applying this change would do nothing.
    pub fn is_empty(&self) -> bool {
        self.redraw.is_none()
            && self.follow == FollowDirective::Unchanged
            && self.location == SubscriptionChange::Keep
            && self.bearing == SubscriptionChange::Keep
    }
}

/// Inputs that determine what is on screen. Two equal keys draw the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RenderKey {
    mode: RenderMode,
    fix: Option<(f64, f64, f32)>,
    heading: Option<f64>,
}

/// Owner of [`OverlayState`].
#[derive(Debug, Default)]
pub struct TrackingStateMachine {
    state: OverlayState,
    last_rendered: Option<RenderKey>,
}

impl TrackingStateMachine {
    /// Create a machine in the disabled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// Current render mode.
    pub fn render_mode(&self) -> RenderMode {
        self.state.render_mode()
    }

    /// Show or hide the overlay.
    pub fn set_enabled(&mut self, enabled: bool) -> StateChange {
        if self.state.enabled == enabled {
            return StateChange::none();
        }
        self.state.enabled = enabled;

        let mut change = StateChange::none();
        let sensor = self.state.bearing_source.sensor();
        let tracking = self.state.tracking_mode.is_tracking();

        if enabled {
            change.location = SubscriptionChange::Acquire(());
            if let Some(sensor) = sensor {
                change.bearing = SubscriptionChange::Acquire(sensor);
            }
            if tracking {
                change.follow = FollowDirective::Start;
            }
        } else {
            change.location = SubscriptionChange::Release;
            if sensor.is_some() {
                change.bearing = SubscriptionChange::Release;
            }
            if tracking {
                change.follow = FollowDirective::Stop;
            }
        }

        change.redraw = self.redraw_if_changed();
        info!(
            enabled,
            render_mode = %self.render_mode(),
            cached_fix = self.state.last_fix.is_some(),
            "Overlay enabled state changed"
        );
        change
    }

    /// Change the tracking mode.
    pub fn set_tracking_mode(&mut self, mode: TrackingMode) -> StateChange {
        if self.state.tracking_mode == mode {
            return StateChange::none();
        }
        let previous = self.state.tracking_mode;
        self.state.tracking_mode = mode;

        if !self.state.enabled {
            debug!(tracking_mode = %mode, "Tracking mode stored while disabled");
            return StateChange::none();
        }

        let mut change = StateChange::none();
        change.follow = if mode.is_tracking() {
            FollowDirective::Start
        } else {
            FollowDirective::Stop
        };
        change.redraw = self.redraw_if_changed();

        info!(
            from = %previous,
            to = %mode,
            render_mode = %self.render_mode(),
            "Tracking mode changed"
        );
        change
    }

    /// Change the bearing source.
    pub fn set_bearing_source(&mut self, source: BearingSource) -> StateChange {
        if self.state.bearing_source == source {
            return StateChange::none();
        }
        let previous = self.state.bearing_source;
        self.state.bearing_source = source;

        if !self.state.enabled {
            debug!(bearing_source = %source, "Bearing source stored while disabled");
            return StateChange::none();
        }

        let mut change = StateChange::none();
        change.bearing = match source.sensor() {
            Some(sensor) => SubscriptionChange::Acquire(sensor),
            None => SubscriptionChange::Release,
        };
        change.redraw = self.redraw_if_changed();

        info!(
            from = %previous,
            to = %source,
            render_mode = %self.render_mode(),
            "Bearing source changed"
        );
        change
    }

    /// Accept a location fix.
    ///
    /// Invalid fixes are rejected and leave the state untouched. Valid fixes
    /// are cached even while disabled.
    pub fn on_location_fix(&mut self, fix: LocationFix) -> OverlayResult<StateChange> {
        fix.validate()?;
        self.state.last_fix = Some(fix);

        if !self.state.enabled {
            return Ok(StateChange::none());
        }

        let mut change = StateChange::none();
        change.redraw = self.redraw_if_changed();
        if self.state.tracking_mode.is_tracking() {
            let bearing = if self.state.tracking_mode.rotates_camera() {
                self.state.active_bearing().map(|r| r.heading_degrees)
            } else {
                None
            };
            change.follow = FollowDirective::MoveTo {
                target: fix.position(),
                bearing,
            };
        }
        Ok(change)
    }

    /// Accept a heading reading.
    ///
    /// Readings from a sensor other than the current source are ignored.
    pub fn on_bearing_reading(&mut self, reading: BearingReading) -> StateChange {
        if !reading.is_valid() {
            debug!(source = %reading.source, "Ignoring non-finite heading");
            return StateChange::none();
        }
        if self.state.bearing_source.sensor() != Some(reading.source) {
            debug!(
                source = %reading.source,
                bearing_source = %self.state.bearing_source,
                "Ignoring heading from inactive source"
            );
            return StateChange::none();
        }
        self.state.last_bearing = Some(reading);

        if !self.state.enabled {
            return StateChange::none();
        }

        let mut change = StateChange::none();
        change.redraw = self.redraw_if_changed();
        if self.state.tracking_mode.rotates_camera() {
            if let Some(fix) = self.state.last_fix {
                change.follow = FollowDirective::MoveTo {
                    target: fix.position(),
                    bearing: Some(reading.heading_degrees),
                };
            }
        }
        change
    }

    /// Handle loss of a provider.
    ///
    /// Losing the bearing provider degrades the source to `None`. Losing the
    /// location provider keeps the overlay on its cached fix.
    pub fn on_provider_unavailable(&mut self, kind: ProviderKind) -> StateChange {
        let mut change = StateChange::none();
        match kind {
            ProviderKind::Bearing => {
                if self.state.bearing_source == BearingSource::None {
                    return change;
                }
                warn!(
                    bearing_source = %self.state.bearing_source,
                    "Bearing provider unavailable, falling back to no bearing"
                );
                self.state.bearing_source = BearingSource::None;
                if self.state.enabled {
                    change.bearing = SubscriptionChange::Release;
                    change.redraw = self.redraw_if_changed();
                }
            }
            ProviderKind::Location => {
                warn!(
                    cached_fix = self.state.last_fix.is_some(),
                    "Location provider unavailable, keeping last known fix"
                );
                if self.state.enabled {
                    change.location = SubscriptionChange::Release;
                }
            }
        }
        change
    }

    fn redraw_if_changed(&mut self) -> Option<RenderRequest> {
        let (key, request) = self.current();
        if self.last_rendered == Some(key) {
            debug!(render_mode = %key.mode, "Render inputs unchanged, skipping redraw");
            return None;
        }
        self.last_rendered = Some(key);
        Some(request)
    }

    fn current(&self) -> (RenderKey, RenderRequest) {
        let mode = self.render_mode();
        let fix = if mode.is_visible() {
            self.state.last_fix
        } else {
            None
        };
        let bearing = if mode == RenderMode::Bearing {
            self.state.active_bearing()
        } else {
            None
        };

        let key = RenderKey {
            mode,
            fix: fix.map(|f| (f.latitude, f.longitude, f.accuracy_m)),
            heading: bearing.map(|b| b.heading_degrees),
        };
        (key, RenderRequest { mode, fix, bearing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayError;

    fn fix() -> LocationFix {
        LocationFix::new(53.55, 9.99, 8.0, 1_000)
    }

    fn compass(heading: f64) -> BearingReading {
        BearingReading::new(heading, 2.0, HeadingSensor::Compass, 1_000)
    }

    fn enabled_machine() -> TrackingStateMachine {
        let mut machine = TrackingStateMachine::new();
        machine.set_enabled(true);
        machine
    }

    #[test]
    fn test_enable_acquires_location_and_redraws() {
        let mut machine = TrackingStateMachine::new();
        let change = machine.set_enabled(true);

        assert_eq!(change.location, SubscriptionChange::Acquire(()));
        assert_eq!(change.bearing, SubscriptionChange::Keep);
        assert_eq!(change.follow, FollowDirective::Unchanged);
        assert_eq!(change.redraw.unwrap().mode, RenderMode::Default);
    }

    #[test]
    fn test_repeated_enable_is_a_no_op() {
        let mut machine = enabled_machine();
        assert!(machine.set_enabled(true).is_empty());
    }

    #[test]
    fn test_disable_releases_and_hides() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.set_bearing_source(BearingSource::Compass);

        let change = machine.set_enabled(false);
        assert_eq!(change.location, SubscriptionChange::Release);
        assert_eq!(change.bearing, SubscriptionChange::Release);
        assert_eq!(change.follow, FollowDirective::Stop);
        assert_eq!(change.redraw.unwrap().mode, RenderMode::None);
    }

    #[test]
    fn test_setters_while_disabled_only_store() {
        let mut machine = TrackingStateMachine::new();
        assert!(machine.set_tracking_mode(TrackingMode::Follow).is_empty());
        assert!(machine
            .set_bearing_source(BearingSource::Compass)
            .is_empty());
        assert_eq!(machine.render_mode(), RenderMode::None);

        let change = machine.set_enabled(true);
        assert_eq!(change.bearing, SubscriptionChange::Acquire(HeadingSensor::Compass));
        assert_eq!(change.follow, FollowDirective::Start);
        assert_eq!(change.redraw.unwrap().mode, RenderMode::Bearing);
    }

    #[test]
    fn test_tracking_none_stops_follow() {
        let mut machine = enabled_machine();
        assert_eq!(
            machine.set_tracking_mode(TrackingMode::Follow).follow,
            FollowDirective::Start
        );
        assert_eq!(
            machine.set_tracking_mode(TrackingMode::None).follow,
            FollowDirective::Stop
        );
    }

    #[test]
    fn test_fix_moves_camera_only_when_tracking() {
        let mut machine = enabled_machine();
        let change = machine.on_location_fix(fix()).unwrap();
        assert_eq!(change.follow, FollowDirective::Unchanged);
        assert!(change.redraw.is_some());

        machine.set_tracking_mode(TrackingMode::Follow);
        let change = machine
            .on_location_fix(LocationFix::new(53.56, 9.99, 8.0, 2_000))
            .unwrap();
        assert_eq!(
            change.follow,
            FollowDirective::MoveTo {
                target: LatLng::new(53.56, 9.99),
                bearing: None
            }
        );
    }

    #[test]
    fn test_fix_while_disabled_is_cached_without_effects() {
        let mut machine = TrackingStateMachine::new();
        machine.set_tracking_mode(TrackingMode::Follow);

        let change = machine.on_location_fix(fix()).unwrap();
        assert!(change.is_empty());
        assert_eq!(machine.state().last_fix, Some(fix()));

        let change = machine.set_enabled(true);
        let request = change.redraw.unwrap();
        assert_eq!(request.mode, RenderMode::FollowNoBearing);
        assert_eq!(request.fix, Some(fix()));
    }

    #[test]
    fn test_nan_fix_rejected_state_unchanged() {
        let mut machine = enabled_machine();
        machine.on_location_fix(fix()).unwrap();
        let before = machine.state().clone();

        let result = machine.on_location_fix(LocationFix::new(f64::NAN, 0.0, 1.0, 5));
        assert!(matches!(result, Err(OverlayError::InvalidFix { .. })));
        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn test_identical_fix_does_not_redraw() {
        let mut machine = enabled_machine();
        assert!(machine.on_location_fix(fix()).unwrap().redraw.is_some());

        let mut same = fix();
        same.timestamp_ms += 1_000;
        assert!(machine.on_location_fix(same).unwrap().redraw.is_none());
    }

    #[test]
    fn test_bearing_reading_drives_bearing_mode() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::FollowWithBearing);
        machine.set_bearing_source(BearingSource::Compass);
        machine.on_location_fix(fix()).unwrap();

        let change = machine.on_bearing_reading(compass(400.0));
        let request = change.redraw.unwrap();
        assert_eq!(request.mode, RenderMode::Bearing);
        assert!((request.bearing.unwrap().heading_degrees - 40.0).abs() < 1e-9);
        assert_eq!(
            change.follow,
            FollowDirective::MoveTo {
                target: fix().position(),
                bearing: Some(request.bearing.unwrap().heading_degrees)
            }
        );
    }

    #[test]
    fn test_reading_from_wrong_source_ignored() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.set_bearing_source(BearingSource::Gps);

        let change = machine.on_bearing_reading(compass(90.0));
        assert!(change.is_empty());
        assert_eq!(machine.state().last_bearing, None);
    }

    #[test]
    fn test_switching_source_drops_stale_heading_from_render() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.set_bearing_source(BearingSource::Compass);
        machine.on_bearing_reading(compass(90.0));

        let change = machine.set_bearing_source(BearingSource::Gps);
        assert_eq!(change.bearing, SubscriptionChange::Acquire(HeadingSensor::Gps));
        let request = change.redraw.unwrap();
        assert_eq!(request.mode, RenderMode::Bearing);
        assert_eq!(request.bearing, None);
    }

    #[test]
    fn test_bearing_source_none_releases_provider() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.set_bearing_source(BearingSource::Compass);
        machine.on_bearing_reading(compass(90.0));

        let change = machine.set_bearing_source(BearingSource::None);
        assert_eq!(change.bearing, SubscriptionChange::Release);
        assert_eq!(change.follow, FollowDirective::Unchanged);
        let request = change.redraw.unwrap();
        assert_eq!(request.mode, RenderMode::FollowNoBearing);
        assert_eq!(request.bearing, None);
        assert_eq!(machine.state().bearing_source, BearingSource::None);
    }

    #[test]
    fn test_bearing_provider_loss_degrades_source() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.set_bearing_source(BearingSource::Compass);

        let change = machine.on_provider_unavailable(ProviderKind::Bearing);
        assert_eq!(change.bearing, SubscriptionChange::Release);
        assert_eq!(change.redraw.unwrap().mode, RenderMode::FollowNoBearing);
        assert_eq!(machine.state().bearing_source, BearingSource::None);
        assert!(machine.state().enabled);
    }

    #[test]
    fn test_location_provider_loss_keeps_cache() {
        let mut machine = enabled_machine();
        machine.on_location_fix(fix()).unwrap();

        let change = machine.on_provider_unavailable(ProviderKind::Location);
        assert_eq!(change.location, SubscriptionChange::Release);
        assert!(change.redraw.is_none());
        assert!(machine.state().enabled);
        assert_eq!(machine.state().last_fix, Some(fix()));
    }

    #[test]
    fn test_reenable_reproduces_render_mode() {
        let mut machine = enabled_machine();
        machine.set_tracking_mode(TrackingMode::Follow);
        machine.on_location_fix(fix()).unwrap();
        let before = machine.render_mode();

        machine.set_enabled(false);
        let change = machine.set_enabled(true);
        let request = change.redraw.unwrap();
        assert_eq!(request.mode, before);
        assert_eq!(request.fix, Some(fix()));
    }
}
