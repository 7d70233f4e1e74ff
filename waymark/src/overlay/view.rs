//! The overlay composition root.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::OverlayViewBuilder;
use super::status::{OverlayStatus, SharedOverlayStatus};
use crate::bearing::{BearingProvider, BearingReading, BearingSource, HeadingSensor};
use crate::camera::{CameraFollowController, FollowOutcome, MapCamera};
use crate::clock::Clock;
use crate::error::{OverlayError, OverlayResult, ProviderKind};
use crate::event::{EventBus, EventSink, OverlayEvent};
use crate::location::{LocationFix, LocationProvider};
use crate::marker::{MarkerDrawable, MarkerRenderer, RenderedMarker};
use crate::tracking::{
    FollowDirective, OverlayState, RenderMode, RenderRequest, StateChange, SubscriptionChange,
    TrackingMode, TrackingStateMachine,
};

/// Frame interval of the rotation animation in [`OverlayView::run`].
pub const ANIMATION_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A "my location" overlay attached to a map.
///
/// All methods run on the owner thread. Providers deliver events through
/// [`EventSink`]s; the owner applies them with [`process_events`](Self::process_events)
/// or [`run`](Self::run).
pub struct OverlayView {
    pub(super) machine: TrackingStateMachine,
    pub(super) renderer: MarkerRenderer,
    pub(super) follow: CameraFollowController,
    pub(super) camera: Box<dyn MapCamera>,
    pub(super) location: Box<dyn LocationProvider>,
    pub(super) bearing: Option<Box<dyn BearingProvider>>,
    pub(super) bus: EventBus,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) status: Arc<SharedOverlayStatus>,
    pub(super) detached: bool,
}

impl OverlayView {
    /// Start building an overlay.
    pub fn builder() -> OverlayViewBuilder {
        OverlayViewBuilder::new()
    }

    // =========================================================================
    // Host entry points
    // =========================================================================

    /// Show or hide the overlay.
    ///
    /// When the surface is laid out, the marker is on screen (or gone) by the
    /// time this returns.
    pub fn set_enabled(&mut self, enabled: bool) {
        let change = self.machine.set_enabled(enabled);
        self.apply(change);
    }

    pub fn set_tracking_mode(&mut self, mode: TrackingMode) {
        let change = self.machine.set_tracking_mode(mode);
        self.apply(change);
    }

    pub fn set_bearing_source(&mut self, source: BearingSource) {
        let change = self.machine.set_bearing_source(source);
        self.apply(change);
    }

    /// Feed a location fix directly, bypassing the event channel.
    ///
    /// Invalid fixes are logged and returned as an error; the state is left
    /// unchanged.
    pub fn on_location_fix(&mut self, fix: LocationFix) -> OverlayResult<()> {
        match self.machine.on_location_fix(fix) {
            Ok(change) => {
                self.apply(change);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Rejected location fix");
                Err(e)
            }
        }
    }

    /// Feed a heading reading directly, bypassing the event channel.
    pub fn on_bearing_reading(&mut self, reading: BearingReading) {
        let change = self.machine.on_bearing_reading(reading);
        self.apply(change);
    }

    /// Handle a provider reporting that it lost its data source.
    pub fn on_provider_unavailable(&mut self, kind: ProviderKind, reason: &str) {
        warn!(provider = %kind, reason, "Provider reported unavailable");
        let change = self.machine.on_provider_unavailable(kind);
        self.apply(change);
    }

    /// Sink of the live subscription for `kind`, if subscribed.
    pub fn event_sink(&self, kind: ProviderKind) -> Option<EventSink> {
        self.bus.sink(kind)
    }

    /// Apply every queued provider event. Returns how many were applied.
    ///
    /// Never blocks.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.bus.try_next() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Apply provider events and animation frames until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Detached`] if the event channel closes.
    pub async fn run(&mut self, cancel: CancellationToken) -> OverlayResult<()> {
        let mut frames = tokio::time::interval(ANIMATION_FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Overlay event loop started");
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Overlay event loop cancelled");
                    return Ok(());
                }
                event = self.bus.next() => match event {
                    Some(event) => self.dispatch(event),
                    None => return Err(OverlayError::Detached),
                },
                _ = frames.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// Advance the marker rotation animation. Returns whether a frame was drawn.
    ///
    /// Also republishes the status once a gesture suspension has run out.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let drawn = match self.renderer.tick(&*self.camera, now) {
            Ok(drawn) => drawn,
            Err(e) => {
                warn!(error = %e, "Animation frame failed");
                false
            }
        };
        let suspension_lapsed =
            self.status.is_follow_suspended() && !self.follow.is_suspended(now);
        if drawn || suspension_lapsed {
            self.publish_status();
        }
        drawn
    }

    /// The surface finished layout; draw any deferred render.
    pub fn on_layout_complete(&mut self) {
        let now = self.clock.now();
        match self.renderer.on_layout_complete(&*self.camera, now) {
            Ok(true) => debug!("Deferred render drawn after layout"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Deferred render failed"),
        }
        self.publish_status();
    }

    /// The host moved the camera; reposition the marker.
    pub fn on_camera_moved(&mut self) {
        self.refresh();
        self.publish_status();
    }

    /// The host observed a user gesture on the map.
    pub fn notify_user_gesture(&mut self) {
        let now = self.clock.now();
        self.follow.notify_user_gesture(now);
        self.publish_status();
    }

    /// Replace the marker shown outside bearing mode.
    pub fn set_foreground_drawable(&mut self, drawable: MarkerDrawable) {
        info!(name = drawable.name(), id = %drawable.id(), "Foreground drawable replaced");
        self.renderer.set_foreground_drawable(drawable);
        self.refresh();
        self.publish_status();
    }

    /// Replace the marker shown in bearing mode.
    pub fn set_bearing_drawable(&mut self, drawable: MarkerDrawable) {
        info!(name = drawable.name(), id = %drawable.id(), "Bearing drawable replaced");
        self.renderer.set_bearing_drawable(drawable);
        self.refresh();
        self.publish_status();
    }

    /// Release all subscriptions and remove the marker.
    pub fn detach(mut self) {
        self.release_all();
        info!("Overlay detached");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of the overlay state.
    pub fn state(&self) -> OverlayState {
        self.machine.state().clone()
    }

    pub fn render_mode(&self) -> RenderMode {
        self.machine.render_mode()
    }

    /// Whether the marker is on screen.
    pub fn is_visible(&self) -> bool {
        self.renderer.rendered().visible
    }

    /// Drawable on screen, `None` while hidden.
    pub fn active_drawable(&self) -> Option<MarkerDrawable> {
        self.renderer.active_drawable().cloned()
    }

    pub fn rendered_marker(&self) -> RenderedMarker {
        self.renderer.rendered()
    }

    /// Shared status for observers on other threads.
    pub fn status_handle(&self) -> Arc<SharedOverlayStatus> {
        Arc::clone(&self.status)
    }

    /// Number of state redraws so far.
    pub fn redraw_count(&self) -> u64 {
        self.renderer.redraw_count()
    }

    /// Whether camera follow is paused by a user gesture.
    pub fn is_follow_suspended(&self) -> bool {
        self.follow.is_suspended(self.clock.now())
    }

    /// Number of queued events discarded because their subscription had ended.
    pub fn stale_events_dropped(&self) -> u64 {
        self.bus.stale_dropped()
    }

    // =========================================================================
    // Change application
    // =========================================================================

    fn dispatch(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::Fix(fix) => {
                // Already logged.
                let _ = self.on_location_fix(fix);
            }
            OverlayEvent::Bearing(reading) => self.on_bearing_reading(reading),
            OverlayEvent::Unavailable { kind, reason } => {
                self.on_provider_unavailable(kind, &reason)
            }
        }
    }

    /// Apply a change and any follow-up changes caused by failed subscriptions.
    fn apply(&mut self, change: StateChange) {
        if change.is_empty() {
            return;
        }
        let mut queue = VecDeque::from([change]);
        while let Some(change) = queue.pop_front() {
            self.apply_one(change, &mut queue);
        }
        self.publish_status();
    }

    fn apply_one(&mut self, change: StateChange, follow_ups: &mut VecDeque<StateChange>) {
        let queued = follow_ups.len();

        match change.location {
            SubscriptionChange::Keep => {}
            SubscriptionChange::Acquire(()) => {
                if let Err(e) = self.subscribe_location() {
                    warn!(error = %e, "Location subscription failed");
                    follow_ups.push_back(self.machine.on_provider_unavailable(ProviderKind::Location));
                }
            }
            SubscriptionChange::Release => self.unsubscribe_location(),
        }

        match change.bearing {
            SubscriptionChange::Keep => {}
            SubscriptionChange::Acquire(sensor) => {
                if let Err(e) = self.subscribe_bearing(sensor) {
                    warn!(error = %e, sensor = %sensor, "Bearing subscription failed");
                    follow_ups.push_back(self.machine.on_provider_unavailable(ProviderKind::Bearing));
                }
            }
            SubscriptionChange::Release => self.unsubscribe_bearing(),
        }

        let now = self.clock.now();
        let outcome = self.follow.apply(&change.follow, self.camera.as_mut(), now);

        // A failed subscription changed the state again; its own redraw wins.
        let superseded = follow_ups.iter().skip(queued).any(|c| c.redraw.is_some());
        match change.redraw {
            Some(request) if !superseded => self.render(request, now),
            _ if outcome == FollowOutcome::Moved => self.refresh(),
            _ => {}
        }
    }

    fn render(&mut self, request: RenderRequest, now: Instant) {
        match self.renderer.render(request, &*self.camera, now) {
            Ok(()) => {}
            Err(OverlayError::RenderSurfaceNotReady) => {
                debug!(render_mode = %request.mode, "Surface not laid out, render deferred")
            }
            Err(e) => warn!(error = %e, render_mode = %request.mode, "Marker render failed"),
        }
    }

    fn refresh(&mut self) {
        let now = self.clock.now();
        if let Err(e) = self.renderer.refresh(&*self.camera, now) {
            warn!(error = %e, "Marker refresh failed");
        }
    }

    fn subscribe_location(&mut self) -> OverlayResult<()> {
        if self.bus.release(ProviderKind::Location) {
            self.location.unsubscribe();
        }
        let sink = self.bus.open(ProviderKind::Location);
        let generation = sink.generation();
        if let Err(e) = self.location.subscribe(sink) {
            self.bus.release(ProviderKind::Location);
            return Err(e);
        }
        info!(provider = self.location.name(), generation, "Location provider subscribed");
        Ok(())
    }

    fn unsubscribe_location(&mut self) {
        if self.bus.release(ProviderKind::Location) {
            self.location.unsubscribe();
            info!(provider = self.location.name(), "Location provider unsubscribed");
        }
    }

    fn subscribe_bearing(&mut self, sensor: HeadingSensor) -> OverlayResult<()> {
        let Some(provider) = self.bearing.as_mut() else {
            return Err(OverlayError::provider_unavailable(
                ProviderKind::Bearing,
                "no bearing provider attached",
            ));
        };
        if self.bus.release(ProviderKind::Bearing) {
            provider.unsubscribe();
        }
        let sink = self.bus.open(ProviderKind::Bearing);
        let generation = sink.generation();
        if let Err(e) = provider.subscribe(sensor, sink) {
            self.bus.release(ProviderKind::Bearing);
            return Err(e);
        }
        info!(provider = provider.name(), sensor = %sensor, generation, "Bearing provider subscribed");
        Ok(())
    }

    fn unsubscribe_bearing(&mut self) {
        if self.bus.release(ProviderKind::Bearing) {
            if let Some(provider) = self.bearing.as_mut() {
                provider.unsubscribe();
                info!(provider = provider.name(), "Bearing provider unsubscribed");
            }
        }
    }

    pub(super) fn publish_status(&self) {
        let now = self.clock.now();
        self.status.update(OverlayStatus {
            state: self.machine.state().clone(),
            render_mode: self.machine.render_mode(),
            marker: self.renderer.rendered(),
            redraw_count: self.renderer.redraw_count(),
            animation_frames: self.renderer.animation_frames(),
            follow_suspended: self.follow.is_suspended(now),
            pending_layout: self.renderer.has_pending(),
            detached: self.detached,
        });
    }

    fn release_all(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        self.unsubscribe_location();
        self.unsubscribe_bearing();
        self.bus.close();

        if self.follow.is_armed() {
            let now = self.clock.now();
            self.follow
                .apply(&FollowDirective::Stop, self.camera.as_mut(), now);
        }
        self.renderer.clear();
        self.publish_status();
    }
}

impl Drop for OverlayView {
    fn drop(&mut self) {
        if !self.detached {
            debug!("Overlay dropped while attached, releasing subscriptions");
            self.release_all();
        }
    }
}

impl fmt::Debug for OverlayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayView")
            .field("state", self.machine.state())
            .field("renderer", &self.renderer)
            .field("follow", &self.follow)
            .field("detached", &self.detached)
            .finish()
    }
}
