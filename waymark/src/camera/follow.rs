//! Camera follow controller.
//!
//! Moves the camera toward accepted fixes while tracking is active, and backs
//! off when the user takes over the map.
//!
//! # State Machine
//!
//! ```text
//!            Start                    gesture observed
//!   Idle ─────────────► Following ─────────────────────► Suspended
//!     ▲                   │   ▲                              │
//!     │       Stop        │   │  dismiss timeout elapsed     │
//!     └───────────────────┘   └──────────── or Start ────────┘
//! ```
//!
//! The gesture state is polled from the camera before every move. The
//! suspension lasts until `gesture_dismiss_timeout` after the last observed
//! gesture, so a long pan keeps follow paused for its whole duration.
//!
//! Once a move has rotated the camera, the next move without a bearing
//! turns it back to north-up.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::MapCamera;
use crate::config::DEFAULT_GESTURE_DISMISS_TIMEOUT_MS;
use crate::tracking::FollowDirective;

/// What a directive did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// Nothing to do.
    Unchanged,
    /// Follow armed.
    Armed,
    /// Follow disarmed and transitions cancelled.
    Stopped,
    /// Camera moved.
    Moved,
    /// Move skipped because the user is interacting with the map.
    Suspended,
    /// Move skipped because follow is not armed.
    Inactive,
}

/// Drives the camera toward the user's position.
#[derive(Debug)]
pub struct CameraFollowController {
    dismiss_timeout: Duration,
    armed: bool,
    last_gesture: Option<Instant>,
    moves_issued: u64,
    camera_rotated: bool,
}

impl CameraFollowController {
    /// Create a disarmed controller.
    pub fn new(dismiss_timeout: Duration) -> Self {
        Self {
            dismiss_timeout,
            armed: false,
            last_gesture: None,
            moves_issued: 0,
            camera_rotated: false,
        }
    }

    /// Create a controller with the default dismiss timeout.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_millis(DEFAULT_GESTURE_DISMISS_TIMEOUT_MS))
    }

    /// Apply a directive from the state machine.
    pub fn apply(
        &mut self,
        directive: &FollowDirective,
        camera: &mut dyn MapCamera,
        now: Instant,
    ) -> FollowOutcome {
        match *directive {
            FollowDirective::Unchanged => FollowOutcome::Unchanged,
            FollowDirective::Start => {
                self.armed = true;
                self.last_gesture = None;
                info!("Camera follow armed");
                FollowOutcome::Armed
            }
            FollowDirective::Stop => {
                let was_armed = self.armed;
                self.armed = false;
                self.last_gesture = None;
                camera.cancel_transitions();
                if was_armed {
                    info!("Camera follow stopped");
                }
                FollowOutcome::Stopped
            }
            FollowDirective::MoveTo { target, bearing } => {
                if !self.armed {
                    return FollowOutcome::Inactive;
                }
                if camera.is_user_gesture_in_progress() {
                    self.note_gesture(now);
                    return FollowOutcome::Suspended;
                }
                if self.is_suspended(now) {
                    debug!("Camera follow suspended after user gesture");
                    return FollowOutcome::Suspended;
                }
                if self.last_gesture.take().is_some() {
                    info!("Gesture timeout elapsed, resuming camera follow");
                }

                let bearing = match bearing {
                    Some(heading) => {
                        self.camera_rotated = true;
                        Some(heading)
                    }
                    None if self.camera_rotated => {
                        self.camera_rotated = false;
                        debug!("Restoring north-up camera");
                        Some(0.0)
                    }
                    None => None,
                };
                camera.move_camera_to(target, bearing);
                self.moves_issued += 1;
                FollowOutcome::Moved
            }
        }
    }

    /// Record a user gesture reported by the host.
    pub fn notify_user_gesture(&mut self, now: Instant) {
        if self.armed {
            self.note_gesture(now);
        }
    }

    /// Whether follow is paused by a recent gesture.
    pub fn is_suspended(&self, now: Instant) -> bool {
        self.last_gesture
            .is_some_and(|at| now.saturating_duration_since(at) < self.dismiss_timeout)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of camera moves issued.
    pub fn moves_issued(&self) -> u64 {
        self.moves_issued
    }

    pub fn dismiss_timeout(&self) -> Duration {
        self.dismiss_timeout
    }

    fn note_gesture(&mut self, now: Instant) {
        if self.last_gesture.is_none() {
            info!(
                timeout_ms = self.dismiss_timeout.as_millis() as u64,
                "User gesture detected, suspending camera follow"
            );
        }
        self.last_gesture = Some(now);
    }
}

impl Default for CameraFollowController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::HeadlessCamera;
    use crate::geo::LatLng;

    fn move_to(lat: f64) -> FollowDirective {
        FollowDirective::MoveTo {
            target: LatLng::new(lat, 0.0),
            bearing: None,
        }
    }

    fn setup() -> (CameraFollowController, HeadlessCamera) {
        (
            CameraFollowController::new(Duration::from_secs(3)),
            HeadlessCamera::new(LatLng::new(0.0, 0.0), 15.0, 100, 100),
        )
    }

    #[test]
    fn test_move_requires_arming() {
        let (mut follow, mut camera) = setup();
        let now = Instant::now();

        assert_eq!(follow.apply(&move_to(1.0), &mut camera, now), FollowOutcome::Inactive);
        assert_eq!(camera.move_count(), 0);

        assert_eq!(
            follow.apply(&FollowDirective::Start, &mut camera, now),
            FollowOutcome::Armed
        );
        assert_eq!(follow.apply(&move_to(1.0), &mut camera, now), FollowOutcome::Moved);
        assert_eq!(camera.center(), LatLng::new(1.0, 0.0));
    }

    #[test]
    fn test_polled_gesture_suspends_until_timeout() {
        let (mut follow, mut camera) = setup();
        let t0 = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, t0);

        camera.set_gesture_in_progress(true);
        assert_eq!(follow.apply(&move_to(1.0), &mut camera, t0), FollowOutcome::Suspended);

        camera.set_gesture_in_progress(false);
        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(follow.apply(&move_to(1.0), &mut camera, t1), FollowOutcome::Suspended);

        let t2 = t0 + Duration::from_secs(3);
        assert_eq!(follow.apply(&move_to(2.0), &mut camera, t2), FollowOutcome::Moved);
        assert_eq!(camera.move_count(), 1);
        assert!(!follow.is_suspended(t2));
    }

    #[test]
    fn test_notified_gesture_suspends() {
        let (mut follow, mut camera) = setup();
        let t0 = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, t0);

        follow.notify_user_gesture(t0);
        assert!(follow.is_suspended(t0 + Duration::from_millis(2_999)));
        assert_eq!(
            follow.apply(&move_to(1.0), &mut camera, t0 + Duration::from_millis(500)),
            FollowOutcome::Suspended
        );
    }

    #[test]
    fn test_start_rearms_and_clears_suspension() {
        let (mut follow, mut camera) = setup();
        let t0 = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, t0);
        follow.notify_user_gesture(t0);

        follow.apply(&FollowDirective::Start, &mut camera, t0);
        assert!(!follow.is_suspended(t0));
        assert_eq!(follow.apply(&move_to(1.0), &mut camera, t0), FollowOutcome::Moved);
    }

    #[test]
    fn test_stop_cancels_transitions_and_disarms() {
        let (mut follow, mut camera) = setup();
        let now = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, now);

        assert_eq!(
            follow.apply(&FollowDirective::Stop, &mut camera, now),
            FollowOutcome::Stopped
        );
        assert_eq!(camera.transitions_cancelled(), 1);
        assert!(!follow.is_armed());
        assert_eq!(follow.apply(&move_to(1.0), &mut camera, now), FollowOutcome::Inactive);
    }

    #[test]
    fn test_gesture_ignored_while_disarmed() {
        let (mut follow, _camera) = setup();
        let now = Instant::now();
        follow.notify_user_gesture(now);
        assert!(!follow.is_suspended(now));
    }

    #[test]
    fn test_bearing_passed_to_camera() {
        let (mut follow, mut camera) = setup();
        let now = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, now);
        follow.apply(
            &FollowDirective::MoveTo {
                target: LatLng::new(0.5, 0.5),
                bearing: Some(270.0),
            },
            &mut camera,
            now,
        );
        assert_eq!(camera.bearing(), 270.0);
        assert_eq!(follow.moves_issued(), 1);
    }

    #[test]
    fn test_move_without_bearing_restores_north_up_once() {
        let (mut follow, mut camera) = setup();
        let now = Instant::now();
        follow.apply(&FollowDirective::Start, &mut camera, now);
        follow.apply(
            &FollowDirective::MoveTo {
                target: LatLng::new(0.5, 0.5),
                bearing: Some(90.0),
            },
            &mut camera,
            now,
        );
        assert_eq!(camera.bearing(), 90.0);

        follow.apply(&move_to(1.0), &mut camera, now);
        assert_eq!(camera.bearing(), 0.0);
        assert_eq!(camera.moves().last().unwrap().bearing, Some(0.0));

        follow.apply(&move_to(2.0), &mut camera, now);
        assert_eq!(camera.moves().last().unwrap().bearing, None);
    }
}
