//! Marker rotation animation.
//!
//! # State Machine
//!
//! ```text
//!          set_target(new heading)            duration elapsed
//!   Idle ---------------------------> Rotating ----------------> Idle
//!     ^                                   |
//!     |          freeze / jump_to         |
//!     +-----------------------------------+
//! ```
//!
//! While `Rotating`, [`RotationAnimator::sample`] eases out (cubic) along the
//! shortest arc from the angle shown when the target was set to the new
//! target, so 350° → 10° turns 20° clockwise rather than 340° back.

use std::time::{Duration, Instant};

use crate::geo::{normalize_degrees, signed_angle_delta};

#[derive(Debug, Clone, Copy)]
enum RotationState {
    Idle,
    Rotating {
        started_at: Instant,
        from: f64,
        delta: f64,
    },
}

/// Animates marker rotation toward the latest heading.
#[derive(Debug, Clone)]
pub struct RotationAnimator {
    duration: Duration,
    target: f64,
    state: RotationState,
}

impl RotationAnimator {
    /// Create an animator resting at 0°. A zero duration disables animation.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            target: 0.0,
            state: RotationState::Idle,
        }
    }

    /// Start rotating toward `degrees` from wherever the marker is now.
    pub fn set_target(&mut self, degrees: f64, now: Instant) {
        let target = normalize_degrees(degrees);
        let current = self.sample(now);
        let delta = signed_angle_delta(current, target);

        self.target = target;
        self.state = if self.duration.is_zero() || delta.abs() < f64::EPSILON {
            RotationState::Idle
        } else {
            RotationState::Rotating {
                started_at: now,
                from: current,
                delta,
            }
        };
    }

    /// Angle to display at `now`, in `[0, 360)`.
    pub fn sample(&self, now: Instant) -> f64 {
        match self.state {
            RotationState::Idle => self.target,
            RotationState::Rotating {
                started_at,
                from,
                delta,
            } => {
                let elapsed = now.saturating_duration_since(started_at);
                if elapsed >= self.duration {
                    return self.target;
                }
                let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
                let eased = 1.0 - (1.0 - t).powi(3);
                normalize_degrees(from + delta * eased)
            }
        }
    }

    /// Whether the displayed angle is still moving at `now`.
    pub fn is_animating(&self, now: Instant) -> bool {
        match self.state {
            RotationState::Idle => false,
            RotationState::Rotating { started_at, .. } => {
                now.saturating_duration_since(started_at) < self.duration
            }
        }
    }

    /// Stop at the currently displayed angle.
    pub fn freeze(&mut self, now: Instant) {
        self.target = self.sample(now);
        self.state = RotationState::Idle;
    }

    /// Snap to `degrees` without animating.
    pub fn jump_to(&mut self, degrees: f64) {
        self.target = normalize_degrees(degrees);
        self.state = RotationState::Idle;
    }

    /// Angle the animation is heading toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
