//! Headless Web Mercator camera.
//!
//! Stands in for a real map camera in the CLI simulator and in tests. Moves
//! are applied instantly and recorded, and the user-gesture flag can be set
//! from the outside to imitate a pan in progress.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{MapCamera, Projection};
use crate::geo::{meters_per_pixel, normalize_degrees, to_world_pixels, LatLng, ScreenPoint};

/// A recorded camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    pub target: LatLng,
    pub bearing: Option<f64>,
}

#[derive(Debug)]
struct CameraInner {
    center: LatLng,
    zoom: f64,
    bearing: f64,
    width: u32,
    height: u32,
    gesture_in_progress: bool,
    moves: Vec<CameraMove>,
    transitions_cancelled: u32,
}

/// Camera with a fixed viewport and instant moves.
///
/// Clones share state, so a test can keep a handle while the overlay owns
/// another.
#[derive(Debug, Clone)]
pub struct HeadlessCamera {
    inner: Arc<Mutex<CameraInner>>,
}

impl HeadlessCamera {
    /// Create a north-up camera centered on `center`.
    pub fn new(center: LatLng, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CameraInner {
                center,
                zoom,
                bearing: 0.0,
                width,
                height,
                gesture_in_progress: false,
                moves: Vec::new(),
                transitions_cancelled: 0,
            })),
        }
    }

    pub fn center(&self) -> LatLng {
        self.inner.lock().center
    }

    pub fn zoom(&self) -> f64 {
        self.inner.lock().zoom
    }

    /// Map rotation in degrees; the direction shown as "up".
    pub fn bearing(&self) -> f64 {
        self.inner.lock().bearing
    }

    /// Pan the camera as a user would, without recording a follow move.
    pub fn pan_to(&self, center: LatLng) {
        self.inner.lock().center = center;
    }

    /// Mark a user gesture as in progress or finished.
    pub fn set_gesture_in_progress(&self, in_progress: bool) {
        self.inner.lock().gesture_in_progress = in_progress;
    }

    /// Every follow move issued so far.
    pub fn moves(&self) -> Vec<CameraMove> {
        self.inner.lock().moves.clone()
    }

    pub fn move_count(&self) -> usize {
        self.inner.lock().moves.len()
    }

    /// How many times in-flight transitions were cancelled.
    pub fn transitions_cancelled(&self) -> u32 {
        self.inner.lock().transitions_cancelled
    }
}

impl Projection for HeadlessCamera {
    fn project(&self, position: LatLng) -> Option<ScreenPoint> {
        if !position.is_valid() {
            return None;
        }
        let inner = self.inner.lock();
        let (cx, cy) = to_world_pixels(inner.center, inner.zoom);
        let (px, py) = to_world_pixels(position, inner.zoom);
        let (dx, dy) = (px - cx, py - cy);

        // Rotate the map so `bearing` points up.
        let theta = inner.bearing.to_radians();
        let x = dx * theta.cos() + dy * theta.sin();
        let y = -dx * theta.sin() + dy * theta.cos();

        Some(ScreenPoint::new(
            inner.width as f64 / 2.0 + x,
            inner.height as f64 / 2.0 + y,
        ))
    }

    fn focal_point(&self) -> ScreenPoint {
        let inner = self.inner.lock();
        ScreenPoint::new(inner.width as f64 / 2.0, inner.height as f64 / 2.0)
    }

    fn meters_per_pixel(&self, latitude: f64) -> f64 {
        meters_per_pixel(latitude, self.inner.lock().zoom)
    }
}

impl MapCamera for HeadlessCamera {
    fn move_camera_to(&mut self, target: LatLng, bearing: Option<f64>) {
        let mut inner = self.inner.lock();
        inner.center = target;
        if let Some(bearing) = bearing {
            inner.bearing = normalize_degrees(bearing);
        }
        inner.moves.push(CameraMove { target, bearing });
    }

    fn is_user_gesture_in_progress(&self) -> bool {
        self.inner.lock().gesture_in_progress
    }

    fn cancel_transitions(&mut self) {
        self.inner.lock().transitions_cancelled += 1;
    }
}
