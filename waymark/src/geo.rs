//! Geographic and angular helpers.
//!
//! Angles are degrees clockwise from true north. Screen space uses the
//! usual raster convention: x grows to the right, y grows downward.

use std::f64::consts::PI;
use std::fmt;

/// Maximum latitude representable in Web Mercator.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Earth's equatorial circumference in meters (WGS84).
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Size of a map tile in pixels at zoom 0.
pub const TILE_SIZE_PX: f64 = 256.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl LatLng {
    /// Create a new position.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}°, {:.5}°", self.latitude, self.longitude)
    }
}

/// A point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = ((degrees % 360.0) + 360.0) % 360.0;
    // -1e-15 % 360 + 360 rounds to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Absolute difference between two headings, handling wraparound.
///
/// 350° to 10° is 20°, not 340°.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
pub fn signed_angle_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_degrees(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Great-circle distance between two positions in meters (haversine).
pub fn distance_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial course from `from` to `to` in degrees `[0, 360)`.
pub fn course_between(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Project a position to Web Mercator world pixels at the given zoom.
///
/// Latitude is clamped to the Mercator limit.
pub fn to_world_pixels(position: LatLng, zoom: f64) -> (f64, f64) {
    let world = TILE_SIZE_PX * 2.0_f64.powf(zoom);
    let lat = position.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lat_rad = lat * PI / 180.0;

    let x = (position.longitude + 180.0) / 360.0 * world;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world;
    (x, y)
}

/// Ground resolution in meters per pixel at a latitude and zoom.
pub fn meters_per_pixel(latitude: f64, zoom: f64) -> f64 {
    let world = TILE_SIZE_PX * 2.0_f64.powf(zoom);
    EARTH_CIRCUMFERENCE_M * latitude.to_radians().cos().abs() / world
}
