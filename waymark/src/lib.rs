//! Waymark: the "my location" overlay core for map widgets.
//!
//! The overlay owns the user's live position and heading, derives a render
//! mode from its enabled flag, tracking mode and bearing source, draws the
//! matching location marker, and keeps the map camera on the user without
//! fighting the user's own gestures.
//!
//! # Example
//!
//! ```
//! use waymark::camera::HeadlessCamera;
//! use waymark::geo::LatLng;
//! use waymark::marker::PixmapSurface;
//! use waymark::sim::SimulatedLocationProvider;
//! use waymark::tracking::TrackingMode;
//! use waymark::OverlayView;
//!
//! let mut view = OverlayView::builder()
//!     .with_location_provider(SimulatedLocationProvider::new())
//!     .with_camera(HeadlessCamera::new(LatLng::new(53.55, 9.99), 16.0, 256, 256))
//!     .with_surface(PixmapSurface::new(256, 256).unwrap())
//!     .attach()
//!     .unwrap();
//!
//! view.set_enabled(true);
//! view.set_tracking_mode(TrackingMode::Follow);
//! assert!(view.is_visible());
//! ```

pub mod bearing;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod geo;
pub mod location;
pub mod logging;
pub mod marker;
pub mod overlay;
pub mod sim;
pub mod tracking;

pub use error::{OverlayError, OverlayResult, ProviderKind};
pub use overlay::{OverlayView, OverlayViewBuilder};

/// Version of the waymark library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
