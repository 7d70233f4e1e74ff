//! Builder for [`OverlayView`].

use std::sync::Arc;

use tracing::{info, warn};

use super::status::SharedOverlayStatus;
use super::view::OverlayView;
use crate::bearing::BearingProvider;
use crate::camera::{CameraFollowController, MapCamera};
use crate::clock::{Clock, SystemClock};
use crate::config::{MarkerSettings, OverlayConfig};
use crate::error::{OverlayError, OverlayResult};
use crate::event::EventBus;
use crate::location::LocationProvider;
use crate::marker::{MarkerIcons, MarkerRenderer, RenderSurface};
use crate::tracking::TrackingStateMachine;

/// Collects the collaborators of an [`OverlayView`].
///
/// A location provider, a camera and a render surface are required. The
/// bearing provider is optional; without one, any bearing source degrades to
/// `None` when the overlay tries to subscribe.
#[derive(Default)]
pub struct OverlayViewBuilder {
    config: OverlayConfig,
    location: Option<Box<dyn LocationProvider>>,
    bearing: Option<Box<dyn BearingProvider>>,
    camera: Option<Box<dyn MapCamera>>,
    surface: Option<Box<dyn RenderSurface>>,
    clock: Option<Arc<dyn Clock>>,
    icons: Option<MarkerIcons>,
}

impl OverlayViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial settings. Defaults to [`OverlayConfig::default`].
    pub fn with_config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_location_provider(mut self, provider: impl LocationProvider + 'static) -> Self {
        self.location = Some(Box::new(provider));
        self
    }

    pub fn with_bearing_provider(mut self, provider: impl BearingProvider + 'static) -> Self {
        self.bearing = Some(Box::new(provider));
        self
    }

    pub fn with_camera(mut self, camera: impl MapCamera + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    pub fn with_surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Time source. Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Marker icons, overriding the icon paths in the configuration.
    pub fn with_icons(mut self, icons: MarkerIcons) -> Self {
        self.icons = Some(icons);
        self
    }

    /// Attach the overlay to its map.
    ///
    /// Applies the configured tracking mode and bearing source, then enables
    /// the overlay if the configuration says so.
    pub fn attach(self) -> OverlayResult<OverlayView> {
        let location = self
            .location
            .ok_or(OverlayError::MissingComponent("location provider"))?;
        let camera = self
            .camera
            .ok_or(OverlayError::MissingComponent("camera"))?;
        let surface = self
            .surface
            .ok_or(OverlayError::MissingComponent("surface"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let icons = match self.icons {
            Some(icons) => icons,
            None => load_icons(&self.config.marker)?,
        };

        let config = self.config;
        let renderer = MarkerRenderer::new(surface, icons, &config.marker);
        let follow = CameraFollowController::new(config.camera.gesture_dismiss_timeout);

        let mut view = OverlayView {
            machine: TrackingStateMachine::new(),
            renderer,
            follow,
            camera,
            location,
            bearing: self.bearing,
            bus: EventBus::new(),
            clock,
            status: SharedOverlayStatus::new(),
            detached: false,
        };

        info!(
            location_provider = view.location.name(),
            bearing_provider = view.bearing.as_ref().map(|b| b.name()).unwrap_or("none"),
            tracking_mode = %config.overlay.tracking_mode,
            bearing_source = %config.overlay.bearing_source,
            enabled = config.overlay.enabled,
            "Overlay attached"
        );

        view.set_tracking_mode(config.overlay.tracking_mode);
        view.set_bearing_source(config.overlay.bearing_source);
        view.set_enabled(config.overlay.enabled);
        view.publish_status();
        Ok(view)
    }
}

/// Icons from the configured paths, falling back to the built-in markers.
fn load_icons(settings: &MarkerSettings) -> OverlayResult<MarkerIcons> {
    if settings.foreground_icon.is_none() && settings.bearing_icon.is_none() {
        return MarkerIcons::builtin();
    }
    match MarkerIcons::from_paths(
        settings.foreground_icon.as_deref(),
        settings.bearing_icon.as_deref(),
    ) {
        Ok(icons) => Ok(icons),
        Err(e) => {
            warn!(error = %e, "Failed to load marker icons, using built-in markers");
            MarkerIcons::builtin()
        }
    }
}
