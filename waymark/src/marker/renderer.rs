//! Marker renderer.
//!
//! Maps a [`RenderRequest`] to a frame on the [`RenderSurface`]:
//!
//! | Render mode         | Variant    | Drawable   | Position                    |
//! |---------------------|------------|------------|-----------------------------|
//! | `None`              | `Hidden`   | none       | surface cleared             |
//! | `Default`           | `Default`  | foreground | map focal point             |
//! | `FollowNoBearing`   | `Tracking` | foreground | projected fix (focal if none) |
//! | `Bearing` + reading | `Bearing`  | bearing    | projected fix (focal if none) |
//! | `Bearing`, no reading | `Tracking` | foreground | projected fix (focal if none) |

use std::fmt;
use std::time::Instant;

use tracing::{debug, trace};

use super::animation::RotationAnimator;
use super::drawable::{DrawableId, MarkerDrawable, MarkerIcons};
use super::surface::{AccuracyCircle, MarkerFrame, RenderSurface};
use crate::camera::Projection;
use crate::config::MarkerSettings;
use crate::error::{OverlayError, OverlayResult};
use crate::geo::{angular_difference, ScreenPoint};
use crate::tracking::{RenderMode, RenderRequest};

/// Which marker presentation is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerVariant {
    #[default]
    Hidden,
    Default,
    Tracking,
    Bearing,
}

impl MarkerVariant {
    /// Variant for a render request.
    pub fn for_request(request: &RenderRequest) -> Self {
        match request.mode {
            RenderMode::None => MarkerVariant::Hidden,
            RenderMode::Default => MarkerVariant::Default,
            RenderMode::FollowNoBearing => MarkerVariant::Tracking,
            RenderMode::Bearing if request.bearing.is_some() => MarkerVariant::Bearing,
            RenderMode::Bearing => MarkerVariant::Tracking,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerVariant::Hidden => "hidden",
            MarkerVariant::Default => "default",
            MarkerVariant::Tracking => "tracking",
            MarkerVariant::Bearing => "bearing",
        }
    }
}

impl fmt::Display for MarkerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of what the renderer last put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderedMarker {
    pub visible: bool,
    pub variant: MarkerVariant,
    pub drawable: Option<DrawableId>,
    pub position: Option<ScreenPoint>,
    /// Rotation the animation is heading toward.
    pub rotation_degrees: f64,
    /// Rotation currently drawn.
    pub displayed_rotation_degrees: f64,
    pub accuracy_radius_px: Option<f64>,
}

/// Draws the location marker.
pub struct MarkerRenderer {
    surface: Box<dyn RenderSurface>,
    icons: MarkerIcons,
    animator: RotationAnimator,
    accuracy_circle: bool,
    min_accuracy_radius_px: f64,
    last_request: Option<RenderRequest>,
    pending: Option<RenderRequest>,
    rendered: RenderedMarker,
    redraws: u64,
    animation_frames: u64,
}

impl MarkerRenderer {
    /// Create a renderer drawing `icons` onto `surface`.
    pub fn new(
        surface: Box<dyn RenderSurface>,
        icons: MarkerIcons,
        settings: &MarkerSettings,
    ) -> Self {
        Self {
            surface,
            icons,
            animator: RotationAnimator::new(settings.rotation_animation),
            accuracy_circle: settings.accuracy_circle,
            min_accuracy_radius_px: settings.min_accuracy_radius_px,
            last_request: None,
            pending: None,
            rendered: RenderedMarker::default(),
            redraws: 0,
            animation_frames: 0,
        }
    }

    /// Draw the state described by `request`.
    ///
    /// Returns [`OverlayError::RenderSurfaceNotReady`] if the surface has not
    /// been laid out; the request is kept and drawn by
    /// [`on_layout_complete`](Self::on_layout_complete).
    pub fn render<P: Projection + ?Sized>(
        &mut self,
        request: RenderRequest,
        projection: &P,
        now: Instant,
    ) -> OverlayResult<()> {
        if !self.surface.is_laid_out() {
            self.pending = Some(request);
            return Err(OverlayError::RenderSurfaceNotReady);
        }
        self.pending = None;

        let variant = MarkerVariant::for_request(&request);
        match (variant, request.bearing) {
            (MarkerVariant::Bearing, Some(reading)) => {
                self.animator.set_target(reading.heading_degrees, now)
            }
            _ => self.animator.freeze(now),
        }

        self.draw(request, projection, now)?;
        self.redraws += 1;
        debug!(
            variant = %self.rendered.variant,
            rotation = self.rendered.rotation_degrees,
            redraws = self.redraws,
            "Marker redrawn"
        );
        Ok(())
    }

    /// Draw a request deferred by an earlier [`render`](Self::render).
    ///
    /// Returns whether anything was drawn.
    pub fn on_layout_complete<P: Projection + ?Sized>(
        &mut self,
        projection: &P,
        now: Instant,
    ) -> OverlayResult<bool> {
        match self.pending.take() {
            Some(request) => {
                self.render(request, projection, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Advance the rotation animation, drawing a frame if the displayed
    /// angle moved. Returns whether a frame was drawn.
    pub fn tick<P: Projection + ?Sized>(&mut self, projection: &P, now: Instant) -> OverlayResult<bool> {
        if !self.rendered.visible || self.pending.is_some() {
            return Ok(false);
        }
        let displayed = self.displayed_rotation(self.rendered.variant, now);
        if angular_difference(displayed, self.rendered.displayed_rotation_degrees) < 1e-6 {
            return Ok(false);
        }
        let Some(request) = self.last_request else {
            return Ok(false);
        };

        self.draw(request, projection, now)?;
        self.animation_frames += 1;
        trace!(displayed, "Rotation animation frame");
        Ok(true)
    }

    /// Redraw the last request, e.g. after the camera moved or an icon changed.
    ///
    /// Does not count as a state redraw.
    pub fn refresh<P: Projection + ?Sized>(&mut self, projection: &P, now: Instant) -> OverlayResult<()> {
        if let Some(pending) = self.pending {
            if self.surface.is_laid_out() {
                return self.render(pending, projection, now);
            }
            return Ok(());
        }
        match self.last_request {
            Some(request) if self.surface.is_laid_out() => self.draw(request, projection, now),
            _ => Ok(()),
        }
    }

    /// Replace the foreground marker.
    pub fn set_foreground_drawable(&mut self, drawable: MarkerDrawable) {
        self.icons.foreground = drawable;
    }

    /// Replace the bearing marker.
    pub fn set_bearing_drawable(&mut self, drawable: MarkerDrawable) {
        self.icons.bearing = drawable;
    }

    /// Drawable currently on screen, `None` while hidden.
    pub fn active_drawable(&self) -> Option<&MarkerDrawable> {
        match self.rendered.variant {
            MarkerVariant::Hidden => None,
            MarkerVariant::Bearing => Some(&self.icons.bearing),
            MarkerVariant::Default | MarkerVariant::Tracking => Some(&self.icons.foreground),
        }
    }

    pub fn icons(&self) -> &MarkerIcons {
        &self.icons
    }

    pub fn rendered(&self) -> RenderedMarker {
        self.rendered
    }

    /// Number of state redraws.
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Number of frames drawn only to advance the rotation animation.
    pub fn animation_frames(&self) -> u64 {
        self.animation_frames
    }

    /// Whether a render is waiting for layout.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Remove the marker from the surface.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.rendered = RenderedMarker::default();
        self.last_request = None;
        self.pending = None;
    }

    fn draw<P: Projection + ?Sized>(
        &mut self,
        request: RenderRequest,
        projection: &P,
        now: Instant,
    ) -> OverlayResult<()> {
        let variant = MarkerVariant::for_request(&request);
        self.last_request = Some(request);

        if variant == MarkerVariant::Hidden {
            self.surface.clear();
            self.rendered = RenderedMarker {
                rotation_degrees: self.animator.target(),
                displayed_rotation_degrees: self.animator.sample(now),
                ..RenderedMarker::default()
            };
            return Ok(());
        }

        let focal = projection.focal_point();
        let position = match variant {
            MarkerVariant::Default => focal,
            _ => request
                .fix
                .and_then(|fix| projection.project(fix.position()))
                .unwrap_or(focal),
        };

        let accuracy = if self.accuracy_circle {
            request.fix.and_then(|fix| {
                let mpp = projection.meters_per_pixel(fix.latitude);
                let radius_px = fix.accuracy_m as f64 / mpp;
                (mpp > 0.0 && radius_px.is_finite() && radius_px >= self.min_accuracy_radius_px)
                    .then_some(AccuracyCircle {
                        center: position,
                        radius_px,
                    })
            })
        } else {
            None
        };

        let drawable = match variant {
            MarkerVariant::Bearing => self.icons.bearing.clone(),
            _ => self.icons.foreground.clone(),
        };
        let displayed = self.displayed_rotation(variant, now);
        let frame = MarkerFrame {
            drawable,
            position,
            rotation_degrees: displayed,
            accuracy,
        };
        self.surface.draw(&frame)?;

        self.rendered = RenderedMarker {
            visible: true,
            variant,
            drawable: Some(frame.drawable.id()),
            position: Some(position),
            rotation_degrees: self.target_rotation(variant),
            displayed_rotation_degrees: displayed,
            accuracy_radius_px: accuracy.map(|a| a.radius_px),
        };
        Ok(())
    }

    /// The default marker is always drawn north-up; the animator keeps its
    /// frozen angle for the next bearing redraw.
    fn target_rotation(&self, variant: MarkerVariant) -> f64 {
        match variant {
            MarkerVariant::Default => 0.0,
            _ => self.animator.target(),
        }
    }

    fn displayed_rotation(&self, variant: MarkerVariant, now: Instant) -> f64 {
        match variant {
            MarkerVariant::Default => 0.0,
            _ => self.animator.sample(now),
        }
    }
}

impl fmt::Debug for MarkerRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerRenderer")
            .field("rendered", &self.rendered)
            .field("pending", &self.pending.is_some())
            .field("redraws", &self.redraws)
            .field("animation_frames", &self.animation_frames)
            .finish()
    }
}
