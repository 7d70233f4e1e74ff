//! Render surfaces the marker is drawn onto.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Shader, Transform};

use super::drawable::MarkerDrawable;
use crate::error::{OverlayError, OverlayResult};
use crate::geo::ScreenPoint;

/// Accuracy circle fill (translucent blue).
const ACCURACY_FILL: (u8, u8, u8, u8) = (0x1a, 0x73, 0xe8, 0x30);

/// Translucent circle showing the fix's horizontal accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyCircle {
    pub center: ScreenPoint,
    pub radius_px: f64,
}

/// One frame of the marker overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFrame {
    pub drawable: MarkerDrawable,
    /// Screen point the drawable is centered on.
    pub position: ScreenPoint,
    /// Clockwise rotation about `position`, in degrees.
    pub rotation_degrees: f64,
    pub accuracy: Option<AccuracyCircle>,
}

/// Where the overlay draws.
///
/// Each `draw` replaces the previous frame.
pub trait RenderSurface: Send {
    /// Whether the surface has a size yet. Drawing before layout is deferred.
    fn is_laid_out(&self) -> bool;

    /// Replace the surface content with `frame`.
    fn draw(&mut self, frame: &MarkerFrame) -> OverlayResult<()>;

    /// Remove the marker.
    fn clear(&mut self);
}

struct PixmapSurfaceInner {
    pixmap: Pixmap,
    laid_out: bool,
    frames_drawn: u64,
}

/// A [`RenderSurface`] backed by a `tiny-skia` pixmap.
///
/// Clones share the same pixmap, so a caller can keep a handle for saving
/// snapshots after handing one to the overlay.
#[derive(Clone)]
pub struct PixmapSurface {
    inner: Arc<Mutex<PixmapSurfaceInner>>,
}

impl PixmapSurface {
    /// Create a laid-out surface.
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(OverlayError::InvalidSurface { width, height })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(PixmapSurfaceInner {
                pixmap,
                laid_out: true,
                frames_drawn: 0,
            })),
        })
    }

    /// Create a surface that reports itself as not laid out yet.
    pub fn unlaid(width: u32, height: u32) -> OverlayResult<Self> {
        let surface = Self::new(width, height)?;
        surface.set_laid_out(false);
        Ok(surface)
    }

    pub fn set_laid_out(&self, laid_out: bool) {
        self.inner.lock().laid_out = laid_out;
    }

    pub fn width(&self) -> u32 {
        self.inner.lock().pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.lock().pixmap.height()
    }

    /// Number of frames drawn so far.
    pub fn frames_drawn(&self) -> u64 {
        self.inner.lock().frames_drawn
    }

    /// Alpha of the pixel at (x, y), `None` outside the surface.
    pub fn pixel_alpha(&self, x: u32, y: u32) -> Option<u8> {
        self.inner.lock().pixmap.pixel(x, y).map(|p| p.alpha())
    }

    /// Whether any pixel is non-transparent.
    pub fn has_content(&self) -> bool {
        self.inner
            .lock()
            .pixmap
            .pixels()
            .iter()
            .any(|p| p.alpha() > 0)
    }

    /// Encode the current content as PNG.
    pub fn encode_png(&self) -> OverlayResult<Vec<u8>> {
        self.inner
            .lock()
            .pixmap
            .encode_png()
            .map_err(|e| OverlayError::ImageEncode(e.to_string()))
    }

    /// Write the current content to a PNG file.
    pub fn save_png(&self, path: &Path) -> OverlayResult<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PixmapSurface")
            .field("width", &inner.pixmap.width())
            .field("height", &inner.pixmap.height())
            .field("laid_out", &inner.laid_out)
            .field("frames_drawn", &inner.frames_drawn)
            .finish()
    }
}

impl RenderSurface for PixmapSurface {
    fn is_laid_out(&self) -> bool {
        self.inner.lock().laid_out
    }

    fn draw(&mut self, frame: &MarkerFrame) -> OverlayResult<()> {
        let marker = frame.drawable.as_pixmap_ref()?;
        let mut inner = self.inner.lock();
        inner.pixmap.fill(Color::TRANSPARENT);

        if let Some(circle) = frame.accuracy {
            let path = PathBuilder::from_circle(
                circle.center.x as f32,
                circle.center.y as f32,
                circle.radius_px as f32,
            );
            if let Some(path) = path {
                let (r, g, b, a) = ACCURACY_FILL;
                let paint = Paint {
                    shader: Shader::SolidColor(Color::from_rgba8(r, g, b, a)),
                    anti_alias: true,
                    ..Default::default()
                };
                inner
                    .pixmap
                    .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }

        let (x, y) = (frame.position.x as f32, frame.position.y as f32);
        let half_w = frame.drawable.width() as f32 / 2.0;
        let half_h = frame.drawable.height() as f32 / 2.0;
        let transform = Transform::from_rotate_at(frame.rotation_degrees as f32, x, y)
            .pre_translate(x - half_w, y - half_h);

        inner.pixmap.draw_pixmap(
            0,
            0,
            marker,
            &PixmapPaint::default(),
            transform,
            None,
        );
        inner.frames_drawn += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.inner.lock().pixmap.fill(Color::TRANSPARENT);
    }
}
