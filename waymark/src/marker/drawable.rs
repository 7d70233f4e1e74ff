//! Marker drawables with content identity.
//!
//! A [`MarkerDrawable`] is an immutable premultiplied RGBA bitmap. Its
//! identity is a SHA-256 digest of its dimensions and pixels, so two drawables
//! decoded independently from the same PNG compare equal, while the display
//! name is ignored.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tiny_skia::{
    Color, FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapRef, Shader, Stroke, Transform,
};

use crate::error::{OverlayError, OverlayResult};

/// Built-in marker edge length in pixels.
pub const BUILTIN_MARKER_SIZE: u32 = 48;

/// Content identity of a drawable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId([u8; 32]);

impl DrawableId {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn compute(width: u32, height: u32, pixels: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(width.to_le_bytes());
        hasher.update(height.to_le_bytes());
        hasher.update(pixels);
        let digest = hasher.finalize();

        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        DrawableId(id)
    }
}

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawableId({})", self)
    }
}

struct DrawableData {
    name: String,
    width: u32,
    height: u32,
    /// Premultiplied RGBA, row-major.
    pixels: Vec<u8>,
    id: DrawableId,
}

/// An immutable marker bitmap, cheap to clone.
#[derive(Clone)]
pub struct MarkerDrawable {
    inner: Arc<DrawableData>,
}

impl MarkerDrawable {
    /// Wrap premultiplied RGBA pixels.
    pub fn from_premultiplied_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> OverlayResult<Self> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(OverlayError::InvalidDrawable {
                name,
                reason: format!("empty size {}x{}", width, height),
            });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(OverlayError::InvalidDrawable {
                name,
                reason: format!("expected {} bytes, got {}", expected, pixels.len()),
            });
        }

        let id = DrawableId::compute(width, height, &pixels);
        Ok(Self {
            inner: Arc::new(DrawableData {
                name,
                width,
                height,
                pixels,
                id,
            }),
        })
    }

    /// Wrap straight (non-premultiplied) RGBA pixels.
    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        mut pixels: Vec<u8>,
    ) -> OverlayResult<Self> {
        for px in pixels.chunks_exact_mut(4) {
            let alpha = px[3] as u16;
            for channel in &mut px[..3] {
                *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
            }
        }
        Self::from_premultiplied_rgba(name, width, height, pixels)
    }

    /// Take ownership of a rendered pixmap.
    pub fn from_pixmap(name: impl Into<String>, pixmap: Pixmap) -> OverlayResult<Self> {
        let (width, height) = (pixmap.width(), pixmap.height());
        Self::from_premultiplied_rgba(name, width, height, pixmap.take())
    }

    /// Decode a PNG (or any format `image` understands).
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> OverlayResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(name, width, height, rgba.into_raw())
    }

    /// Load and decode an image file. The file stem becomes the name.
    pub fn load(path: &Path) -> OverlayResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::decode(name, &bytes)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Content identity.
    pub fn id(&self) -> DrawableId {
        self.inner.id
    }

    /// Premultiplied RGBA pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.inner.pixels
    }

    /// Borrow as a pixmap for compositing.
    pub fn as_pixmap_ref(&self) -> OverlayResult<PixmapRef<'_>> {
        PixmapRef::from_bytes(&self.inner.pixels, self.inner.width, self.inner.height).ok_or_else(
            || OverlayError::InvalidDrawable {
                name: self.inner.name.clone(),
                reason: "pixel buffer does not match dimensions".to_string(),
            },
        )
    }

    /// Copy into an owned pixmap.
    pub fn to_pixmap(&self) -> OverlayResult<Pixmap> {
        let size = IntSize::from_wh(self.inner.width, self.inner.height).ok_or(
            OverlayError::InvalidSurface {
                width: self.inner.width,
                height: self.inner.height,
            },
        )?;
        Pixmap::from_vec(self.inner.pixels.clone(), size).ok_or_else(|| {
            OverlayError::InvalidDrawable {
                name: self.inner.name.clone(),
                reason: "pixel buffer does not match dimensions".to_string(),
            }
        })
    }

    /// The built-in position marker: a blue dot with a white ring.
    pub fn default_marker() -> OverlayResult<Self> {
        let mut pixmap = blank_marker_pixmap()?;
        draw_dot(&mut pixmap)?;
        Self::from_pixmap("default", pixmap)
    }

    /// The built-in bearing marker: the position dot with a north-pointing
    /// chevron. Rotation is applied when compositing.
    pub fn bearing_marker() -> OverlayResult<Self> {
        let mut pixmap = blank_marker_pixmap()?;

        let c = BUILTIN_MARKER_SIZE as f32 / 2.0;
        let mut pb = PathBuilder::new();
        pb.move_to(c, 1.0);
        pb.line_to(c + 9.0, c - 9.0);
        pb.line_to(c - 9.0, c - 9.0);
        pb.close();
        let chevron = pb.finish().ok_or_else(|| builtin_error("bearing"))?;
        pixmap.fill_path(
            &chevron,
            &solid(Color::from_rgba8(0x1a, 0x73, 0xe8, 0xff)),
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        draw_dot(&mut pixmap)?;
        Self::from_pixmap("bearing", pixmap)
    }
}

impl PartialEq for MarkerDrawable {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MarkerDrawable {}

impl Hash for MarkerDrawable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for MarkerDrawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerDrawable")
            .field("name", &self.inner.name)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("id", &self.inner.id)
            .finish()
    }
}

fn blank_marker_pixmap() -> OverlayResult<Pixmap> {
    Pixmap::new(BUILTIN_MARKER_SIZE, BUILTIN_MARKER_SIZE).ok_or(OverlayError::InvalidSurface {
        width: BUILTIN_MARKER_SIZE,
        height: BUILTIN_MARKER_SIZE,
    })
}

fn draw_dot(pixmap: &mut Pixmap) -> OverlayResult<()> {
    let c = BUILTIN_MARKER_SIZE as f32 / 2.0;

    let ring = PathBuilder::from_circle(c, c, 12.0).ok_or_else(|| builtin_error("ring"))?;
    pixmap.fill_path(
        &ring,
        &solid(Color::WHITE),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    pixmap.stroke_path(
        &ring,
        &solid(Color::from_rgba8(0, 0, 0, 0x40)),
        &Stroke {
            width: 1.0,
            ..Default::default()
        },
        Transform::identity(),
        None,
    );

    let dot = PathBuilder::from_circle(c, c, 8.5).ok_or_else(|| builtin_error("dot"))?;
    pixmap.fill_path(
        &dot,
        &solid(Color::from_rgba8(0x1a, 0x73, 0xe8, 0xff)),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    Ok(())
}

fn solid(color: Color) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(color),
        anti_alias: true,
        ..Default::default()
    }
}

fn builtin_error(part: &str) -> OverlayError {
    OverlayError::InvalidDrawable {
        name: "builtin".to_string(),
        reason: format!("could not build {} path", part),
    }
}

/// The two drawables the renderer chooses between.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcons {
    /// Shown in every visible mode except bearing.
    pub foreground: MarkerDrawable,
    /// Shown in bearing mode.
    pub bearing: MarkerDrawable,
}

impl MarkerIcons {
    /// The built-in icon pair.
    pub fn builtin() -> OverlayResult<Self> {
        Ok(Self {
            foreground: MarkerDrawable::default_marker()?,
            bearing: MarkerDrawable::bearing_marker()?,
        })
    }

    /// Built-in icons, with any configured PNG overrides loaded from disk.
    pub fn from_paths(foreground: Option<&Path>, bearing: Option<&Path>) -> OverlayResult<Self> {
        let foreground = match foreground {
            Some(path) => MarkerDrawable::load(path)?,
            None => MarkerDrawable::default_marker()?,
        };
        let bearing = match bearing {
            Some(path) => MarkerDrawable::load(path)?,
            None => MarkerDrawable::bearing_marker()?,
        };
        Ok(Self {
            foreground,
            bearing,
        })
    }
}
