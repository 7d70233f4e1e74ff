//! Location marker rendering.
//!
//! # Architecture
//!
//! ```text
//! RenderRequest ──► MarkerRenderer ──► MarkerFrame ──► RenderSurface
//!                        │                              (PixmapSurface)
//!                        ├── MarkerIcons (foreground, bearing)
//!                        └── RotationAnimator (shortest arc, ease-out)
//! ```
//!
//! Exactly two drawable identities are in play at any time. Which one is on
//! screen is a pure function of the render variant, and drawables compare by
//! pixel content, not by allocation.

mod animation;
mod drawable;
mod renderer;
mod surface;

pub use animation::RotationAnimator;
pub use drawable::{DrawableId, MarkerDrawable, MarkerIcons, BUILTIN_MARKER_SIZE};
pub use renderer::{MarkerRenderer, MarkerVariant, RenderedMarker};
pub use surface::{AccuracyCircle, MarkerFrame, PixmapSurface, RenderSurface};
