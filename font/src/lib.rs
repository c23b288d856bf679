//! The font service contract consumed by the glyph atlas baker, and its backends.
mod font_face;
mod raster_surface;
mod rasterizer;
mod swash_face;
mod synthetic;

pub use font_face::*;
pub use raster_surface::*;
pub use rasterizer::*;
pub use swash_face::*;
pub use synthetic::*;
