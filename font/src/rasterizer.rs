use euclid::default::{Box2D, Point2D};
use thiserror::Error;

use crate::{GlyphId, RasterSurface};

/// The ink bounding box of a rasterized glyph in raster surface pixels.
///
/// Exclusive on the max side.
pub type InkBounds = Box2D<i32>;

/// The pen position on the raster surface.
pub type Pen = Point2D<i32>;

#[derive(Debug, Error)]
#[error("Failed to rasterize glyph {glyph_id}")]
pub struct GlyphRasterError {
    pub glyph_id: GlyphId,
}

/// Renders single glyphs onto a [`RasterSurface`].
pub trait GlyphRasterizer {
    /// Render `glyph_id` at `pixel_per_em` with its pen origin at `pen`.
    ///
    /// Expects a clear surface. Pixels outside of the surface are dropped, but the returned ink
    /// bounds are _not_ clipped and may lie outside the surface.
    fn rasterize(
        &mut self,
        glyph_id: GlyphId,
        pixel_per_em: f32,
        pen: Pen,
        surface: &mut RasterSurface,
    ) -> Result<InkBounds, GlyphRasterError>;
}
