use cleartext_font::{GlyphId, InkBounds};
use thiserror::Error;

/// Fatal baking errors a caller may want to tell apart.
///
/// These travel inside [`anyhow::Error`], use `downcast_ref` to recover them.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The ink of a glyph does not fit on the raster surface. Point size, dpi, or the raster
    /// surface scale are misconfigured.
    #[error("Ink {ink:?} of glyph {glyph_id} exceeds the raster surface {surface:?}")]
    AtlasOverflow {
        glyph_id: GlyphId,
        ink: InkBounds,
        surface: InkBounds,
    },
    #[error("GPU resource: {0}")]
    Gpu(String),
}
