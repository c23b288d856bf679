use std::fmt;

/// A glyph index into a font face.
pub type GlyphId = u16;

/// Font wide metrics in design units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DesignMetrics {
    pub units_per_em: u16,
    pub cap_height: f32,
}

impl DesignMetrics {
    /// Device pixels per design unit for the given em size.
    pub fn pixel_per_design_unit(&self, pixel_per_em: f32) -> f32 {
        pixel_per_em / self.units_per_em as f32
    }
}

/// A loaded font face.
///
/// Glyph ids are dense, starting at 0 and ending before [`FontFace::glyph_count`].
pub trait FontFace: fmt::Debug {
    fn glyph_count(&self) -> u16;

    fn design_metrics(&self) -> DesignMetrics;

    /// The horizontal advance of a glyph in design units.
    fn design_advance(&self, glyph_id: GlyphId) -> f32;

    /// Maps a character to its glyph. No shaping, unmapped characters resolve to the face's
    /// default glyph.
    fn glyph_id(&self, ch: char) -> GlyphId;
}
