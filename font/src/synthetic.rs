use std::collections::HashMap;

use euclid::default::{Box2D, Point2D};

use crate::{
    DesignMetrics, FontFace, GlyphId, GlyphRasterError, GlyphRasterizer, InkBounds, Pen,
    RasterSurface,
};

/// An in-memory font with explicitly configured glyphs.
///
/// Every glyph starts out with the same design advance and a small ink box right above the pen.
/// Useful wherever a real font file would make results depend on a rasterizer.
#[derive(Debug, Clone)]
pub struct SyntheticFont {
    metrics: DesignMetrics,
    glyphs: Vec<SyntheticGlyph>,
    char_map: HashMap<char, GlyphId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticGlyph {
    /// Design units.
    pub advance: f32,
    /// Ink relative to the pen in pixels. `None` fails rasterization.
    pub ink: Option<InkBounds>,
    pub coverage: [u8; 3],
}

impl SyntheticFont {
    pub const DEFAULT_INK: InkBounds = Box2D::new(Point2D::new(0, -4), Point2D::new(3, 0));

    /// A font where all `glyph_count` glyphs share the same `advance`.
    pub fn monospaced(glyph_count: u16, units_per_em: u16, cap_height: f32, advance: f32) -> Self {
        let glyph = SyntheticGlyph {
            advance,
            ink: Some(Self::DEFAULT_INK),
            coverage: [255, 255, 255],
        };
        Self {
            metrics: DesignMetrics {
                units_per_em,
                cap_height,
            },
            glyphs: vec![glyph; glyph_count as usize],
            char_map: HashMap::new(),
        }
    }

    pub fn with_advance(mut self, glyph_id: GlyphId, advance: f32) -> Self {
        self.glyphs[glyph_id as usize].advance = advance;
        self
    }

    pub fn with_ink(mut self, glyph_id: GlyphId, ink: InkBounds, coverage: [u8; 3]) -> Self {
        let glyph = &mut self.glyphs[glyph_id as usize];
        glyph.ink = Some(ink);
        glyph.coverage = coverage;
        self
    }

    /// Rasterization of `glyph_id` fails.
    pub fn with_failing(mut self, glyph_id: GlyphId) -> Self {
        self.glyphs[glyph_id as usize].ink = None;
        self
    }

    pub fn with_char(mut self, ch: char, glyph_id: GlyphId) -> Self {
        self.char_map.insert(ch, glyph_id);
        self
    }
}

impl FontFace for SyntheticFont {
    fn glyph_count(&self) -> u16 {
        self.glyphs.len() as u16
    }

    fn design_metrics(&self) -> DesignMetrics {
        self.metrics
    }

    fn design_advance(&self, glyph_id: GlyphId) -> f32 {
        self.glyphs[glyph_id as usize].advance
    }

    fn glyph_id(&self, ch: char) -> GlyphId {
        self.char_map.get(&ch).copied().unwrap_or_default()
    }
}

/// Synthetic glyphs don't scale, their ink boxes are specified in pixels.
impl GlyphRasterizer for SyntheticFont {
    fn rasterize(
        &mut self,
        glyph_id: GlyphId,
        _pixel_per_em: f32,
        pen: Pen,
        surface: &mut RasterSurface,
    ) -> Result<InkBounds, GlyphRasterError> {
        let glyph = &self.glyphs[glyph_id as usize];
        let ink = glyph
            .ink
            .ok_or(GlyphRasterError { glyph_id })?
            .translate(pen.to_vector());

        let [c0, c1, c2] = glyph.coverage;
        for y in ink.min.y..ink.max.y {
            for x in ink.min.x..ink.max.x {
                surface.put(x, y, [c0, c1, c2, 0]);
            }
        }

        Ok(ink)
    }
}

#[cfg(test)]
mod tests {
    use euclid::default::Box2D;

    use super::SyntheticFont;
    use crate::{FontFace, GlyphRasterizer, RasterSurface};

    #[test]
    fn rasterizes_ink_relative_to_the_pen() {
        let mut font = SyntheticFont::monospaced(2, 1000, 700.0, 500.0).with_ink(
            1,
            Box2D::new((-1, -2).into(), (1, 0).into()),
            [10, 20, 30],
        );
        let mut surface = RasterSurface::new(8, 8);

        let ink = font
            .rasterize(1, 16.0, (4, 4).into(), &mut surface)
            .unwrap();

        assert_eq!(ink, Box2D::new((3, 2).into(), (5, 4).into()));
        assert_eq!(surface.pixel(3, 2), [10, 20, 30, 0]);
        assert_eq!(surface.pixel(4, 3), [10, 20, 30, 0]);
        assert_eq!(surface.pixel(5, 4), RasterSurface::BACKGROUND);
    }

    #[test]
    fn failing_glyph_leaves_surface_untouched() {
        let mut font = SyntheticFont::monospaced(1, 1000, 700.0, 500.0).with_failing(0);
        let mut surface = RasterSurface::new(8, 8);

        let err = font
            .rasterize(0, 16.0, (4, 4).into(), &mut surface)
            .unwrap_err();

        assert_eq!(err.glyph_id, 0);
        assert!(surface.is_clear());
    }

    #[test]
    fn unmapped_characters_resolve_to_glyph_zero() {
        let font = SyntheticFont::monospaced(4, 1000, 700.0, 500.0).with_char('a', 3);
        assert_eq!(font.glyph_id('a'), 3);
        assert_eq!(font.glyph_id('b'), 0);
    }
}
