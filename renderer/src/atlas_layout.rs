//! Atlas sizing and the glyph to slot placement rule.
//!
//! Every slice of the atlas texture array holds four glyphs in a 2x2 grid of quadrants. Placement
//! is computed from the glyph id alone: `glyph_id / 4` selects the slice, the lower two bits the
//! quadrant.
use cleartext_font::GlyphId;
use euclid::default::Point2D;

/// Minimum slice width in pixels.
pub const MIN_SLICE_WIDTH: u32 = 16;
/// Minimum slice height in pixels. Keeps atlases of small fonts from getting too coarse.
pub const MIN_SLICE_HEIGHT: u32 = 256;

pub const GLYPHS_PER_SLICE: u32 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasLayout {
    pub slice_width: u32,
    pub slice_height: u32,
    pub slice_count: u32,
}

/// Where a glyph lives in the atlas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GlyphSlot {
    pub slice: u32,
    /// Column and row of the quadrant, each 0 or 1.
    pub quadrant: (u32, u32),
}

impl GlyphSlot {
    pub fn of(glyph_id: GlyphId) -> Self {
        let id = glyph_id as u32;
        Self {
            slice: id / GLYPHS_PER_SLICE,
            quadrant: (id & 1, (id & 2) >> 1),
        }
    }

    /// The normalized texture coordinate of the quadrant's top left corner.
    pub fn base_uv(&self) -> (f32, f32) {
        (0.5 * self.quadrant.0 as f32, 0.5 * self.quadrant.1 as f32)
    }
}

impl AtlasLayout {
    /// Computes the layout for `glyph_count` glyphs of a font with the given cap height in device
    /// pixels.
    pub fn new(glyph_count: u16, cap_height_px: f32) -> Self {
        // Fractional pixels of the cap height are truncated.
        let quad_extent = 4 * cap_height_px.max(0.0) as u32;
        Self {
            slice_width: next_power_of_two(quad_extent).max(MIN_SLICE_WIDTH),
            slice_height: next_power_of_two(quad_extent).max(MIN_SLICE_HEIGHT),
            slice_count: (glyph_count as u32).div_ceil(GLYPHS_PER_SLICE),
        }
    }

    pub fn quadrant_size(&self) -> (u32, u32) {
        (self.slice_width / 2, self.slice_height / 2)
    }

    /// The pixel position of the glyph's quadrant inside its slice.
    pub fn slot_origin(&self, slot: GlyphSlot) -> Point2D<u32> {
        let (w, h) = self.quadrant_size();
        Point2D::new(w * slot.quadrant.0, h * slot.quadrant.1)
    }

    pub fn slice_pixels(&self) -> usize {
        self.slice_width as usize * self.slice_height as usize
    }

    pub fn pixel_count(&self) -> usize {
        self.slice_pixels() * self.slice_count as usize
    }
}

/// Rounds up to the next power of two. `0` rounds up to `1`.
pub fn next_power_of_two(x: u32) -> u32 {
    x.max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(64), 64);
        assert_eq!(next_power_of_two(65), 128);
    }

    #[test]
    fn small_fonts_get_the_floor_dimensions() {
        let layout = AtlasLayout::new(10, 2.9);
        assert_eq!(layout.slice_width, MIN_SLICE_WIDTH);
        assert_eq!(layout.slice_height, MIN_SLICE_HEIGHT);
        assert_eq!(layout.slice_count, 3);
    }

    #[test]
    fn larger_fonts_round_to_powers_of_two() {
        // 4 * 9 = 36 -> 64
        let layout = AtlasLayout::new(4, 9.7);
        assert_eq!(layout.slice_width, 64);
        assert_eq!(layout.slice_height, 256);

        // 4 * 100 = 400 -> 512
        let layout = AtlasLayout::new(4, 100.0);
        assert_eq!(layout.slice_width, 512);
        assert_eq!(layout.slice_height, 512);
        assert_eq!(layout.slice_count, 1);
    }

    #[test]
    fn slice_count_rounds_up() {
        assert_eq!(AtlasLayout::new(0, 10.0).slice_count, 0);
        assert_eq!(AtlasLayout::new(1, 10.0).slice_count, 1);
        assert_eq!(AtlasLayout::new(4, 10.0).slice_count, 1);
        assert_eq!(AtlasLayout::new(5, 10.0).slice_count, 2);
        assert_eq!(AtlasLayout::new(u16::MAX, 10.0).slice_count, 16384);
    }

    #[test]
    fn every_glyph_maps_to_a_unique_slot_inside_the_atlas() {
        let glyph_count = 1001;
        let layout = AtlasLayout::new(glyph_count, 12.0);
        let mut seen = HashSet::new();

        for glyph_id in 0..glyph_count {
            let slot = GlyphSlot::of(glyph_id);
            assert!(slot.slice < layout.slice_count);
            assert!([(0, 0), (1, 0), (0, 1), (1, 1)].contains(&slot.quadrant));
            assert!(seen.insert(slot), "slot of glyph {glyph_id} taken");
        }
    }

    #[test]
    fn glyphs_sharing_a_slice_occupy_distinct_quadrants() {
        let layout = AtlasLayout::new(8, 20.0);
        let origins: HashSet<_> = (4..8)
            .map(|id| layout.slot_origin(GlyphSlot::of(id)))
            .collect();
        let (w, h) = layout.quadrant_size();
        assert_eq!(
            origins,
            HashSet::from([
                Point2D::new(0, 0),
                Point2D::new(w, 0),
                Point2D::new(0, h),
                Point2D::new(w, h)
            ])
        );
        assert!((4..8).all(|id| GlyphSlot::of(id).slice == 1));
    }

    #[test]
    fn base_uv_selects_the_quadrant() {
        assert_eq!(GlyphSlot::of(0).base_uv(), (0.0, 0.0));
        assert_eq!(GlyphSlot::of(1).base_uv(), (0.5, 0.0));
        assert_eq!(GlyphSlot::of(2).base_uv(), (0.0, 0.5));
        assert_eq!(GlyphSlot::of(7).base_uv(), (0.5, 0.5));
    }
}
