//! Turns strings into triangle lists over the baked atlas.
use cleartext_font::{FontFace, GlyphId};
use log::warn;

use crate::{atlas_layout::GlyphSlot, glyph_baker::GlyphMetrics, pods::Vertex};

pub const VERTICES_PER_GLYPH: usize = 6;

/// Quad corners of the two triangles of a glyph, as fractions of its ink size.
const CORNERS: [(f32, f32); VERTICES_PER_GLYPH] = [
    (0.0, 0.0),
    (0.0, 1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (1.0, 0.0),
    (1.0, 1.0),
];

/// The two triangles of one glyph with its pen at `pen`.
pub fn glyph_vertices(
    pen: (f32, f32),
    glyph_id: GlyphId,
    metrics: &GlyphMetrics,
) -> [Vertex; VERTICES_PER_GLYPH] {
    let slot = GlyphSlot::of(glyph_id);
    let (base_u, base_v) = slot.base_uv();
    let x = pen.0 + metrics.offset_x;
    let y = pen.1 + metrics.offset_y;

    CORNERS.map(|(cx, cy)| {
        Vertex::new(
            (x + cx * metrics.width, y + cy * metrics.height),
            (base_u + cx * metrics.uv_width, base_v + cy * metrics.uv_height),
            slot.slice,
        )
    })
}

/// Lays out `text` left to right starting at the pen position `(x, y)`.
///
/// Characters map 1:1 to glyphs. Unrenderable glyphs produce degenerate triangles but still
/// advance the pen.
pub fn build_batch(
    face: &dyn FontFace,
    metrics: &[GlyphMetrics],
    text: &str,
    x: f32,
    y: f32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(text.chars().count() * VERTICES_PER_GLYPH);
    let mut pen = (x, y);

    for ch in text.chars() {
        let glyph_id = face.glyph_id(ch);
        let glyph_metrics = match metrics.get(glyph_id as usize) {
            Some(m) => *m,
            None => {
                warn!("Glyph {glyph_id} of {ch:?} is outside of the baked range");
                GlyphMetrics::default()
            }
        };

        vertices.extend(glyph_vertices(pen, glyph_id, &glyph_metrics));
        pen.0 += glyph_metrics.advance;
    }

    vertices
}
