//! Rasterizes all glyphs of a font once and packs them into a CPU side atlas.
use anyhow::{Result, bail};
use cleartext_font::{FontFace, GlyphId, GlyphRasterizer, InkBounds, Pen, RasterSurface};
use log::{debug, info, warn};
use tracing::instrument;

use crate::{
    BakeConfig, BakeError,
    atlas_layout::{AtlasLayout, GlyphSlot},
};

/// Placement and size of a baked glyph.
///
/// All zero for glyphs that failed to rasterize. These still render, but as empty quads.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Pixels from the pen position to the top left corner of the ink.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Whole pixels.
    pub advance: f32,
    /// Ink size in pixels.
    pub width: f32,
    pub height: f32,
    /// Ink size relative to the slice size.
    pub uv_width: f32,
    pub uv_height: f32,
}

/// The CPU side atlas: `slice_count` slices of 3 coverage bytes per pixel, slice after slice, row
/// after row.
#[derive(Debug, Clone)]
pub struct AtlasImage {
    layout: AtlasLayout,
    data: Vec<u8>,
}

impl AtlasImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn new(layout: AtlasLayout) -> Self {
        Self {
            layout,
            data: vec![0; layout.pixel_count() * Self::BYTES_PER_PIXEL],
        }
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, slice: u32, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(slice, x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Expands the atlas to 4 bytes per pixel, the fourth set to 255.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.layout.pixel_count() * 4);
        for rgb in self.data.chunks_exact(Self::BYTES_PER_PIXEL) {
            rgba.extend_from_slice(rgb);
            rgba.push(u8::MAX);
        }
        rgba
    }

    fn row_mut(&mut self, slice: u32, x: u32, y: u32, width: u32) -> &mut [u8] {
        debug_assert!(x + width <= self.layout.slice_width);
        let start = self.offset(slice, x, y);
        &mut self.data[start..start + width as usize * Self::BYTES_PER_PIXEL]
    }

    fn offset(&self, slice: u32, x: u32, y: u32) -> usize {
        let layout = &self.layout;
        debug_assert!(slice < layout.slice_count && y < layout.slice_height);
        (slice as usize * layout.slice_pixels()
            + y as usize * layout.slice_width as usize
            + x as usize)
            * Self::BYTES_PER_PIXEL
    }
}

/// The result of baking, ready to be uploaded.
#[derive(Debug, Clone)]
pub struct BakedGlyphs {
    pub pixel_per_em: f32,
    /// Indexed by glyph id.
    pub metrics: Vec<GlyphMetrics>,
    pub atlas: AtlasImage,
    unrenderable_count: usize,
}

impl BakedGlyphs {
    pub fn layout(&self) -> &AtlasLayout {
        self.atlas.layout()
    }

    /// The number of glyphs that failed to rasterize.
    pub fn unrenderable_count(&self) -> usize {
        self.unrenderable_count
    }
}

/// Rasterizes every glyph of `face` and copies its ink into the atlas slot dictated by
/// [`GlyphSlot`].
///
/// Glyphs that fail to rasterize keep zeroed metrics. Ink that leaves the raster surface is fatal
/// ([`BakeError::AtlasOverflow`]).
#[instrument(skip_all)]
pub fn bake_glyphs(
    face: &dyn FontFace,
    rasterizer: &mut dyn GlyphRasterizer,
    config: &BakeConfig,
) -> Result<BakedGlyphs> {
    config.validate()?;

    let design = face.design_metrics();
    if design.units_per_em == 0 {
        bail!("Font reports zero design units per em");
    }

    let pixel_per_em = config.pixel_per_em();
    let pixel_per_design_unit = design.pixel_per_design_unit(pixel_per_em);
    let cap_height_px = design.cap_height * pixel_per_design_unit;

    // The pen sits at the center, on whole pixels.
    let surface_side = (config.raster_surface_scale * cap_height_px).max(0.0) as u32;
    let mut surface = RasterSurface::new(surface_side, surface_side);
    let pen = Pen::new((surface_side / 2) as i32, (surface_side / 2) as i32);

    let glyph_count = face.glyph_count();
    let layout = AtlasLayout::new(glyph_count, cap_height_px);
    let mut atlas = AtlasImage::new(layout);
    let mut metrics = vec![GlyphMetrics::default(); glyph_count as usize];
    let mut unrenderable_count = 0;

    for glyph_id in 0..glyph_count {
        let ink = match rasterizer.rasterize(glyph_id, pixel_per_em, pen, &mut surface) {
            Ok(ink) => ink,
            Err(e) => {
                debug!("{e}, glyph stays unrenderable");
                unrenderable_count += 1;
                // Failing rasterizers may leave partial output.
                surface.clear();
                continue;
            }
        };

        if !surface.contains(&ink) {
            return Err(BakeError::AtlasOverflow {
                glyph_id,
                ink,
                surface: surface.bounds(),
            }
            .into());
        }

        let (width, height) = copy_to_atlas(glyph_id, &ink, &surface, &mut atlas);
        surface.clear_box(&ink);

        let advance = face.design_advance(glyph_id) * pixel_per_design_unit;

        metrics[glyph_id as usize] = GlyphMetrics {
            offset_x: (ink.min.x - pen.x) as f32,
            offset_y: (ink.min.y - pen.y) as f32,
            advance: advance.ceil(),
            width: width as f32,
            height: height as f32,
            uv_width: width as f32 / layout.slice_width as f32,
            uv_height: height as f32 / layout.slice_height as f32,
        };
    }

    let baked = BakedGlyphs {
        pixel_per_em,
        metrics,
        atlas,
        unrenderable_count,
    };

    info!(
        "Baked {glyph_count} glyphs at {pixel_per_em}px/em ({} unrenderable) into {} slices of {}x{}",
        baked.unrenderable_count(),
        layout.slice_count,
        layout.slice_width,
        layout.slice_height
    );

    Ok(baked)
}

/// Copies the ink of a glyph from the surface into its atlas quadrant and returns the copied size.
///
/// Ink larger than a quadrant is clipped, neighboring quadrants are never written.
fn copy_to_atlas(
    glyph_id: GlyphId,
    ink: &InkBounds,
    surface: &RasterSurface,
    atlas: &mut AtlasImage,
) -> (u32, u32) {
    let layout = *atlas.layout();
    let slot = GlyphSlot::of(glyph_id);
    let origin = layout.slot_origin(slot);
    let (quadrant_width, quadrant_height) = layout.quadrant_size();

    let ink_width = ink.width() as u32;
    let ink_height = ink.height() as u32;
    let width = ink_width.min(quadrant_width);
    let height = ink_height.min(quadrant_height);
    if (width, height) != (ink_width, ink_height) {
        warn!(
            "Ink of glyph {glyph_id} ({ink_width}x{ink_height}) exceeds its atlas quadrant \
             ({quadrant_width}x{quadrant_height}), clipped"
        );
    }

    let left = ink.min.x as u32;
    let top = ink.min.y as u32;
    for y in 0..height {
        let source = surface.row(top + y, left..left + width);
        let target = atlas.row_mut(slot.slice, origin.x, origin.y + y, width);
        for (rgb, pixel) in target
            .chunks_exact_mut(AtlasImage::BYTES_PER_PIXEL)
            .zip(source)
        {
            rgb.copy_from_slice(&pixel[..3]);
        }
    }

    (width, height)
}
