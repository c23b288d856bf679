use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use euclid::default::Box2D;
use swash::{
    CacheKey, FontRef,
    scale::{Render, ScaleContext, Source, image::Content},
    zeno::Format,
};
use log::{debug, warn};
use thiserror::Error;

use crate::{
    DesignMetrics, FontFace, GlyphId, GlyphRasterError, GlyphRasterizer, InkBounds, Pen,
    RasterSurface,
};

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Failed to read font file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No font face found in {0}")]
    NoFace(String),
}

/// A font face backed by `swash`.
pub struct SwashFace {
    data: Arc<[u8]>,
    offset: u32,
    key: CacheKey,
    /// Design units, never zero for faces with outlines.
    cap_height: f32,
}

impl fmt::Debug for SwashFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwashFace")
            .field("bytes", &self.data.len())
            .field("offset", &self.offset)
            .field("cap_height", &self.cap_height)
            .finish()
    }
}

impl SwashFace {
    /// Loads the first face of the font file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FontLoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| FontLoadError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_bytes(data, path.display().to_string())
    }

    pub fn from_bytes(
        data: impl Into<Arc<[u8]>>,
        name: impl Into<String>,
    ) -> Result<Self, FontLoadError> {
        let data = data.into();
        let font =
            FontRef::from_index(&data, 0).ok_or_else(|| FontLoadError::NoFace(name.into()))?;
        let (offset, key) = (font.offset, font.key);
        let cap_height = cap_height(font);
        Ok(Self {
            data,
            offset,
            key,
            cap_height,
        })
    }

    pub fn as_swash(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }
}

impl FontFace for SwashFace {
    fn glyph_count(&self) -> u16 {
        self.as_swash().metrics(&[]).glyph_count
    }

    fn design_metrics(&self) -> DesignMetrics {
        let metrics = self.as_swash().metrics(&[]);
        DesignMetrics {
            units_per_em: metrics.units_per_em,
            cap_height: self.cap_height,
        }
    }

    fn design_advance(&self, glyph_id: GlyphId) -> f32 {
        self.as_swash().glyph_metrics(&[]).advance_width(glyph_id)
    }

    fn glyph_id(&self, ch: char) -> GlyphId {
        self.as_swash().charmap().map(ch)
    }
}

/// The cap height in design units.
///
/// Faces with an OS/2 table older than version 2 report no cap height. For these, the outline
/// height of `H` is used, and the ascent if there is no `H`.
fn cap_height(font: FontRef<'_>) -> f32 {
    let metrics = font.metrics(&[]);
    if metrics.cap_height > 0.0 {
        return metrics.cap_height;
    }

    let glyph_id = font.charmap().map('H');
    let measured = (glyph_id != 0)
        .then(|| {
            let mut context = ScaleContext::new();
            // Size zero keeps the outline in design units.
            let mut scaler = context.builder(font).hint(false).build();
            scaler.scale_outline(glyph_id)
        })
        .flatten()
        .map(|outline| outline.bounds().height())
        .filter(|height| *height > 0.0);

    measured.unwrap_or_else(|| {
        debug!("Face has neither a cap height nor an outline for `H`, using the ascent");
        metrics.ascent
    })
}

/// Rasterizes glyphs of a [`SwashFace`] into subpixel coverage masks.
pub struct SwashRasterizer {
    face: Arc<SwashFace>,
    context: ScaleContext,
}

impl fmt::Debug for SwashRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwashRasterizer")
            .field("face", &self.face)
            .finish()
    }
}

impl SwashRasterizer {
    pub fn new(face: Arc<SwashFace>) -> Self {
        Self {
            face,
            context: ScaleContext::new(),
        }
    }
}

impl GlyphRasterizer for SwashRasterizer {
    fn rasterize(
        &mut self,
        glyph_id: GlyphId,
        pixel_per_em: f32,
        pen: Pen,
        surface: &mut RasterSurface,
    ) -> Result<InkBounds, GlyphRasterError> {
        let mut scaler = self
            .context
            .builder(self.face.as_swash())
            .size(pixel_per_em)
            .hint(false)
            .build();

        let image = Render::new(&[Source::Outline])
            .format(Format::Subpixel)
            .render(&mut scaler, glyph_id)
            .ok_or(GlyphRasterError { glyph_id })?;

        // Subpixel masks are RGBA, the alpha channel is not used.
        if !matches!(image.content, Content::SubpixelMask) {
            warn!("Unexpected image content {:?} for glyph {glyph_id}", image.content);
            return Err(GlyphRasterError { glyph_id });
        }

        let placement = image.placement;
        let left = pen.x + placement.left;
        // Placement top is measured upwards from the baseline.
        let top = pen.y - placement.top;
        let (width, height) = (placement.width as usize, placement.height as usize);

        // Empty glyphs (spaces) come back as zero sized images.
        if width > 0 {
            for (row, line) in image.data.chunks_exact(width * 4).take(height).enumerate() {
                for (column, rgba) in line.chunks_exact(4).enumerate() {
                    surface.put(
                        left + column as i32,
                        top + row as i32,
                        [rgba[0], rgba[1], rgba[2], 0],
                    );
                }
            }
        }

        Ok(Box2D::new(
            (left, top).into(),
            (left + width as i32, top + height as i32).into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Its OS/2 table is version 1 and carries no cap height.
    const DEJAVU_SANS_MONO: &[u8] = include_bytes!("../tests/data/DejaVuSansMono.ttf");

    fn face() -> Arc<SwashFace> {
        Arc::new(SwashFace::from_bytes(DEJAVU_SANS_MONO, "DejaVuSansMono").unwrap())
    }

    #[test]
    fn missing_cap_height_is_measured_from_h() {
        let face = face();
        assert_eq!(face.as_swash().metrics(&[]).cap_height, 0.0);

        let metrics = face.design_metrics();
        assert_eq!(metrics.units_per_em, 2048);
        assert_relative_eq!(metrics.cap_height, 1493.0, epsilon = 1.0);
    }

    #[test]
    fn maps_characters_and_advances() {
        let face = face();
        let h = face.glyph_id('H');
        assert_ne!(h, 0);
        assert_ne!(face.glyph_id('i'), h);
        // Monospaced.
        assert_relative_eq!(face.design_advance(h), 1233.0);
        assert_eq!(face.design_advance(h), face.design_advance(face.glyph_id('i')));
        assert!(face.glyph_count() > 3000);
    }

    #[test]
    fn rasterizes_h_above_the_pen() {
        let face = face();
        let mut rasterizer = SwashRasterizer::new(face.clone());
        let mut surface = RasterSurface::new(128, 128);
        let pen = Pen::new(64, 64);

        let ink = rasterizer
            .rasterize(face.glyph_id('H'), 16.0, pen, &mut surface)
            .unwrap();

        assert!(!ink.is_empty());
        assert!(surface.contains(&ink));
        // 1493 / 2048 * 16 = 11.7px
        assert!(ink.min.y <= pen.y - 11 && ink.min.y >= pen.y - 13, "{ink:?}");
        assert!(ink.max.y <= pen.y + 1, "{ink:?}");
        assert!(ink.min.x >= pen.x - 1 && ink.max.x <= pen.x + 12, "{ink:?}");

        let mut inked = 0;
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                let pixel = surface.pixel(x, y);
                assert_eq!(pixel[3], 0);
                if pixel != RasterSurface::BACKGROUND {
                    let p = (x as i32, y as i32);
                    assert!(ink.contains(p.into()), "{p:?} outside of {ink:?}");
                    inked += 1;
                }
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn space_has_no_ink() {
        let face = face();
        let mut rasterizer = SwashRasterizer::new(face.clone());
        let mut surface = RasterSurface::new(64, 64);

        let ink = rasterizer
            .rasterize(face.glyph_id(' '), 16.0, Pen::new(32, 32), &mut surface)
            .unwrap();

        assert!(ink.is_empty());
        assert!(surface.is_clear());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SwashFace::open("does/not/exist.ttf").unwrap_err();
        assert!(matches!(err, FontLoadError::Read { ref path, .. } if path.ends_with("exist.ttf")));
    }

    #[test]
    fn garbage_has_no_face() {
        let err = SwashFace::from_bytes(vec![0u8; 64], "garbage").unwrap_err();
        assert!(matches!(err, FontLoadError::NoFace(ref name) if name == "garbage"));
    }
}
