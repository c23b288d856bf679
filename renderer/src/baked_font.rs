use std::{path::Path, sync::Arc};

use anyhow::Result;
use cleartext_font::{FontFace, SwashFace, SwashRasterizer};
use derive_more::Debug;
use log::info;
use tracing::instrument;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::{
    BakeConfig, BakeError,
    atlas_layout::AtlasLayout,
    glyph_baker::{AtlasImage, BakedGlyphs, GlyphMetrics, bake_glyphs},
    pods::Vertex,
    text_batch,
};

pub const ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A font with all its glyphs baked into a GPU texture array.
///
/// Immutable once created. Dropping it releases the texture.
#[derive(Debug)]
pub struct BakedFont {
    face: Arc<dyn FontFace>,
    pixel_per_em: f32,
    layout: AtlasLayout,
    #[debug(skip)]
    metrics: Vec<GlyphMetrics>,
    #[debug(skip)]
    view: wgpu::TextureView,
}

impl BakedFont {
    /// Uploads the atlas of `baked` and takes ownership of its metrics.
    #[instrument(skip_all)]
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        face: Arc<dyn FontFace>,
        baked: BakedGlyphs,
    ) -> Result<Self> {
        let layout = *baked.layout();
        check_limits(&device.limits(), &layout)?;

        let view = create_atlas_view(device, queue, &baked.atlas);

        info!(
            "Uploaded atlas: {} layers of {}x{}",
            layout.slice_count, layout.slice_width, layout.slice_height
        );

        Ok(Self {
            face,
            pixel_per_em: baked.pixel_per_em,
            layout,
            metrics: baked.metrics,
            view,
        })
    }

    pub fn pixel_per_em(&self) -> f32 {
        self.pixel_per_em
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The vertices of `text` with its first pen position at `(x, y)`.
    pub fn batch(&self, text: &str, x: f32, y: f32) -> Vec<Vertex> {
        text_batch::build_batch(&*self.face, &self.metrics, text, x, y)
    }
}

/// Opens the font file at `path`, bakes all its glyphs for `point_size` at `dpi`, and uploads the
/// atlas.
pub fn bake_font(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: impl AsRef<Path>,
    point_size: f32,
    dpi: f32,
) -> Result<BakedFont> {
    bake_font_with_config(device, queue, path, &BakeConfig::new(point_size, dpi))
}

#[instrument(skip(device, queue, path), fields(path = %path.as_ref().display()))]
pub fn bake_font_with_config(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: impl AsRef<Path>,
    config: &BakeConfig,
) -> Result<BakedFont> {
    let face = Arc::new(SwashFace::open(path.as_ref())?);
    let mut rasterizer = SwashRasterizer::new(face.clone());
    let baked = bake_glyphs(&*face, &mut rasterizer, config)?;
    BakedFont::upload(device, queue, face, baked)
}

fn check_limits(limits: &wgpu::Limits, layout: &AtlasLayout) -> Result<(), BakeError> {
    if layout.slice_count > limits.max_texture_array_layers {
        return Err(BakeError::Gpu(format!(
            "{} atlas slices exceed the maximum of {} texture array layers",
            layout.slice_count, limits.max_texture_array_layers
        )));
    }

    let max_dimension = limits.max_texture_dimension_2d;
    if layout.slice_width > max_dimension || layout.slice_height > max_dimension {
        return Err(BakeError::Gpu(format!(
            "Atlas slices of {}x{} exceed the maximum texture dimension {max_dimension}",
            layout.slice_width, layout.slice_height
        )));
    }

    Ok(())
}

fn create_atlas_view(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    atlas: &AtlasImage,
) -> wgpu::TextureView {
    let layout = atlas.layout();
    // An empty atlas is never sampled, but the bind group needs a texture.
    let layers = layout.slice_count.max(1);
    let mut data = atlas.to_rgba();
    data.resize(layers as usize * layout.slice_pixels() * 4, 0);

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("Glyph Atlas"),
            size: wgpu::Extent3d {
                width: layout.slice_width,
                height: layout.slice_height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ATLAS_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &data,
    );

    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Glyph Atlas View"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(slice_count: u32) -> AtlasLayout {
        AtlasLayout {
            slice_width: 64,
            slice_height: 256,
            slice_count,
        }
    }

    #[test]
    fn slice_count_within_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert!(check_limits(&limits, &layout(limits.max_texture_array_layers)).is_ok());
    }

    #[test]
    fn too_many_slices_are_a_gpu_error() {
        let limits = wgpu::Limits::downlevel_defaults();
        let err = check_limits(&limits, &layout(limits.max_texture_array_layers + 1)).unwrap_err();
        assert!(matches!(err, BakeError::Gpu(_)));
    }

    #[test]
    fn oversized_slices_are_a_gpu_error() {
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        let layout = AtlasLayout {
            slice_width: limits.max_texture_dimension_2d * 2,
            slice_height: 256,
            slice_count: 1,
        };
        assert!(matches!(
            check_limits(&limits, &layout),
            Err(BakeError::Gpu(_))
        ));
    }
}
