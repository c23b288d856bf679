//! Renders the subpixel test matrix into PNG files, one per background and foreground mode.
//!
//! ```text
//! cargo run --example offscreen -- <font file> [bake configuration .toml] [output directory]
//! ```
use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use cleartext_renderer::{
    BakeConfig, BakedFont, Color, DrawContext, RenderDevice, TextRenderer, bake_font_with_config,
};
use futures::channel::oneshot;
use log::info;

const TARGET_SIZE: (u32, u32) = (800, 600);
// Coverage is blended in linear space and encoded on store.
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const BYTES_PER_PIXEL: u32 = 4;

const SAMPLE_TEXT: &str = "Subpixel rasterizer testing";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(font_path) = args.next() else {
        bail!("Usage: offscreen <font file> [bake configuration] [output directory]");
    };
    let config = match args.next() {
        Some(path) => BakeConfig::load(path)?,
        None => BakeConfig::default(),
    };
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "offscreen".into()));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Creating output directory {output_dir:?}"))?;

    let RenderDevice { device, queue } = RenderDevice::headless().await?;
    let font = bake_font_with_config(&device, &queue, &font_path, &config)?;
    let layout = font.layout();
    info!(
        "{font_path}: {}px/em, {} atlas slices of {}x{}",
        font.pixel_per_em(),
        layout.slice_count,
        layout.slice_width,
        layout.slice_height
    );
    let renderer = TextRenderer::new(&device, TARGET_FORMAT);
    let target = OffscreenTarget::new(&device);

    for background in &BACKGROUNDS {
        for foreground in Foreground::ALL {
            let mut lines = vec![
                Line::new(background.label, 300.0, 60.0, background.pop),
                Line::new(foreground.label(), 550.0, 60.0, background.pop),
            ];
            lines.extend(foreground.lines());

            let pixels = target
                .render(&device, &queue, &renderer, &font, background.clear, &lines)
                .await?;

            let path = output_dir.join(format!("{}-{}.png", background.name, foreground.name()));
            image::save_buffer(
                &path,
                &pixels,
                TARGET_SIZE.0,
                TARGET_SIZE.1,
                image::ExtendedColorType::Rgba8,
            )
            .with_context(|| format!("Writing {path:?}"))?;
            info!("Wrote {path:?}");
        }
    }

    Ok(())
}

#[derive(Debug)]
struct Background {
    name: &'static str,
    label: &'static str,
    clear: Color,
    /// Color of the labels, contrasting with `clear`.
    pop: Color,
}

const BACKGROUNDS: [Background; 8] = [
    Background {
        name: "black",
        label: "Back = Black",
        clear: Color::BLACK,
        pop: Color::WHITE,
    },
    Background {
        name: "white",
        label: "Back = White",
        clear: Color::WHITE,
        pop: Color::BLACK,
    },
    Background {
        name: "red",
        label: "Back = (.5,0,0)",
        clear: Color::rgb(0.5, 0.0, 0.0),
        pop: Color::rgb(0.0, 0.5, 0.5),
    },
    Background {
        name: "green",
        label: "Back = (0,.5,0)",
        clear: Color::rgb(0.0, 0.5, 0.0),
        pop: Color::rgb(0.5, 0.0, 0.5),
    },
    Background {
        name: "blue",
        label: "Back = (0,0,.5)",
        clear: Color::rgb(0.0, 0.0, 0.5),
        pop: Color::rgb(0.5, 0.5, 0.0),
    },
    Background {
        name: "yellow",
        label: "Back = (.5,.5,0)",
        clear: Color::rgb(0.5, 0.5, 0.0),
        pop: Color::rgb(0.0, 0.0, 0.5),
    },
    Background {
        name: "cyan",
        label: "Back = (0,.5,.5)",
        clear: Color::rgb(0.0, 0.5, 0.5),
        pop: Color::rgb(0.5, 0.0, 0.0),
    },
    Background {
        name: "purple",
        label: "Back = (.5,0,.5)",
        clear: Color::rgb(0.5, 0.0, 0.5),
        pop: Color::rgb(0.0, 0.5, 0.0),
    },
];

#[derive(Debug, Copy, Clone)]
enum Foreground {
    Gray,
    Rgb,
    Ycp,
    AlphaGray,
    AlphaRgb,
    AlphaYcp,
}

impl Foreground {
    const ALL: [Self; 6] = [
        Self::Gray,
        Self::Rgb,
        Self::Ycp,
        Self::AlphaGray,
        Self::AlphaRgb,
        Self::AlphaYcp,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Rgb => "rgb",
            Self::Ycp => "ycp",
            Self::AlphaGray => "alpha-gray",
            Self::AlphaRgb => "alpha-rgb",
            Self::AlphaYcp => "alpha-ycp",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Gray => "Fore = Grays",
            Self::Rgb => "Fore = Red Green Blue",
            Self::Ycp => "Fore = Yellow Cyan Purple",
            Self::AlphaGray => "Fore = Alpha Black and White",
            Self::AlphaRgb => "Fore = Alpha Red Green Blue",
            Self::AlphaYcp => "Fore = Alpha Yellow Cyan Purple",
        }
    }

    fn lines(self) -> Vec<Line> {
        // Row j of 1..=6 sits at j * 80 + 40, with the level (j - 1) / 5.
        let rows = || (1..=6).map(|j| (j as f32 * 80.0 + 40.0, (j - 1) as f32 / 5.0));
        let columns = |y: f32, colors: [Color; 3]| {
            (0..3).map(move |i| Line::new(SAMPLE_TEXT, 50.0 + 250.0 * i as f32, y, colors[i]))
        };

        match self {
            Self::Gray => rows()
                .map(|(y, v)| Line::new(SAMPLE_TEXT, 50.0, y, Color::rgb(v, v, v)))
                .collect(),
            Self::Rgb => columns(120.0, primaries(1.0)).collect(),
            Self::Ycp => columns(120.0, secondaries(1.0)).collect(),
            Self::AlphaGray => rows()
                .flat_map(|(y, a)| {
                    [
                        Line::new(SAMPLE_TEXT, 50.0, y, Color::WHITE.with_alpha(a)),
                        Line::new(SAMPLE_TEXT, 300.0, y, Color::BLACK.with_alpha(a)),
                    ]
                })
                .collect(),
            Self::AlphaRgb => rows()
                .flat_map(|(y, a)| columns(y, primaries(a)))
                .collect(),
            Self::AlphaYcp => rows()
                .flat_map(|(y, a)| columns(y, secondaries(a)))
                .collect(),
        }
    }
}

/// Half intensity red, green, and blue.
fn primaries(alpha: f32) -> [Color; 3] {
    [
        Color::new(0.5, 0.0, 0.0, alpha),
        Color::new(0.0, 0.5, 0.0, alpha),
        Color::new(0.0, 0.0, 0.5, alpha),
    ]
}

/// Half intensity yellow, cyan, and purple.
fn secondaries(alpha: f32) -> [Color; 3] {
    [
        Color::new(0.5, 0.5, 0.0, alpha),
        Color::new(0.0, 0.5, 0.5, alpha),
        Color::new(0.5, 0.0, 0.5, alpha),
    ]
}

#[derive(Debug)]
struct Line {
    text: &'static str,
    x: f32,
    y: f32,
    color: Color,
}

impl Line {
    fn new(text: &'static str, x: f32, y: f32, color: Color) -> Self {
        Self { text, x, y, color }
    }
}

struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

impl OffscreenTarget {
    fn new(device: &wgpu::Device) -> Self {
        let (width, height) = TARGET_SIZE;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_bytes_per_row = (width * BYTES_PER_PIXEL)
            .next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Offscreen Readback Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            texture,
            view,
            readback,
            padded_bytes_per_row,
        }
    }

    /// Clears the target, draws all `lines` and reads the pixels back.
    async fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        renderer: &TextRenderer,
        font: &BakedFont,
        clear: Color,
        lines: &[Line],
    ) -> Result<Vec<u8>> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Offscreen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut context = DrawContext {
                device,
                pass,
                target_size: TARGET_SIZE,
            };

            for line in lines {
                renderer.draw_string(&mut context, font, line.text, line.x, line.y, line.color);
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(TARGET_SIZE.1),
                },
            },
            extent(),
        );

        queue.submit([encoder.finish()]);

        let slice = self.readback.slice(..);
        let (sender, receiver) = oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .context("Waiting for the readback")?;
        receiver
            .await
            .context("Readback mapping dropped")?
            .context("Mapping the readback buffer")?;

        let row_bytes = (TARGET_SIZE.0 * BYTES_PER_PIXEL) as usize;
        let pixels = {
            let data = slice.get_mapped_range();
            data.chunks_exact(self.padded_bytes_per_row as usize)
                .flat_map(|row| &row[..row_bytes])
                .copied()
                .collect()
        };
        self.readback.unmap();

        Ok(pixels)
    }
}

fn extent() -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: TARGET_SIZE.0,
        height: TARGET_SIZE.1,
        depth_or_array_layers: 1,
    }
}
