mod atlas_layout;
mod baked_font;
mod color;
pub mod color_model;
mod config;
mod error;
mod glyph_baker;
pub mod pods;
mod render_device;
pub mod text_batch;
mod text_renderer;

pub use atlas_layout::{AtlasLayout, GlyphSlot};
pub use baked_font::*;
pub use color::Color;
pub use config::BakeConfig;
pub use error::BakeError;
pub use glyph_baker::{AtlasImage, BakedGlyphs, GlyphMetrics, bake_glyphs};
pub use render_device::RenderDevice;
pub use text_renderer::*;

pub use cleartext_font as font;
