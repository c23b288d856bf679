//! Baking configuration.
use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BakeConfig {
    pub point_size: f32,
    pub dpi: f32,
    /// Side length of the square raster surface in multiples of the device cap height.
    ///
    /// Must be large enough to hold the ink of every glyph.
    pub raster_surface_scale: f32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            point_size: 12.0,
            // Leave this at 96 unless the caller manages DPI itself.
            dpi: 96.0,
            raster_surface_scale: 8.0,
        }
    }
}

impl BakeConfig {
    pub fn new(point_size: f32, dpi: f32) -> Self {
        Self {
            point_size,
            dpi,
            ..Self::default()
        }
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml).context("Parsing bake configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path)
            .with_context(|| format!("Reading bake configuration {path:?}"))?;
        Self::from_toml_str(&toml).with_context(|| format!("In {path:?}"))
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("point_size", self.point_size),
            ("dpi", self.dpi),
            ("raster_surface_scale", self.raster_surface_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bail!("`{name}` must be a positive number, but is {value}");
            }
        }
        Ok(())
    }

    pub fn pixel_per_em(&self) -> f32 {
        self.point_size * (1.0 / 72.0) * self.dpi
    }
}
