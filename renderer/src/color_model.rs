//! Maps quantized subpixel coverage to blend factors for a specific text color.
//!
//! The atlas stores three coverage samples per pixel that do not depend on the text color. At draw
//! time, each sample is quantized to one of 7 levels and looked up in a [`ColorModelTable`]
//! computed for the requested color. Tables interpolate between two calibrated curves, one for dark
//! and one for bright text, based on a weighted luminance of the color.
use crate::Color;

/// The number of coverage levels.
pub const LEVELS: usize = 7;

/// Factors for dark text.
const C_MAX: [f32; LEVELS] = [
    0.0,
    0.380392157,
    0.600000000,
    0.749019608,
    0.854901961,
    0.937254902,
    1.0,
];

/// Factors for bright text, linear.
const C_MIN: [f32; LEVELS] = [
    0.0,
    0.166666667,
    0.333333333,
    0.500000000,
    0.666666667,
    0.833333333,
    1.0,
];

/// Weighted luminance at which text is considered dark (214/255).
const A: f32 = 0.839215686374509;
/// Weighted luminance at which text is considered bright (323/255).
const B: f32 = 1.266666666666667;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorModelTable(pub [f32; LEVELS]);

impl ColorModelTable {
    pub fn compute(r: f32, g: f32, b: f32, a: f32) -> Self {
        let v = 0.5 * r + g + 0.1875 * b;
        let l = (v - A) / (B - A);

        let mut m = [0.0; LEVELS];
        for i in 1..LEVELS - 1 {
            let (c_max, c_min) = (C_MAX[i], C_MIN[i]);
            m[i] = (c_max + (c_min - c_max) * l).clamp(c_min, c_max) * a;
        }
        m[LEVELS - 1] = a;

        Self(m)
    }

    pub fn for_color(color: Color) -> Self {
        Self::compute(color.red, color.green, color.blue, color.alpha)
    }

    pub fn values(&self) -> &[f32; LEVELS] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use itertools::Itertools;

    use super::*;

    fn grays_and_primaries() -> Vec<(f32, f32, f32)> {
        let mut colors: Vec<_> = (0..=5)
            .map(|i| i as f32 / 5.0)
            .map(|v| (v, v, v))
            .collect();
        colors.extend([
            (0.5, 0.0, 0.0),
            (0.0, 0.5, 0.0),
            (0.0, 0.0, 0.5),
            (0.5, 0.5, 0.0),
            (0.0, 0.5, 0.5),
            (0.5, 0.0, 0.5),
            (1.0, 0.0, 0.0),
            (0.0, 0.0, 1.0),
        ]);
        colors
    }

    #[test]
    fn is_pure() {
        for (r, g, b) in grays_and_primaries() {
            assert_eq!(
                ColorModelTable::compute(r, g, b, 0.7),
                ColorModelTable::compute(r, g, b, 0.7)
            );
        }
    }

    #[test]
    fn is_non_decreasing() {
        for (r, g, b) in grays_and_primaries() {
            for a in [0.0, 0.2, 0.6, 1.0] {
                let table = ColorModelTable::compute(r, g, b, a);
                assert!(
                    table.values().iter().tuple_windows().all(|(l, r)| l <= r),
                    "{table:?} for {:?}",
                    (r, g, b, a)
                );
            }
        }
    }

    #[test]
    fn endpoints_are_zero_and_alpha() {
        let table = ColorModelTable::compute(0.3, 0.4, 0.5, 0.6);
        assert_eq!(table.0[0], 0.0);
        assert_eq!(table.0[6], 0.6);
    }

    #[test]
    fn white_text_uses_the_bright_curve() {
        // V = 1.6875 > B
        let table = ColorModelTable::compute(1.0, 1.0, 1.0, 1.0);
        for i in 0..LEVELS {
            assert_relative_eq!(table.0[i], C_MIN[i]);
        }
    }

    #[test]
    fn black_text_uses_the_dark_curve() {
        let table = ColorModelTable::compute(0.0, 0.0, 0.0, 1.0);
        for i in 0..LEVELS {
            assert_relative_eq!(table.0[i], C_MAX[i]);
        }
    }

    #[test]
    fn interpolates_between_the_curves() {
        // V halfway between A and B.
        let v = (A + B) / 2.0;
        let table = ColorModelTable::compute(0.0, v, 0.0, 1.0);
        for i in 1..LEVELS - 1 {
            assert_relative_eq!(table.0[i], (C_MAX[i] + C_MIN[i]) / 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn alpha_scales_the_inner_levels() {
        let opaque = ColorModelTable::compute(0.0, 0.9, 0.0, 1.0);
        let translucent = ColorModelTable::compute(0.0, 0.9, 0.0, 0.5);
        for i in 1..LEVELS {
            assert_relative_eq!(translucent.0[i], opaque.0[i] * 0.5);
        }
    }

    #[test]
    fn for_color_forwards_the_components() {
        let color = Color::new(0.5, 0.0, 0.5, 0.8);
        assert_eq!(
            ColorModelTable::for_color(color),
            ColorModelTable::compute(0.5, 0.0, 0.5, 0.8)
        );
    }
}
