use std::ops::Range;

use derive_more::Debug;
use euclid::default::Box2D;

use crate::InkBounds;

/// A 4 byte per pixel surface glyphs are rendered onto before they are copied into an atlas.
///
/// Channels 0, 1, and 2 hold independent coverage samples, channel 3 is unused. The background is
/// all zeroes.
#[derive(Debug)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    #[debug(skip)]
    pixels: Vec<[u8; 4]>,
}

impl RasterSurface {
    pub const BACKGROUND: [u8; 4] = [0, 0, 0, 0];

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Self::BACKGROUND; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> InkBounds {
        Box2D::new(
            (0, 0).into(),
            (self.width as i32, self.height as i32).into(),
        )
    }

    /// `true` if `ink` is well formed and lies completely inside the surface.
    pub fn contains(&self, ink: &InkBounds) -> bool {
        0 <= ink.min.x
            && ink.min.x <= ink.max.x
            && ink.max.x <= self.width as i32
            && 0 <= ink.min.y
            && ink.min.y <= ink.max.y
            && ink.max.y <= self.height as i32
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[self.index(x, y)]
    }

    /// Sets a pixel, ignoring coordinates outside of the surface.
    pub fn put(&mut self, x: i32, y: i32, pixel: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = self.index(x as u32, y as u32);
        self.pixels[i] = pixel;
    }

    pub fn row(&self, y: u32, columns: Range<u32>) -> &[[u8; 4]] {
        debug_assert!(columns.end <= self.width);
        let start = self.index(columns.start, y);
        &self.pixels[start..start + columns.len()]
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Self::BACKGROUND);
    }

    /// Clears the part of `ink` that overlaps the surface.
    pub fn clear_box(&mut self, ink: &InkBounds) {
        let Some(ink) = ink.intersection(&self.bounds()) else {
            return;
        };

        for y in ink.min.y..ink.max.y {
            let start = self.index(ink.min.x as u32, y as u32);
            let end = start + (ink.max.x - ink.min.x) as usize;
            self.pixels[start..end].fill(Self::BACKGROUND);
        }
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|p| *p == Self::BACKGROUND)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x <= self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use euclid::default::Box2D;

    use super::RasterSurface;

    #[test]
    fn put_ignores_pixels_outside() {
        let mut surface = RasterSurface::new(4, 4);
        surface.put(-1, 0, [1, 2, 3, 0]);
        surface.put(0, 4, [1, 2, 3, 0]);
        surface.put(4, 3, [1, 2, 3, 0]);
        assert!(surface.is_clear());

        surface.put(3, 3, [1, 2, 3, 0]);
        assert_eq!(surface.pixel(3, 3), [1, 2, 3, 0]);
    }

    #[test]
    fn clear_box_clears_only_the_box() {
        let mut surface = RasterSurface::new(8, 8);
        surface.put(1, 1, [255, 0, 0, 0]);
        surface.put(6, 6, [0, 255, 0, 0]);

        surface.clear_box(&Box2D::new((0, 0).into(), (3, 3).into()));

        assert_eq!(surface.pixel(1, 1), RasterSurface::BACKGROUND);
        assert_eq!(surface.pixel(6, 6), [0, 255, 0, 0]);
    }

    #[test]
    fn clear_box_clips_to_the_surface() {
        let mut surface = RasterSurface::new(4, 4);
        surface.put(3, 3, [9, 9, 9, 0]);
        surface.clear_box(&Box2D::new((2, 2).into(), (10, 10).into()));
        assert!(surface.is_clear());
    }

    #[test]
    fn contains_checks_all_edges() {
        let surface = RasterSurface::new(16, 8);
        assert!(surface.contains(&surface.bounds()));
        assert!(surface.contains(&Box2D::new((5, 5).into(), (5, 5).into())));
        assert!(!surface.contains(&Box2D::new((-1, 0).into(), (4, 4).into())));
        assert!(!surface.contains(&Box2D::new((0, -1).into(), (4, 4).into())));
        assert!(!surface.contains(&Box2D::new((0, 0).into(), (17, 4).into())));
        assert!(!surface.contains(&Box2D::new((0, 0).into(), (4, 9).into())));
        // Inverted
        assert!(!surface.contains(&Box2D::new((4, 0).into(), (2, 4).into())));
    }

    #[test]
    fn row_returns_the_requested_columns() {
        let mut surface = RasterSurface::new(4, 2);
        surface.put(1, 1, [1, 0, 0, 0]);
        surface.put(2, 1, [2, 0, 0, 0]);
        assert_eq!(surface.row(1, 1..3), &[[1, 0, 0, 0], [2, 0, 0, 0]]);
    }
}
