//! Acquired tiles: pixels plus the stage metadata the registrars need.

use common::Buffer2;
use glam::DVec2;

/// One acquired image together with its declared physical placement.
///
/// Positions and pixel sizes are in meters; X grows to the right and Y grows
/// upwards (stage convention), while pixel rows grow downwards.
#[derive(Debug, Clone)]
pub struct Tile {
    pixels: Buffer2<f32>,
    /// Physical position of the tile, in meters.
    position: DVec2,
    /// Physical size of one pixel (X, Y), in meters per pixel.
    pixel_size: DVec2,
}

impl Tile {
    pub fn new(pixels: Buffer2<f32>, position: DVec2, pixel_size: DVec2) -> Self {
        assert!(
            pixel_size.x > 0.0 && pixel_size.y > 0.0,
            "pixel size must be positive, got {pixel_size}"
        );
        Self {
            pixels,
            position,
            pixel_size,
        }
    }

    /// A tile that only carries metadata, e.g. a dependent tile whose content
    /// is never looked at.
    pub fn placeholder(position: DVec2, pixel_size: DVec2) -> Self {
        Self::new(Buffer2::new(0, 0, Vec::new()), position, pixel_size)
    }

    #[inline]
    pub fn pixels(&self) -> &Buffer2<f32> {
        &self.pixels
    }

    #[inline]
    pub fn position(&self) -> DVec2 {
        self.position
    }

    #[inline]
    pub fn pixel_size(&self) -> DVec2 {
        self.pixel_size
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dimensions()
    }
}
