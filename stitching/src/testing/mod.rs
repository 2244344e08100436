//! Synthetic mosaics for tests.

use common::Buffer2;
use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tile::Tile;

pub use common::log_setup::init_test_logging;

/// Pixel size shared by the synthetic tiles, in meters.
pub const PIXEL_SIZE: f64 = 1e-6;

/// Uniform noise in `[0, 1)`.
pub fn noise(width: usize, height: usize, seed: u64) -> Buffer2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Buffer2::from_fn(width, height, |_, _| rng.random::<f32>())
}

/// A large textured sample that tiles are cut from, so that neighbouring tiles
/// share pixel-identical content where they overlap.
#[derive(Debug, Clone)]
pub struct Scene {
    field: Buffer2<f32>,
}

impl Scene {
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        let raw = noise(width, height, seed);
        // Light 3x3 box blur: still random, but with some spatial structure.
        let field = Buffer2::from_fn(width, height, |x, y| {
            let mut sum = 0.0;
            let mut count = 0.0;
            for yy in y.saturating_sub(1)..(y + 2).min(height) {
                for xx in x.saturating_sub(1)..(x + 2).min(width) {
                    sum += raw[(xx, yy)];
                    count += 1.0;
                }
            }
            sum / count
        });
        Self { field }
    }

    /// Tile whose top-left pixel is scene pixel `(x, y)`, declared at
    /// `declared` pixels (X right, Y down) from the scene origin.
    pub fn tile_declared_at(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        declared: DVec2,
    ) -> Tile {
        Tile::new(
            self.field.crop(x, y, x + width, y + height),
            physical_position(declared),
            DVec2::splat(PIXEL_SIZE),
        )
    }

    /// Tile cut at scene pixel `(x, y)` and declared exactly there.
    pub fn tile(&self, x: usize, y: usize, width: usize, height: usize) -> Tile {
        self.tile_declared_at(x, y, width, height, DVec2::new(x as f64, y as f64))
    }
}

/// Stage position of a pixel offset (X right, Y down) from the origin.
pub fn physical_position(pixels: DVec2) -> DVec2 {
    DVec2::new(pixels.x, -pixels.y) * PIXEL_SIZE
}

/// Tile of fresh noise declared at `declared` pixels from the origin.
pub fn noise_tile(width: usize, height: usize, declared: DVec2, seed: u64) -> Tile {
    Tile::new(
        noise(width, height, seed),
        physical_position(declared),
        DVec2::splat(PIXEL_SIZE),
    )
}
