//! Example: register a synthetic drifting mosaic with both strategies
//!
//! Cuts a 3x4 mosaic out of a random texture. The stage "drifts" a little at
//! every move, so the declared positions are slightly wrong. Both registrars
//! are run on the same tiles and their error against the true positions is
//! logged.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example synthetic_mosaic
//! # keep a daily log file as well
//! STITCHING_LOG_DIR=logs cargo run --example synthetic_mosaic
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use common::Buffer2;
use common::log_setup::{LogConfig, setup_logging};
use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stitching::{Registrar, RegistrarKind, StitchConfig, Tile, create_registrar};

const ROWS: usize = 3;
const COLS: usize = 4;
const TILE: usize = 256;
const STEP: usize = 205;
const PIXEL_SIZE: f64 = 1e-7;
const MARGIN: usize = 16;

fn main() -> Result<()> {
    setup_logging(&LogConfig {
        directory: env::var_os("STITCHING_LOG_DIR").map(PathBuf::from),
        ..Default::default()
    });

    let mut rng = StdRng::seed_from_u64(2024);
    let width = 2 * MARGIN + (COLS - 1) * STEP + TILE;
    let height = 2 * MARGIN + (ROWS - 1) * STEP + TILE;
    let raw = Buffer2::from_fn(width, height, |_, _| rng.random::<f32>());
    let texture = Buffer2::from_fn(width, height, |x, y| {
        let (x1, y1) = ((x + 1).min(width - 1), (y + 1).min(height - 1));
        (raw[(x, y)] + raw[(x1, y)] + raw[(x, y1)] + raw[(x1, y1)]) / 4.0
    });

    // True corners follow the declared grid plus a random walk of the stage.
    let mut drift = (0i64, 0i64);
    let mut truth = Vec::new();
    let mut tiles = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            drift.0 = (drift.0 + rng.random_range(-2..=2)).clamp(-8, 8);
            drift.1 = (drift.1 + rng.random_range(-2..=2)).clamp(-8, 8);
            let x = ((MARGIN + col * STEP) as i64 + drift.0) as usize;
            let y = ((MARGIN + row * STEP) as i64 + drift.1) as usize;

            let declared = DVec2::new((col * STEP) as f64, -((row * STEP) as f64)) * PIXEL_SIZE;
            tiles.push(Tile::new(
                texture.crop(x, y, x + TILE, y + TILE),
                declared,
                DVec2::splat(PIXEL_SIZE),
            ));
            truth.push(DVec2::new(x as f64, y as f64));
        }
    }
    tracing::info!(
        tiles = tiles.len(),
        tile_size = TILE,
        "Synthetic mosaic generated"
    );

    for kind in [RegistrarKind::Identity, RegistrarKind::Shift] {
        let start = Instant::now();
        let mut registrar = create_registrar(&StitchConfig {
            registrar: kind,
            ..Default::default()
        });
        for tile in &tiles {
            registrar.add_tile(tile.clone(), &[])?;
        }
        let positions = registrar.positions();
        let elapsed = start.elapsed();

        let origin = positions.tiles[0];
        let max_error = positions
            .tiles
            .iter()
            .zip(&truth)
            .map(|(&p, &t)| {
                let offset = (p - origin) / PIXEL_SIZE;
                let registered = DVec2::new(offset.x, -offset.y);
                (registered - (t - truth[0])).abs().max_element()
            })
            .fold(0.0, f64::max);

        tracing::info!(
            registrar = ?kind,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            max_error_px = max_error,
            "Registration finished"
        );
        for (i, position) in positions.tiles.iter().enumerate() {
            tracing::debug!(
                "Tile {} ({}, {}): {:.3} x {:.3} um",
                i,
                i / COLS,
                i % COLS,
                position.x * 1e6,
                position.y * 1e6
            );
        }
    }

    Ok(())
}
