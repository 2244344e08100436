use glam::DVec2;

use crate::error::Result;
use crate::registrar::{Registrar, TilePositions};
use crate::tile::Tile;

/// Returns positions as-is.
#[derive(Debug, Default)]
pub struct IdentityRegistrar {
    tile_positions: Vec<DVec2>,
    dependent_positions: Vec<Vec<DVec2>>,
}

impl IdentityRegistrar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Registrar for IdentityRegistrar {
    fn add_tile(&mut self, tile: Tile, dependents: &[Tile]) -> Result<()> {
        self.tile_positions.push(tile.position());
        self.dependent_positions
            .push(dependents.iter().map(Tile::position).collect());
        Ok(())
    }

    fn positions(&self) -> TilePositions {
        TilePositions {
            tiles: self.tile_positions.clone(),
            dependents: self.dependent_positions.clone(),
        }
    }
}
