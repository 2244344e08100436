//! The registrar contract shared by every strategy.

use glam::DVec2;

use crate::config::{RegistrarKind, StitchConfig};
use crate::error::Result;
use crate::identity::IdentityRegistrar;
use crate::shift_registrar::ShiftRegistrar;
use crate::tile::Tile;

/// Adjusted positions of a mosaic, in tile insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePositions {
    /// Physical position (meters) of each main tile.
    pub tiles: Vec<DVec2>,
    /// For each main tile, the positions of its dependent tiles in the order
    /// they were passed.
    pub dependents: Vec<Vec<DVec2>>,
}

impl TilePositions {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Computes the "best location" of each tile of a mosaic.
///
/// Tiles are fed one at a time; `positions` can be read at any point and only
/// reports what has been computed so far.
pub trait Registrar {
    /// Adds one tile to the mosaic.
    ///
    /// `dependents` are tiles rigidly attached to `tile` (e.g. other channels
    /// of the same acquisition); only their declared positions are used.
    fn add_tile(&mut self, tile: Tile, dependents: &[Tile]) -> Result<()>;

    fn positions(&self) -> TilePositions;
}

/// Builds the registrar selected by `config.registrar`.
pub fn create_registrar(config: &StitchConfig) -> Box<dyn Registrar> {
    match config.registrar {
        RegistrarKind::Identity => Box::new(IdentityRegistrar::new()),
        RegistrarKind::Shift => Box::new(ShiftRegistrar::new(config.clone())),
    }
}
