//! Stitching - incremental tile registration for overlapping mosaics.
//!
//! Tiles acquired on a stage (a microscope, typically) come with a declared
//! physical position that is only approximately right. This library computes
//! the "best location" of each tile:
//! - Grid placement of each tile next to its closest predecessor
//! - Shift measurement between overlapping neighbours (FFT phase correlation)
//! - Match scoring by normalized covariance, with history-based fallbacks
//! - Reconciliation of the horizontal and vertical estimates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stitching::{Registrar, StitchConfig, Tile, create_registrar};
//!
//! let mut registrar = create_registrar(&StitchConfig::default());
//! for (pixels, position, pixel_size) in acquisition {
//!     registrar.add_tile(Tile::new(pixels, position, pixel_size), &[])?;
//! }
//!
//! let positions = registrar.positions();
//! println!("Registered {} tiles", positions.len());
//! ```

mod config;
mod error;
pub mod estimator;
pub mod grid;
mod identity;
pub mod overlap;
pub mod phase_correlation;
mod reconcile;
mod registrar;
mod shift_registrar;
mod tile;

#[cfg(test)]
pub mod testing;

#[cfg(test)]
mod tests;

// ============================================================================
// Core types
// ============================================================================

pub use error::{Result, StitchError};
pub use tile::Tile;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{BEST_MATCH, EXTREME_SHIFT, GOOD_MATCH, RegistrarKind, StitchConfig};
pub use phase_correlation::PhaseCorrelationConfig;

// ============================================================================
// Registrars
// ============================================================================

pub use identity::IdentityRegistrar;
pub use reconcile::{Estimate, Resolution};
pub use registrar::{Registrar, TilePositions, create_registrar};
pub use shift_registrar::{Registration, ShiftRegistrar, Side};
