use glam::IVec2;
use thiserror::Error;

/// Errors raised while assembling a mosaic.
///
/// `ShapeMismatch`, `Ordering`, `UnsupportedGrowth` and `SlotOccupied` are
/// caller contract violations and abort `add_tile`. `NoOverlap` only comes out
/// of the region-of-interest helpers; the registrar absorbs it as a zero match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StitchError {
    #[error("Tile shape differs from previous tile shapes: {found:?} != {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(
        "Trying to stitch tile at ({row}, {col}) while neither its top nor its left neighbour has been stitched yet"
    )]
    Ordering { row: usize, col: usize },

    #[error("Tile would land at ({row}, {col}); the grid only grows down and to the right")]
    UnsupportedGrowth { row: i64, col: i64 },

    #[error("Grid slot ({row}, {col}) already holds a tile")]
    SlotOccupied { row: usize, col: usize },

    #[error("There is no overlap between tiles for shift ({}, {})", .shift.x, .shift.y)]
    NoOverlap { shift: IVec2 },
}

pub type Result<T> = std::result::Result<T, StitchError>;
