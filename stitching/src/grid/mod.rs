//! Grid topology: which slot each tile occupies and how the grid grows.
//!
//! The grid starts as a single empty slot and only ever grows down (new rows)
//! and to the right (new columns). Slot (0, 0) is the first tile added.


use glam::{DVec2, IVec2};

use crate::error::{Result, StitchError};
use crate::tile::Tile;

/// A grid cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub row: usize,
    pub col: usize,
}

impl Slot {
    pub const ORIGIN: Slot = Slot { row: 0, col: 0 };

    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Image axis a shift or overlap refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Where a new tile sits relative to its closest already placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Classify a physical displacement (new − reference, stage Y pointing up).
    ///
    /// The axis with the larger displacement wins; ties go to the horizontal axis.
    pub fn from_displacement(displacement: DVec2) -> Self {
        if displacement.y.abs() > displacement.x.abs() {
            if displacement.y < 0.0 {
                Direction::Down
            } else {
                Direction::Up
            }
        } else if displacement.x > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Left | Direction::Right => Axis::Horizontal,
        }
    }

    /// The neighbouring slot of `from` in this direction.
    pub fn step(self, from: Slot) -> Result<Slot> {
        let (row, col) = (from.row as i64, from.col as i64);
        let (row, col) = match self {
            Direction::Up => (row - 1, col),
            Direction::Down => (row + 1, col),
            Direction::Left => (row, col - 1),
            Direction::Right => (row, col + 1),
        };
        if row < 0 || col < 0 {
            return Err(StitchError::UnsupportedGrowth { row, col });
        }
        Ok(Slot::new(row as usize, col as usize))
    }
}

/// Everything the registrar keeps about a placed tile.
#[derive(Debug, Clone)]
pub struct GridCell {
    pub tile: Tile,
    /// Registered position in pixels, relative to the first tile. Y grows down.
    pub position: IVec2,
    /// Horizontal shift accepted with a best match against the row neighbour.
    pub horizontal_shift: Option<IVec2>,
    /// Vertical shift accepted with a best match against the tile above.
    pub vertical_shift: Option<IVec2>,
}

impl GridCell {
    pub fn new(tile: Tile, position: IVec2) -> Self {
        Self {
            tile,
            position,
            horizontal_shift: None,
            vertical_shift: None,
        }
    }

    fn shift(&self, axis: Axis) -> Option<IVec2> {
        match axis {
            Axis::Horizontal => self.horizontal_shift,
            Axis::Vertical => self.vertical_shift,
        }
    }
}

/// Growable grid of optional tile slots, stored row by row.
#[derive(Debug, Clone)]
pub struct TileGrid {
    rows: Vec<Vec<Option<GridCell>>>,
    cols: usize,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TileGrid {
    /// A 1x1 grid with an empty slot.
    pub fn new() -> Self {
        Self {
            rows: vec![vec![None]],
            cols: 1,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, slot: Slot) -> Option<&GridCell> {
        self.rows.get(slot.row)?.get(slot.col)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut GridCell> {
        self.rows.get_mut(slot.row)?.get_mut(slot.col)?.as_mut()
    }

    #[inline]
    pub fn is_filled(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Filled cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Slot, &GridCell)> {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, cell)| Some((Slot::new(row, col), cell.as_ref()?)))
        })
    }

    /// The placed tile whose declared position is closest to `position`.
    ///
    /// Scans row-major; on equal distances the first tile found wins.
    pub fn nearest(&self, position: DVec2) -> Option<(Slot, &GridCell)> {
        let mut best: Option<(Slot, &GridCell)> = None;
        let mut min_dist = f64::INFINITY;
        for (slot, cell) in self.cells() {
            let dist = position.distance(cell.tile.position());
            if dist < min_dist {
                min_dist = dist;
                best = Some((slot, cell));
            }
        }
        best
    }

    /// Checks that a tile may be placed at `slot`, which may lie past the
    /// current bounds.
    ///
    /// A slot needs its top or its left neighbour placed whenever it has both
    /// (i.e. it is neither on the first row nor on the first column).
    pub fn check_insertable(&self, slot: Slot) -> Result<()> {
        if self.is_filled(slot) {
            return Err(StitchError::SlotOccupied {
                row: slot.row,
                col: slot.col,
            });
        }

        let top_missing = slot.row >= 1 && !self.is_filled(Slot::new(slot.row - 1, slot.col));
        let left_missing = slot.col >= 1 && !self.is_filled(Slot::new(slot.row, slot.col - 1));
        if top_missing && left_missing {
            return Err(StitchError::Ordering {
                row: slot.row,
                col: slot.col,
            });
        }

        Ok(())
    }

    /// Stores `cell` at `slot`, growing the grid down/right as needed.
    pub fn insert(&mut self, slot: Slot, cell: GridCell) -> Result<()> {
        self.check_insertable(slot)?;
        self.grow_to(slot);
        self.rows[slot.row][slot.col] = Some(cell);
        Ok(())
    }

    fn grow_to(&mut self, slot: Slot) {
        while self.cols <= slot.col {
            for row in &mut self.rows {
                row.push(None);
            }
            self.cols += 1;
        }
        while self.rows.len() <= slot.row {
            let mut row = Vec::with_capacity(self.cols);
            row.resize_with(self.cols, || None);
            self.rows.push(row);
        }
    }

    /// Mean of the accepted shifts on `axis` along the row and the column of
    /// `slot`, excluding the first row/column and the slot itself.
    ///
    /// Components are truncated toward zero. `None` when there is no history.
    pub fn mean_shift(&self, slot: Slot, axis: Axis) -> Option<IVec2> {
        let along_row = (1..slot.col).filter_map(|col| self.get(Slot::new(slot.row, col)));
        let along_col = (1..slot.row).filter_map(|row| self.get(Slot::new(row, slot.col)));

        let (sum, count) = along_row
            .chain(along_col)
            .filter_map(|cell| cell.shift(axis))
            .fold((DVec2::ZERO, 0usize), |(sum, count), shift| {
                (sum + shift.as_dvec2(), count + 1)
            });

        if count == 0 {
            return None;
        }
        Some((sum / count as f64).as_ivec2())
    }
}
