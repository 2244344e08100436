//! Correlation-based registrar.
//!
//! Each tile is placed into a grid slot next to its closest predecessor, then
//! its pixel position is estimated against the neighbour in the same row and
//! the neighbour above, and the two estimates are reconciled.
//!
//! Pixel positions are relative to the first tile, X to the right and Y down.


use std::cmp::Ordering;

use glam::{DVec2, IVec2};

use crate::config::StitchConfig;
use crate::error::{Result, StitchError};
use crate::estimator::ShiftEstimator;
use crate::grid::{Axis, Direction, GridCell, Slot, TileGrid};
use crate::overlap::{AxisOverlap, OverlapModel};
use crate::reconcile::{Estimate, Resolution, reconcile};
use crate::registrar::{Registrar, TilePositions};
use crate::tile::Tile;

/// Which same-row neighbour a horizontal estimate was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The neighbour sits on the left; the new tile is the second image.
    Left,
    /// The neighbour sits on the right; the new tile is the first image.
    Right,
}

/// Outcome of one `add_tile` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub slot: Slot,
    pub position: IVec2,
    pub horizontal: Option<Estimate>,
    pub vertical: Option<Estimate>,
    pub resolution: Resolution,
}

/// Shape and placement shared by every tile of the mosaic.
#[derive(Debug, Clone, Copy)]
struct Session {
    shape: (usize, usize),
    pixel_size: DVec2,
    /// Physical position of the first tile; pixel position (0, 0).
    origin: DVec2,
}

/// A correction measured against one neighbour.
#[derive(Debug, Clone, Copy)]
struct Measured {
    /// `observed shift = expected - correction`, in the first image's frame.
    correction: IVec2,
    score: f64,
}

/// Registers tiles by cross-correlating their overlaps with already placed
/// neighbours.
#[derive(Debug)]
pub struct ShiftRegistrar {
    config: StitchConfig,
    grid: TileGrid,
    estimator: ShiftEstimator,
    session: Option<Session>,
    overlap: OverlapModel,
    /// Last correction measured on each axis, whatever its score.
    last_horizontal: IVec2,
    last_vertical: IVec2,
    registrations: Vec<Registration>,
    /// Declared offset of each dependent tile from its main tile, in meters.
    dependent_offsets: Vec<Vec<DVec2>>,
}

impl ShiftRegistrar {
    /// # Panics
    /// If `config` does not validate.
    pub fn new(config: StitchConfig) -> Self {
        config.validate();
        let estimator = ShiftEstimator::new(config.correlation.clone(), config.extreme_shift);
        Self {
            config,
            grid: TileGrid::new(),
            estimator,
            session: None,
            overlap: OverlapModel::default(),
            last_horizontal: IVec2::ZERO,
            last_vertical: IVec2::ZERO,
            registrations: Vec::new(),
            dependent_offsets: Vec::new(),
        }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Per-tile registration details, in insertion order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    fn insert_first(&mut self, tile: Tile, dependents: &[Tile]) -> Result<()> {
        self.grid.check_insertable(Slot::ORIGIN)?;

        let session = Session {
            shape: tile.shape(),
            pixel_size: tile.pixel_size(),
            origin: tile.position(),
        };
        tracing::debug!(
            "First tile {}x{} px, pixel size {:?}, at {:?}",
            session.shape.0,
            session.shape.1,
            session.pixel_size,
            session.origin
        );

        let offsets = dependent_offsets(&tile, dependents);
        self.grid
            .insert(Slot::ORIGIN, GridCell::new(tile, IVec2::ZERO))?;
        self.dependent_offsets.push(offsets);
        self.session = Some(session);
        self.registrations.push(Registration {
            slot: Slot::ORIGIN,
            position: IVec2::ZERO,
            horizontal: None,
            vertical: None,
            resolution: Resolution::IdealGrid,
        });
        Ok(())
    }

    /// Finds the slot of a new tile without changing anything.
    fn locate(&self, tile: &Tile) -> Result<(Slot, Slot, Direction)> {
        let Some((reference, cell)) = self.grid.nearest(tile.position()) else {
            return Ok((Slot::ORIGIN, Slot::ORIGIN, Direction::Right));
        };
        let direction = Direction::from_displacement(tile.position() - cell.tile.position());
        let slot = direction.step(reference)?;
        self.grid.check_insertable(slot)?;
        Ok((reference, slot, direction))
    }

    fn update_overlap(&mut self, tile: &Tile, reference: Slot, direction: Direction) {
        let Some(cell) = self.grid.get(reference) else {
            return;
        };
        let displacement = tile.position() - cell.tile.position();
        let (width, height) = tile.shape();
        let axis = direction.axis();
        let overlap = match axis {
            Axis::Horizontal => {
                AxisOverlap::from_displacement(width, tile.pixel_size().x, displacement.x)
            }
            Axis::Vertical => {
                AxisOverlap::from_displacement(height, tile.pixel_size().y, displacement.y)
            }
        };
        tracing::debug!(
            "{:?} overlap {:.3} ({:.1} px), ideal shift {} px",
            axis,
            overlap.fraction,
            overlap.overlap_px,
            overlap.ideal_shift
        );
        self.overlap.update(axis, overlap);
    }

    fn horizontal_side(&self, slot: Slot, reference: Slot) -> Option<(Side, Slot)> {
        let left = (slot.col > 0)
            .then(|| Slot::new(slot.row, slot.col - 1))
            .filter(|&s| self.grid.is_filled(s))
            .map(|s| (Side::Left, s));
        let right = Some(Slot::new(slot.row, slot.col + 1))
            .filter(|&s| self.grid.is_filled(s))
            .map(|s| (Side::Right, s));

        match reference.col.cmp(&slot.col) {
            Ordering::Less => left,
            Ordering::Greater => right,
            Ordering::Equal => left.or(right),
        }
    }

    fn estimate_horizontal(
        &mut self,
        tile: &Tile,
        slot: Slot,
        reference: Slot,
    ) -> Option<(Estimate, Option<IVec2>)> {
        let (side, neighbour_slot) = self.horizontal_side(slot, reference)?;
        let neighbour = self.grid.get(neighbour_slot)?;
        let neighbour_pos = neighbour.position;

        let overlap = self.overlap.axis(Axis::Horizontal, tile.shape().0);
        let (first, second) = match side {
            Side::Left => (&neighbour.tile, tile),
            Side::Right => (tile, &neighbour.tile),
        };
        let pair = Pair {
            first,
            second,
            expected: IVec2::new(overlap.ideal_shift, 0),
            overlap,
        };

        let measured = pair.measure(&mut self.estimator);
        let Measured { correction, score } = if needs_fallback(&self.config, slot, measured) {
            let candidate = self
                .grid
                .mean_shift(slot, Axis::Horizontal)
                .unwrap_or(self.last_horizontal);
            pair.fallback(&mut self.estimator, candidate, measured)
        } else {
            measured
        };

        let observed = pair.expected - correction;
        let position = match side {
            Side::Left => neighbour_pos + observed,
            Side::Right => neighbour_pos - observed,
        };

        let wrong_side = match side {
            Side::Left => position.x < neighbour_pos.x,
            Side::Right => position.x > neighbour_pos.x,
        };
        if wrong_side {
            tracing::warn!(
                "Tile at {} registered on the wrong side of its {:?} neighbour ({} vs {})",
                slot,
                side,
                position.x,
                neighbour_pos.x
            );
        }

        tracing::debug!(
            "Horizontal estimate for {} against {:?} neighbour: correction ({}, {}), score {:.3}",
            slot,
            side,
            correction.x,
            correction.y,
            score
        );
        self.last_horizontal = correction;
        let history = (score >= self.config.best_match).then_some(correction);
        Some((Estimate::new(position, score), history))
    }

    fn estimate_vertical(&mut self, tile: &Tile, slot: Slot) -> Option<(Estimate, Option<IVec2>)> {
        let above = self.grid.get(Slot::new(slot.row.checked_sub(1)?, slot.col))?;
        let above_pos = above.position;

        let overlap = self.overlap.axis(Axis::Vertical, tile.shape().1);
        let pair = Pair {
            first: &above.tile,
            second: tile,
            expected: IVec2::new(0, overlap.ideal_shift),
            overlap,
        };

        let measured = pair.measure(&mut self.estimator);
        let Measured { correction, score } = if needs_fallback(&self.config, slot, measured) {
            let candidate = self
                .grid
                .mean_shift(slot, Axis::Vertical)
                .unwrap_or(self.last_vertical);
            pair.fallback(&mut self.estimator, candidate, measured)
        } else {
            measured
        };

        let position = above_pos + pair.expected - correction;
        if position.y < above_pos.y {
            tracing::warn!(
                "Tile at {} registered above its top neighbour ({} vs {})",
                slot,
                position.y,
                above_pos.y
            );
        }

        tracing::debug!(
            "Vertical estimate for {}: correction ({}, {}), score {:.3}",
            slot,
            correction.x,
            correction.y,
            score
        );
        self.last_vertical = correction;
        let history = (score >= self.config.best_match).then_some(correction);
        Some((Estimate::new(position, score), history))
    }

    /// Position on a perfectly regular grid with the current tile spacing.
    fn ideal_position(&self, slot: Slot, shape: (usize, usize)) -> IVec2 {
        let spacing = DVec2::new(
            self.overlap.axis(Axis::Horizontal, shape.0).spacing,
            self.overlap.axis(Axis::Vertical, shape.1).spacing,
        );
        (DVec2::new(slot.col as f64, slot.row as f64) * spacing)
            .round()
            .as_ivec2()
    }
}

/// Declared offsets of `dependents` from `tile`, in meters.
fn dependent_offsets(tile: &Tile, dependents: &[Tile]) -> Vec<DVec2> {
    dependents
        .iter()
        .map(|dep| dep.position() - tile.position())
        .collect()
}

/// The fallback only runs for a poor match once some history can exist.
fn needs_fallback(config: &StitchConfig, slot: Slot, measured: Measured) -> bool {
    measured.score < config.best_match && (slot.row > 1 || slot.col > 1)
}

/// Two tiles compared along one axis: `second` is expected at `expected` in
/// `first`'s pixel frame.
struct Pair<'a> {
    first: &'a Tile,
    second: &'a Tile,
    expected: IVec2,
    overlap: AxisOverlap,
}

impl Pair<'_> {
    fn score(&self, estimator: &ShiftEstimator, correction: IVec2) -> f64 {
        estimator.match_score(
            self.first,
            self.second,
            self.expected - correction,
            &self.overlap,
        )
    }

    /// Correlates around `expected`. A shift without overlap yields a zero
    /// correction.
    fn measure(&self, estimator: &mut ShiftEstimator) -> Measured {
        let correction = estimator
            .measure_shift(self.first, self.second, self.expected)
            .unwrap_or_else(|err| {
                tracing::debug!("Shift measurement skipped: {err}");
                IVec2::ZERO
            });
        Measured {
            correction,
            score: self.score(estimator, correction),
        }
    }

    /// Tries `candidate` (a correction from the history), then re-measures
    /// around it; keeps whichever scores best.
    fn fallback(
        &self,
        estimator: &mut ShiftEstimator,
        candidate: IVec2,
        measured: Measured,
    ) -> Measured {
        let mut best = measured;
        let score = self.score(estimator, candidate);
        if score > best.score {
            best = Measured {
                correction: candidate,
                score,
            };
        }

        if candidate != IVec2::ZERO {
            if let Ok(drift) =
                estimator.measure_shift(self.first, self.second, self.expected - candidate)
            {
                let refined = candidate + drift;
                let score = self.score(estimator, refined);
                if score > best.score {
                    best = Measured {
                        correction: refined,
                        score,
                    };
                }
            }
        }

        tracing::debug!(
            "Fallback candidate ({}, {}): score {:.3} -> {:.3}",
            candidate.x,
            candidate.y,
            measured.score,
            best.score
        );
        best
    }
}

impl Registrar for ShiftRegistrar {
    fn add_tile(&mut self, tile: Tile, dependents: &[Tile]) -> Result<()> {
        let Some(session) = self.session else {
            return self.insert_first(tile, dependents);
        };

        if tile.shape() != session.shape {
            return Err(StitchError::ShapeMismatch {
                expected: session.shape,
                found: tile.shape(),
            });
        }
        if tile.pixel_size() != session.pixel_size {
            tracing::warn!(
                "Tile pixel size {:?} differs from the mosaic's {:?}",
                tile.pixel_size(),
                session.pixel_size
            );
        }

        let (reference, slot, direction) = self.locate(&tile)?;
        tracing::debug!("Placing tile at {} ({:?} of {})", slot, direction, reference);

        self.update_overlap(&tile, reference, direction);

        let horizontal = self.estimate_horizontal(&tile, slot, reference);
        let vertical = self.estimate_vertical(&tile, slot);

        let ideal = self.ideal_position(slot, session.shape);
        let (position, resolution) = reconcile(
            horizontal.map(|(e, _)| e),
            vertical.map(|(e, _)| e),
            ideal,
            self.config.good_match,
        );
        tracing::debug!(
            "Tile at {} registered at ({}, {}) px via {:?}",
            slot,
            position.x,
            position.y,
            resolution
        );

        let offsets = dependent_offsets(&tile, dependents);
        let mut cell = GridCell::new(tile, position);
        cell.horizontal_shift = horizontal.and_then(|(_, history)| history);
        cell.vertical_shift = vertical.and_then(|(_, history)| history);
        self.grid.insert(slot, cell)?;
        self.dependent_offsets.push(offsets);

        self.registrations.push(Registration {
            slot,
            position,
            horizontal: horizontal.map(|(e, _)| e),
            vertical: vertical.map(|(e, _)| e),
            resolution,
        });
        Ok(())
    }

    fn positions(&self) -> TilePositions {
        let Some(session) = self.session else {
            return TilePositions::default();
        };

        let to_physical = |position: IVec2| {
            session.origin
                + DVec2::new(
                    position.x as f64 * session.pixel_size.x,
                    -(position.y as f64) * session.pixel_size.y,
                )
        };

        let tiles: Vec<DVec2> = self
            .registrations
            .iter()
            .map(|reg| to_physical(reg.position))
            .collect();
        let dependents = tiles
            .iter()
            .zip(&self.dependent_offsets)
            .map(|(main, offsets)| offsets.iter().map(|offset| *main + *offset).collect())
            .collect();

        TilePositions { tiles, dependents }
    }
}
