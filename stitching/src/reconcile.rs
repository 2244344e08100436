//! Merging the horizontal and vertical position estimates of a tile.

use glam::IVec2;

/// A candidate position for a tile, with the match score that backs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Position in pixels relative to the first tile.
    pub position: IVec2,
    pub score: f64,
}

impl Estimate {
    pub fn new(position: IVec2, score: f64) -> Self {
        Self { position, score }
    }
}

/// Which rule produced the final position; reported in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No neighbour to compare with, or nothing but zero scores.
    IdealGrid,
    Horizontal,
    Vertical,
    Average,
}

/// Picks the final position of a tile.
///
/// - Both estimates above `good_match`: their average (truncated).
/// - Otherwise the estimate with the higher score, the horizontal one on a tie.
/// - The ideal grid position when there is no estimate or every score is 0.
pub fn reconcile(
    horizontal: Option<Estimate>,
    vertical: Option<Estimate>,
    ideal: IVec2,
    good_match: f64,
) -> (IVec2, Resolution) {
    match (horizontal, vertical) {
        (None, None) => (ideal, Resolution::IdealGrid),
        (Some(h), None) if h.score > 0.0 => (h.position, Resolution::Horizontal),
        (None, Some(v)) if v.score > 0.0 => (v.position, Resolution::Vertical),
        (Some(_), None) | (None, Some(_)) => (ideal, Resolution::IdealGrid),
        (Some(h), Some(v)) => {
            if h.score > good_match && v.score > good_match {
                let average = (h.position + v.position).as_dvec2() / 2.0;
                (average.as_ivec2(), Resolution::Average)
            } else if v.score > h.score {
                (v.position, Resolution::Vertical)
            } else if h.score == 0.0 && v.score == 0.0 {
                (ideal, Resolution::IdealGrid)
            } else {
                (h.position, Resolution::Horizontal)
            }
        }
    }
}
