//! Pairwise shift estimation between two overlapping tiles.
//!
//! A shift `s` between a first tile `A` and a second tile `B` means that pixel
//! `p` of `B` shows the same thing as pixel `p + s` of `A`: for a right-hand
//! neighbour `s` is close to `(ideal_shift, 0)`, for the tile below close to
//! `(0, ideal_shift)`.

#[cfg(test)]
mod tests;

use common::Buffer2;
use glam::IVec2;

use crate::error::{Result, StitchError};
use crate::overlap::AxisOverlap;
use crate::phase_correlation::{PhaseCorrelationConfig, PhaseCorrelator};
use crate::tile::Tile;

/// Pixel rectangle `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Roi {
    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn crop(&self, image: &Buffer2<f32>) -> Buffer2<f32> {
        image.crop(self.left, self.top, self.right, self.bottom)
    }

    /// Row slices of `image` covered by this rectangle.
    fn rows<'a>(&self, image: &'a Buffer2<f32>) -> impl Iterator<Item = &'a [f32]> {
        let (left, right) = (self.left, self.right);
        (self.top..self.bottom).map(move |y| &image.row(y)[left..right])
    }
}

/// The overlapping rectangles of two `(width, height)` tiles when the second is
/// placed at `shift` in the first one's pixel frame.
///
/// Returns `(roi in first, roi in second)`, both clipped to the tile bounds.
pub fn estimate_roi(shape: (usize, usize), shift: IVec2) -> Result<(Roi, Roi)> {
    let (width, height) = (shape.0 as i64, shape.1 as i64);
    let (sx, sy) = (shift.x as i64, shift.y as i64);

    if sx.abs() >= width || sy.abs() >= height {
        return Err(StitchError::NoOverlap { shift });
    }

    let clip = |value: i64, max: i64| value.clamp(0, max) as usize;

    let first = Roi {
        left: clip(sx, width),
        top: clip(sy, height),
        right: clip(sx + width, width),
        bottom: clip(sy + height, height),
    };
    let second = Roi {
        left: clip(-sx, width),
        top: clip(-sy, height),
        right: clip(width - sx, width),
        bottom: clip(height - sy, height),
    };

    Ok((first, second))
}

/// Measures shifts and scores them.
#[derive(Debug)]
pub struct ShiftEstimator {
    correlator: PhaseCorrelator,
    extreme_shift: f64,
}

impl ShiftEstimator {
    pub fn new(correlation: PhaseCorrelationConfig, extreme_shift: f64) -> Self {
        Self {
            correlator: PhaseCorrelator::new(correlation),
            extreme_shift,
        }
    }

    /// Measures how far the observed shift between `first` and `second` is from
    /// `expected`, by correlating the regions that overlap under `expected`.
    ///
    /// Returns the correction `c` such that the observed shift is
    /// `expected - c`. A correlation without a usable peak yields zero.
    pub fn measure_shift(&mut self, first: &Tile, second: &Tile, expected: IVec2) -> Result<IVec2> {
        let (roi_first, roi_second) = estimate_roi(first.shape(), expected)?;

        let region_first = roi_first.crop(first.pixels());
        let region_second = roi_second.crop(second.pixels());

        match self.correlator.correlate(&region_first, &region_second) {
            Some(peak) => Ok(peak.translation),
            None => {
                tracing::debug!(
                    "No correlation peak for expected shift ({}, {})",
                    expected.x,
                    expected.y
                );
                Ok(IVec2::ZERO)
            }
        }
    }

    /// Similarity in `[0, 1]` of the two tiles when the second is placed at
    /// `shift`. The bigger, the more similar.
    ///
    /// Shifts whose length falls outside the plausible range of `overlap`
    /// score 0, as do shifts without overlap and flat regions.
    pub fn match_score(&self, first: &Tile, second: &Tile, shift: IVec2, overlap: &AxisOverlap) -> f64 {
        let length = shift.as_dvec2().length();
        if !overlap.plausible_range(self.extreme_shift).contains(&length) {
            return 0.0;
        }

        let Ok((roi_first, roi_second)) = estimate_roi(first.shape(), shift) else {
            return 0.0;
        };

        normalized_covariance(first.pixels(), &roi_first, second.pixels(), &roi_second)
    }
}

/// Pearson correlation of two equally sized regions, clamped to `[0, 1]`.
/// Zero when either region has no variance.
pub fn normalized_covariance(
    image_a: &Buffer2<f32>,
    roi_a: &Roi,
    image_b: &Buffer2<f32>,
    roi_b: &Roi,
) -> f64 {
    debug_assert_eq!((roi_a.width(), roi_a.height()), (roi_b.width(), roi_b.height()));

    let n = roi_a.area();
    if n == 0 {
        return 0.0;
    }

    let region_sum = |image: &Buffer2<f32>, roi: &Roi| -> f64 {
        roi.rows(image)
            .flat_map(|row| row.iter())
            .map(|&v| v as f64)
            .sum()
    };
    let mean_a = region_sum(image_a, roi_a) / n as f64;
    let mean_b = region_sum(image_b, roi_b) / n as f64;

    let mut covar = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (row_a, row_b) in roi_a.rows(image_a).zip(roi_b.rows(image_b)) {
        for (&a, &b) in row_a.iter().zip(row_b) {
            let da = a as f64 - mean_a;
            let db = b as f64 - mean_b;
            covar += da * db;
            var_a += da * da;
            var_b += db * db;
        }
    }

    let (var_a, var_b) = (var_a / n as f64, var_b / n as f64);
    if is_flat(var_a, mean_a) || is_flat(var_b, mean_b) {
        return 0.0;
    }
    let std_dev = (var_a.sqrt(), var_b.sqrt());

    (covar / n as f64 / (std_dev.0 * std_dev.1)).clamp(0.0, 1.0)
}

/// Variance indistinguishable from rounding noise around `mean`.
fn is_flat(variance: f64, mean: f64) -> bool {
    const FLAT_VARIANCE: f64 = 1e-12;
    variance <= FLAT_VARIANCE * mean.abs().max(1.0).powi(2)
}
