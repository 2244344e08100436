//! Expected overlap between neighbouring tiles, derived from stage positions.

use std::f64::consts::SQRT_2;
use std::ops::RangeInclusive;

use crate::grid::Axis;

/// Overlap geometry along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOverlap {
    /// Share of the tile extent covered by the neighbour, in `[0, 1]`.
    pub fraction: f64,
    /// Overlap size in pixels.
    pub overlap_px: f64,
    /// Expected shift between neighbours in whole pixels.
    pub ideal_shift: i32,
    /// Distance between the origins of neighbouring tiles in pixels.
    pub spacing: f64,
}

impl AxisOverlap {
    /// Geometry of two tiles whose declared positions differ by
    /// `displacement` meters along an axis of `extent_px` pixels.
    pub fn from_displacement(extent_px: usize, pixel_size: f64, displacement: f64) -> Self {
        let extent_px = extent_px as f64;
        let size_meter = extent_px * pixel_size;
        let diff = displacement.abs();
        let fraction = ((size_meter - diff) / size_meter).clamp(0.0, 1.0);
        let overlap_px = extent_px * fraction;

        Self {
            fraction,
            overlap_px,
            ideal_shift: (extent_px - overlap_px).round() as i32,
            spacing: diff / pixel_size,
        }
    }

    /// Geometry for a known overlap fraction.
    pub fn from_fraction(extent_px: usize, fraction: f64) -> Self {
        let extent_px = extent_px as f64;
        let fraction = fraction.clamp(0.0, 1.0);
        let overlap_px = extent_px * fraction;

        Self {
            fraction,
            overlap_px,
            ideal_shift: (extent_px - overlap_px).round() as i32,
            spacing: extent_px - overlap_px,
        }
    }

    /// Range of shift lengths (pixels) considered plausible; anything outside
    /// scores zero without looking at the pixels.
    pub fn plausible_range(&self, tolerance: f64) -> RangeInclusive<f64> {
        let center = SQRT_2 * (self.ideal_shift as f64 - self.overlap_px);
        let margin = self.overlap_px * tolerance;
        (center - margin)..=(center + margin)
    }
}

/// Latest overlap seen along each axis.
///
/// Refined at every insertion along the dominant displacement axis. An axis
/// that was never observed borrows the other axis's overlap fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapModel {
    horizontal: Option<AxisOverlap>,
    vertical: Option<AxisOverlap>,
}

impl OverlapModel {
    pub fn update(&mut self, axis: Axis, overlap: AxisOverlap) {
        match axis {
            Axis::Horizontal => self.horizontal = Some(overlap),
            Axis::Vertical => self.vertical = Some(overlap),
        }
    }

    /// Geometry for `axis` on tiles `extent_px` pixels long on that axis.
    pub fn axis(&self, axis: Axis, extent_px: usize) -> AxisOverlap {
        let (own, other) = match axis {
            Axis::Horizontal => (self.horizontal, self.vertical),
            Axis::Vertical => (self.vertical, self.horizontal),
        };
        own.unwrap_or_else(|| {
            let fraction = other.map_or(0.0, |o| o.fraction);
            AxisOverlap::from_fraction(extent_px, fraction)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_percent_overlap() {
        let overlap = AxisOverlap::from_displacement(100, 1e-6, 80e-6);
        assert!((overlap.fraction - 0.2).abs() < 1e-9);
        assert!((overlap.overlap_px - 20.0).abs() < 1e-6);
        assert_eq!(overlap.ideal_shift, 80);
        assert!((overlap.spacing - 80.0).abs() < 1e-6);
    }

    #[test]
    fn test_displacement_sign_is_ignored() {
        let right = AxisOverlap::from_displacement(200, 5e-7, 90e-6);
        let left = AxisOverlap::from_displacement(200, 5e-7, -90e-6);
        assert_eq!(right, left);
        assert_eq!(right.ideal_shift, 180);
    }

    #[test]
    fn test_gap_between_tiles_means_no_overlap() {
        let overlap = AxisOverlap::from_displacement(100, 1e-6, 120e-6);
        assert_eq!(overlap.fraction, 0.0);
        assert_eq!(overlap.ideal_shift, 100);
        assert!((overlap.spacing - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_plausible_range_around_expected_length() {
        let overlap = AxisOverlap::from_fraction(100, 0.2);
        let range = overlap.plausible_range(0.6);
        // sqrt(2) * (80 - 20) -/+ 20 * 0.6
        assert!((range.start() - 72.8528).abs() < 1e-3);
        assert!((range.end() - 96.8528).abs() < 1e-3);
        assert!(range.contains(&80.0));
        assert!(!range.contains(&60.0));
    }

    #[test]
    fn test_model_falls_back_to_other_axis_fraction() {
        let mut model = OverlapModel::default();
        assert_eq!(model.axis(Axis::Vertical, 50).fraction, 0.0);
        assert_eq!(model.axis(Axis::Vertical, 50).ideal_shift, 50);

        model.update(Axis::Horizontal, AxisOverlap::from_displacement(100, 1e-6, 90e-6));
        let vertical = model.axis(Axis::Vertical, 50);
        assert!((vertical.fraction - 0.1).abs() < 1e-9);
        assert_eq!(vertical.ideal_shift, 45);

        model.update(Axis::Vertical, AxisOverlap::from_displacement(50, 1e-6, 40e-6));
        assert_eq!(model.axis(Axis::Vertical, 50).ideal_shift, 40);
    }
}
