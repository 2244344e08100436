//! Phase correlation for integer translation between two equally sized regions.
//!
//! 1. Pad both regions to power-of-two sizes (per axis) and apply a Hann window
//! 2. Compute the 2D FFT of both
//! 3. Normalise the cross-power spectrum
//! 4. The peak of its inverse FFT is the translation

#[cfg(test)]
mod tests;

use common::Buffer2;
use glam::IVec2;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Configuration for phase correlation.
#[derive(Debug, Clone)]
pub struct PhaseCorrelationConfig {
    /// Apply Hann window to reduce edge effects.
    pub use_windowing: bool,
    /// Minimum correlation peak value to accept.
    pub min_peak_value: f32,
}

impl Default for PhaseCorrelationConfig {
    fn default() -> Self {
        Self {
            use_windowing: true,
            min_peak_value: 0.05,
        }
    }
}

impl PhaseCorrelationConfig {
    pub fn validate(&self) {
        assert!(
            (0.0..=1.0).contains(&self.min_peak_value),
            "min_peak_value must be within [0, 1], got {}",
            self.min_peak_value
        );
    }
}

/// Result of phase correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak {
    /// Translation `d` such that `target(p) ≈ reference(p - d)`, in pixels.
    pub translation: IVec2,
    /// Peak correlation value (0.0 - 1.0).
    pub peak_value: f64,
}

/// Forward/inverse plans for one padded size.
struct FftPlans {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f32>>,
    row_inverse: Arc<dyn Fft<f32>>,
    col_forward: Arc<dyn Fft<f32>>,
    col_inverse: Arc<dyn Fft<f32>>,
}

/// Phase correlator for translation estimation.
///
/// The region sizes change from tile to tile (they follow the overlap), so
/// plans are requested per call; `FftPlanner` caches them internally.
pub struct PhaseCorrelator {
    config: PhaseCorrelationConfig,
    planner: FftPlanner<f32>,
}

impl std::fmt::Debug for PhaseCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseCorrelator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PhaseCorrelator {
    pub fn new(config: PhaseCorrelationConfig) -> Self {
        config.validate();
        Self {
            config,
            planner: FftPlanner::new(),
        }
    }

    pub fn config(&self) -> &PhaseCorrelationConfig {
        &self.config
    }

    /// Estimate the translation of `target` relative to `reference`.
    ///
    /// Returns `None` for mismatched or empty inputs and when the correlation
    /// peak is below `min_peak_value`.
    pub fn correlate(
        &mut self,
        reference: &Buffer2<f32>,
        target: &Buffer2<f32>,
    ) -> Option<CorrelationPeak> {
        if reference.dimensions() != target.dimensions() || reference.is_empty() {
            return None;
        }

        let plans = self.plans(reference.width(), reference.height());

        let mut ref_spectrum = prepare_image(reference, &plans, self.config.use_windowing);
        let mut tar_spectrum = prepare_image(target, &plans, self.config.use_windowing);
        fft_2d(&mut ref_spectrum, &plans, Transform::Forward);
        fft_2d(&mut tar_spectrum, &plans, Transform::Forward);

        let mut surface = cross_power_spectrum(&ref_spectrum, &tar_spectrum);
        fft_2d(&mut surface, &plans, Transform::Inverse);

        let norm = 1.0 / (plans.width * plans.height) as f32;
        let (peak_x, peak_y, peak_val) = find_peak(&surface, plans.width, norm);

        if peak_val < self.config.min_peak_value as f64 {
            return None;
        }

        Some(CorrelationPeak {
            translation: IVec2::new(
                unwrap_index(peak_x, plans.width),
                unwrap_index(peak_y, plans.height),
            ),
            peak_value: peak_val,
        })
    }

    fn plans(&mut self, width: usize, height: usize) -> FftPlans {
        let fft_width = width.next_power_of_two();
        let fft_height = height.next_power_of_two();
        FftPlans {
            width: fft_width,
            height: fft_height,
            row_forward: self.planner.plan_fft_forward(fft_width),
            row_inverse: self.planner.plan_fft_inverse(fft_width),
            col_forward: self.planner.plan_fft_forward(fft_height),
            col_inverse: self.planner.plan_fft_inverse(fft_height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Forward,
    Inverse,
}

/// Pad to the FFT size, centred, and apply the separable window.
fn prepare_image(image: &Buffer2<f32>, plans: &FftPlans, use_windowing: bool) -> Vec<Complex<f32>> {
    let (nw, nh) = (plans.width, plans.height);
    let mut padded = vec![Complex::new(0.0f32, 0.0); nw * nh];

    let offset_x = (nw - image.width()) / 2;
    let offset_y = (nh - image.height()) / 2;

    let (window_x, window_y) = if use_windowing {
        (hann_window(nw), hann_window(nh))
    } else {
        (vec![1.0; nw], vec![1.0; nh])
    };

    for (y, row) in image.rows().enumerate() {
        let py = y + offset_y;
        let wy = window_y[py];
        let dst = &mut padded[py * nw + offset_x..py * nw + offset_x + row.len()];
        for (x, (out, &value)) in dst.iter_mut().zip(row).enumerate() {
            *out = Complex::new(value * window_x[x + offset_x] * wy, 0.0);
        }
    }

    padded
}

/// In-place 2D FFT by rows, then by columns. Not normalised.
fn fft_2d(data: &mut Vec<Complex<f32>>, plans: &FftPlans, direction: Transform) {
    let (row_fft, col_fft) = match direction {
        Transform::Forward => (&plans.row_forward, &plans.col_forward),
        Transform::Inverse => (&plans.row_inverse, &plans.col_inverse),
    };

    data.par_chunks_mut(plans.width)
        .for_each(|row| row_fft.process(row));

    let mut columns = transpose(data, plans.width, plans.height);
    columns
        .par_chunks_mut(plans.height)
        .for_each(|col| col_fft.process(col));

    *data = transpose(&columns, plans.height, plans.width);
}

/// Transpose a `width x height` row-major matrix into `height x width`.
fn transpose(data: &[Complex<f32>], width: usize, height: usize) -> Vec<Complex<f32>> {
    debug_assert_eq!(data.len(), width * height);
    let mut out = vec![Complex::new(0.0, 0.0); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}

/// conj(F_ref) * F_tar / |conj(F_ref) * F_tar|
fn cross_power_spectrum(reference: &[Complex<f32>], target: &[Complex<f32>]) -> Vec<Complex<f32>> {
    reference
        .par_iter()
        .zip(target.par_iter())
        .map(|(&a, &b)| {
            let product = a.conj() * b;
            let magnitude = product.norm();
            if magnitude > 1e-10 {
                product / magnitude
            } else {
                Complex::new(0.0, 0.0)
            }
        })
        .collect()
}

/// Location and normalised value of the largest real component.
fn find_peak(surface: &[Complex<f32>], width: usize, norm: f32) -> (usize, usize, f64) {
    let mut max_val = f32::NEG_INFINITY;
    let mut max_idx = 0;

    for (idx, value) in surface.iter().enumerate() {
        if value.re > max_val {
            max_val = value.re;
            max_idx = idx;
        }
    }

    (max_idx % width, max_idx / width, (max_val * norm) as f64)
}

/// Map a circular peak index to a signed offset.
fn unwrap_index(peak: usize, size: usize) -> i32 {
    if peak > size / 2 {
        peak as i32 - size as i32
    } else {
        peak as i32
    }
}

/// Compute 1D Hann window.
fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    if size < 3 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}
