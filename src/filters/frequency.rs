//! Frequency-domain filters: ideal, Gaussian and Butterworth low/high-pass.
//!
//! Every filter runs the same pipeline:
//!
//! 1. Forward 2D FFT of the intensity grid, zero frequency shifted to the center
//! 2. Log-magnitude spectrum for display
//! 3. Multiply by a real transfer mask built around the center
//! 4. Undo the shift, unnormalised inverse FFT, complex magnitude
//! 5. Rescale so the maximum maps to 255
//!
//! Only the mask differs between the six filters.
//!
//! ## Masks
//!
//! With `D` the distance of a bin from `(rows / 2, cols / 2)` and
//! `D0 = max(radius, 1)`:
//!
//! | Filter | Low-pass H(D) |
//! |--------|---------------|
//! | Ideal | 1 if D ≤ radius else 0 |
//! | Gaussian | exp(-D² / 2D0²) |
//! | Butterworth | 1 / (1 + (D / D0)^2n) |
//!
//! Each high-pass mask is `1 - H`.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftDirection, FftPlanner};

use super::core::scale_to_max;
use super::grayscale::truncate_u8;
use crate::error::{FilterError, FilterResult};

/// Guard added to the spectrum log scale and the Butterworth cutoff.
const EPSILON: f64 = 1e-9;

// ============================================================================
// Masks
// ============================================================================

/// Transfer function family and pass band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrequencyKind {
    IdealLowPass,
    GaussianLowPass,
    ButterworthLowPass,
    IdealHighPass,
    GaussianHighPass,
    ButterworthHighPass,
}

impl FrequencyKind {
    /// True for the three high-pass variants.
    pub fn is_high_pass(self) -> bool {
        matches!(
            self,
            FrequencyKind::IdealHighPass
                | FrequencyKind::GaussianHighPass
                | FrequencyKind::ButterworthHighPass
        )
    }

    /// The low-pass filter this one is derived from (itself if already low-pass).
    pub fn low_pass(self) -> FrequencyKind {
        match self {
            FrequencyKind::IdealHighPass => FrequencyKind::IdealLowPass,
            FrequencyKind::GaussianHighPass => FrequencyKind::GaussianLowPass,
            FrequencyKind::ButterworthHighPass => FrequencyKind::ButterworthLowPass,
            low => low,
        }
    }

    /// The matching filter of the opposite pass band.
    pub fn complement(self) -> FrequencyKind {
        match self {
            FrequencyKind::IdealLowPass => FrequencyKind::IdealHighPass,
            FrequencyKind::GaussianLowPass => FrequencyKind::GaussianHighPass,
            FrequencyKind::ButterworthLowPass => FrequencyKind::ButterworthHighPass,
            high => high.low_pass(),
        }
    }
}

/// Real per-bin multiplier over a centered spectrum.
#[derive(Clone, Debug)]
pub struct FrequencyMask {
    pub kind: FrequencyKind,
    pub coefficients: Array2<f64>,
}

impl FrequencyMask {
    /// Build a mask for a centered spectrum of the given shape.
    ///
    /// # Arguments
    /// * `kind` - Filter family and pass band
    /// * `shape` - `(rows, cols)` of the spectrum
    /// * `radius` - Cutoff radius in bins
    /// * `order` - Butterworth order (ignored by the other families)
    pub fn build(kind: FrequencyKind, shape: (usize, usize), radius: f64, order: u32) -> Self {
        let (rows, cols) = shape;
        let center_row = (rows / 2) as f64;
        let center_col = (cols / 2) as f64;
        let d0 = radius.max(1.0);
        let exponent = 2 * order as i32;

        let low_pass = kind.low_pass();
        let coefficients = Array2::from_shape_fn(shape, |(y, x)| {
            let dy = y as f64 - center_row;
            let dx = x as f64 - center_col;
            let dist_sq = dx * dx + dy * dy;

            let h = match low_pass {
                FrequencyKind::IdealLowPass => {
                    if dist_sq <= radius * radius {
                        1.0
                    } else {
                        0.0
                    }
                }
                FrequencyKind::GaussianLowPass => (-dist_sq / (2.0 * d0 * d0)).exp(),
                _ => 1.0 / (1.0 + (dist_sq.sqrt() / (d0 + EPSILON)).powi(exponent)),
            };

            if kind.is_high_pass() {
                1.0 - h
            } else {
                h
            }
        });

        Self { kind, coefficients }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.coefficients.dim()
    }
}

// ============================================================================
// Transform
// ============================================================================

/// In-place 2D FFT of a row-major buffer: all rows, then all columns.
fn fft2d(buffer: &mut Vec<Complex<f64>>, rows: usize, cols: usize, direction: FftDirection) {
    let mut planner = FftPlanner::<f64>::new();

    let row_fft = planner.plan_fft(cols, direction);
    buffer
        .par_chunks_mut(cols)
        .for_each(|row| row_fft.process(row));

    let col_fft = planner.plan_fft(rows, direction);
    let mut columns = transpose(buffer, rows, cols);
    columns
        .par_chunks_mut(rows)
        .for_each(|col| col_fft.process(col));
    *buffer = transpose(&columns, cols, rows);
}

fn transpose(src: &[Complex<f64>], rows: usize, cols: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); src.len()];
    for y in 0..rows {
        for x in 0..cols {
            out[x * rows + y] = src[y * cols + x];
        }
    }
    out
}

/// Circularly read `src` starting at `(row_offset, col_offset)`.
fn roll<T: Clone>(src: ArrayView2<T>, row_offset: usize, col_offset: usize) -> Array2<T> {
    let (rows, cols) = src.dim();
    Array2::from_shape_fn((rows, cols), |(y, x)| {
        src[[(y + row_offset) % rows, (x + col_offset) % cols]].clone()
    })
}

/// Move the zero-frequency bin from `(0, 0)` to `(rows / 2, cols / 2)`.
pub fn fftshift<T: Clone>(src: ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = src.dim();
    roll(src, rows - rows / 2, cols - cols / 2)
}

/// Exact inverse of [`fftshift`], also for odd sizes.
pub fn ifftshift<T: Clone>(src: ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = src.dim();
    roll(src, rows / 2, cols / 2)
}

/// Forward transform of an intensity grid, zero frequency centered.
pub fn centered_spectrum(input: ArrayView2<u8>) -> FilterResult<Array2<Complex<f64>>> {
    let (rows, cols) = input.dim();
    if rows == 0 || cols == 0 {
        return Err(FilterError::InvalidInput(format!(
            "cannot transform a {}x{} grid",
            cols, rows
        )));
    }

    let mut buffer: Vec<Complex<f64>> = input.iter().map(|&v| Complex::from(v as f64)).collect();
    fft2d(&mut buffer, rows, cols, FftDirection::Forward);
    let spectrum = Array2::from_shape_vec((rows, cols), buffer)?;
    Ok(fftshift(spectrum.view()))
}

/// Log-magnitude display image of a centered spectrum.
///
/// `c * ln(1 + |F|)` with `c = 255 / (ln(1 + max|F|) + ε)`, clipped to bytes.
pub fn log_magnitude(spectrum: ArrayView2<Complex<f64>>) -> FilterResult<Array2<u8>> {
    let magnitude = spectrum.mapv(|z| z.norm());
    let max = magnitude.iter().cloned().fold(0.0f64, f64::max);
    if !max.is_finite() || magnitude.iter().any(|m| !m.is_finite()) {
        return Err(FilterError::NumericDegenerate(
            "spectrum magnitude is not finite".to_string(),
        ));
    }

    let c = 255.0 / ((1.0 + max).ln() + EPSILON);
    Ok(magnitude.mapv(|m| truncate_u8(c * (1.0 + m).ln())))
}

// ============================================================================
// Pipeline
// ============================================================================

/// Result of a frequency filter: filtered image and the pre-filter spectrum.
#[derive(Clone, Debug)]
pub struct FrequencyOutput {
    pub image: Array2<u8>,
    pub spectrum: Array2<u8>,
}

/// Log-magnitude spectrum of an intensity grid.
pub fn magnitude_spectrum(input: ArrayView2<u8>) -> FilterResult<Array2<u8>> {
    let spectrum = centered_spectrum(input)?;
    log_magnitude(spectrum.view())
}

/// Filter an intensity grid in the frequency domain.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kind` - Filter family and pass band
/// * `radius` - Cutoff radius in bins
/// * `order` - Butterworth order
///
/// # Returns
/// Filtered image scaled so its maximum is 255 (all zeros when the
/// filtered magnitude is zero everywhere), plus the display spectrum.
pub fn apply_frequency_filter(
    input: ArrayView2<u8>,
    kind: FrequencyKind,
    radius: f64,
    order: u32,
) -> FilterResult<FrequencyOutput> {
    let (rows, cols) = input.dim();
    let spectrum = centered_spectrum(input)?;
    let display = log_magnitude(spectrum.view())?;

    let mask = FrequencyMask::build(kind, (rows, cols), radius, order);
    let filtered = &spectrum * &mask.coefficients.mapv(|h| Complex::new(h, 0.0));

    let mut buffer: Vec<Complex<f64>> = ifftshift(filtered.view()).iter().cloned().collect();
    fft2d(&mut buffer, rows, cols, FftDirection::Inverse);

    let magnitude = Array2::from_shape_vec((rows, cols), buffer)?.mapv(|z| z.norm());
    let image = scale_to_max(magnitude.view(), 255.0).mapv(truncate_u8);

    Ok(FrequencyOutput {
        image,
        spectrum: display,
    })
}
