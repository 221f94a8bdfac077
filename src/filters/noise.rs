//! Noise reduction filters: mean family and median.
//!
//! All filters take an 8-bit intensity grid and an odd kernel size k and
//! return an 8-bit grid of the same size.
//!
//! | Filter | Output per k×k window | Border |
//! |--------|-----------------------|--------|
//! | Arithmetic | mean(v) | reflect-101 |
//! | Geometric | exp(mean(ln(v + 1))) | reflect-101 |
//! | Harmonic | k² / Σ 1/(v + 1) | reflect-101 |
//! | Contraharmonic | Σ v^(Q+1) / (Σ v^Q + ε) | reflect-101 |
//! | Median | middle of sorted window | replicate |
//!
//! Contraharmonic with Q > 0 removes pepper noise, Q < 0 removes salt noise.

use ndarray::{Array2, ArrayView2, Zip};

use super::core::{box_mean, box_sum, odd_kernel, BorderMode};
use super::grayscale::{saturate_u8, truncate_u8};

/// Guard added to the contraharmonic denominator.
pub const CONTRAHARMONIC_EPSILON: f64 = 1e-9;

// ============================================================================
// Mean Filters
// ============================================================================

/// Apply an arithmetic mean (box) filter.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd neighborhood size
///
/// # Returns
/// Filtered grid, rounded to the nearest byte
pub fn arithmetic_mean(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    let src = input.mapv(|v| v as f64);
    box_mean(src.view(), kernel_size).mapv(saturate_u8)
}

/// Apply a geometric mean filter.
///
/// Samples are offset by +1 so a zero never reaches `ln`.
pub fn geometric_mean(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    let log_img = input.mapv(|v| (v as f64 + 1.0).ln());
    box_mean(log_img.view(), kernel_size).mapv(|m| truncate_u8(m.exp()))
}

/// Apply a harmonic mean filter.
///
/// Samples are offset by +1 so the reciprocal is always finite.
pub fn harmonic_mean(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    let kernel_size = odd_kernel(kernel_size);
    let inv = input.mapv(|v| 1.0 / (v as f64 + 1.0));
    let count = (kernel_size * kernel_size) as f64;
    box_sum(inv.view(), kernel_size).mapv(|s| truncate_u8(count / s))
}

/// Apply a contraharmonic mean filter of order `q`.
///
/// Zero samples raised to a negative power become infinite; windows where
/// that happens produce NaN and are written as 0.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd neighborhood size
/// * `q` - Filter order (Q > 0 suppresses pepper, Q < 0 suppresses salt)
pub fn contraharmonic_mean(input: ArrayView2<u8>, kernel_size: usize, q: f64) -> Array2<u8> {
    let src = input.mapv(|v| v as f64);
    let numerator = box_sum(src.mapv(|v| v.powf(q + 1.0)).view(), kernel_size);
    let denominator = box_sum(src.mapv(|v| v.powf(q)).view(), kernel_size);

    Zip::from(&numerator)
        .and(&denominator)
        .map_collect(|&n, &d| truncate_u8(n / (d + CONTRAHARMONIC_EPSILON)))
}

// ============================================================================
// Median Filter
// ============================================================================

/// Apply a median filter.
///
/// Removes salt-and-pepper noise while preserving edges.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd neighborhood size
pub fn median(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    let kernel_size = odd_kernel(kernel_size);
    let (height, width) = input.dim();
    let half = (kernel_size / 2) as isize;
    let window_size = kernel_size * kernel_size;
    let border = BorderMode::Replicate;

    let mut output = Array2::<u8>::zeros((height, width));
    Zip::indexed(&mut output).par_for_each(|(y, x), out| {
        let mut values: Vec<u8> = Vec::with_capacity(window_size);
        for dy in -half..=half {
            let sy = border.index(y as isize + dy, height);
            for dx in -half..=half {
                let sx = border.index(x as isize + dx, width);
                values.push(input[[sy, sx]]);
            }
        }

        let mid = values.len() / 2;
        let (_, median, _) = values.select_nth_unstable(mid);
        *out = *median;
    });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(height: usize, width: usize) -> Array2<u8> {
        Array2::from_shape_fn((height, width), |(y, x)| ((y * 53 + x * 29) % 256) as u8)
    }

    #[test]
    fn test_arithmetic_mean_constant_is_identity() {
        let img = Array2::<u8>::from_elem((7, 9), 77);
        for k in [1usize, 3, 5, 9, 31] {
            let result = arithmetic_mean(img.view(), k);
            assert!(result.iter().all(|&v| v == 77), "kernel {}", k);
        }
    }

    #[test]
    fn test_arithmetic_mean_rounds() {
        let mut img = Array2::<u8>::zeros((3, 3));
        img[[1, 1]] = 9 * 10 + 5;
        let result = arithmetic_mean(img.view(), 3);
        // 95 / 9 = 10.56
        assert_eq!(result[[1, 1]], 11);
    }

    #[test]
    fn test_geometric_mean_of_constant() {
        let img = Array2::<u8>::from_elem((5, 5), 100);
        let result = geometric_mean(img.view(), 3);
        // exp(ln(101)) may land a hair under 101 before truncation
        assert!(result.iter().all(|&v| v == 100 || v == 101));
    }

    #[test]
    fn test_harmonic_mean_pulls_toward_dark() {
        let mut img = Array2::<u8>::from_elem((3, 3), 200);
        img[[1, 1]] = 0;
        let harmonic = harmonic_mean(img.view(), 3);
        let arithmetic = arithmetic_mean(img.view(), 3);
        assert!(harmonic[[1, 1]] < arithmetic[[1, 1]]);
    }

    #[test]
    fn test_contraharmonic_q_zero_is_arithmetic() {
        let img = ramp(6, 6);
        let ch = contraharmonic_mean(img.view(), 3, 0.0);
        let am = arithmetic_mean(img.view(), 3);
        for (&a, &b) in ch.iter().zip(am.iter()) {
            assert!((a as i32 - b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_contraharmonic_zero_window_with_negative_q() {
        let img = Array2::<u8>::zeros((3, 3));
        let result = contraharmonic_mean(img.view(), 3, -1.5);
        assert!(result.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_median_removes_impulse() {
        let mut img = Array2::<u8>::from_elem((5, 5), 50);
        img[[2, 2]] = 255;
        img[[0, 4]] = 0;
        let result = median(img.view(), 3);
        assert!(result.iter().all(|&v| v == 50));
    }

    #[test]
    fn test_median_kernel_one_is_identity() {
        let img = ramp(4, 5);
        assert_eq!(median(img.view(), 1), img);
    }
}
