//! Core utilities shared by the filter engines.
//!
//! This module provides:
//! - Border extension rules for sliding-window filters
//! - Separable 2D correlation (parallel over rows)
//! - Gaussian and Sobel kernel generation
//! - Max-normalisation for display

use ndarray::{Array2, ArrayView2, Zip};

/// How a sliding window reads samples that fall outside the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderMode {
    /// `gfedcb|abcdefgh|gfedcba` - mirror without repeating the edge sample.
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh` - repeat the edge sample.
    Replicate,
}

impl BorderMode {
    /// Map a possibly out-of-range coordinate onto `0..len`.
    #[inline]
    pub fn index(self, i: isize, len: usize) -> usize {
        let n = len as isize;
        if (0..n).contains(&i) {
            return i as usize;
        }
        match self {
            BorderMode::Replicate => i.clamp(0, n - 1) as usize,
            BorderMode::Reflect101 => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * (n - 1);
                let r = i.rem_euclid(period);
                (if r >= n { period - r } else { r }) as usize
            }
        }
    }
}

/// Round an even kernel size up to the next odd one (0 becomes 1).
#[inline]
pub fn odd_kernel(kernel_size: usize) -> usize {
    kernel_size | 1
}

// ============================================================================
// Separable Correlation
// ============================================================================

/// Correlate a grid with a separable kernel `ky ⊗ kx`.
///
/// Kernels are applied as-is (correlation, not flipped) and must have odd
/// length. The horizontal pass runs first, then the vertical pass; both are
/// parallel over output pixels.
///
/// # Arguments
/// * `src` - Input grid (height, width)
/// * `kx` - Horizontal taps
/// * `ky` - Vertical taps
/// * `border` - Border extension rule
pub fn correlate_separable(
    src: ArrayView2<f64>,
    kx: &[f64],
    ky: &[f64],
    border: BorderMode,
) -> Array2<f64> {
    let (height, width) = src.dim();
    let half_x = (kx.len() / 2) as isize;
    let half_y = (ky.len() / 2) as isize;

    // Horizontal pass
    let mut temp = Array2::<f64>::zeros((height, width));
    Zip::indexed(&mut temp).par_for_each(|(y, x), out| {
        let mut sum = 0.0f64;
        for (i, &k) in kx.iter().enumerate() {
            let sx = border.index(x as isize + i as isize - half_x, width);
            sum += src[[y, sx]] * k;
        }
        *out = sum;
    });

    // Vertical pass
    let mut result = Array2::<f64>::zeros((height, width));
    Zip::indexed(&mut result).par_for_each(|(y, x), out| {
        let mut sum = 0.0f64;
        for (i, &k) in ky.iter().enumerate() {
            let sy = border.index(y as isize + i as isize - half_y, height);
            sum += temp[[sy, x]] * k;
        }
        *out = sum;
    });

    result
}

/// Sum of every k×k neighborhood (reflect-101 border).
pub fn box_sum(src: ArrayView2<f64>, kernel_size: usize) -> Array2<f64> {
    let kernel_size = odd_kernel(kernel_size);
    let ones = vec![1.0f64; kernel_size];
    correlate_separable(src, &ones, &ones, BorderMode::Reflect101)
}

/// Average of every k×k neighborhood (reflect-101 border).
pub fn box_mean(src: ArrayView2<f64>, kernel_size: usize) -> Array2<f64> {
    let kernel_size = odd_kernel(kernel_size);
    let taps = vec![1.0 / kernel_size as f64; kernel_size];
    correlate_separable(src, &taps, &taps, BorderMode::Reflect101)
}

// ============================================================================
// Kernels
// ============================================================================

/// Build a 1D binomial derivative kernel.
///
/// Starting from `[1]`, the kernel is convolved `size - 1 - order` times
/// with `[1, 1]` (smoothing) and `order` times with `[-1, 1]` (difference):
/// - size 3, order 0: [1, 2, 1]
/// - size 3, order 1: [-1, 0, 1]
/// - size 5, order 1: [-1, -2, 0, 2, 1]
///
/// A derivative of size 1 is widened to 3 taps.
pub fn sobel_kernel_1d(kernel_size: usize, order: usize) -> Vec<f64> {
    let size = if kernel_size <= 1 && order > 0 {
        3
    } else {
        kernel_size.max(1)
    };

    let mut kernel = vec![1.0f64];
    let steps = (size - 1).saturating_sub(order);
    for _ in 0..steps {
        kernel = convolve_taps(&kernel, 1.0, 1.0);
    }
    for _ in 0..order {
        kernel = convolve_taps(&kernel, -1.0, 1.0);
    }
    kernel
}

/// Full convolution of `kernel` with the 2-tap filter `[a, b]`.
fn convolve_taps(kernel: &[f64], a: f64, b: f64) -> Vec<f64> {
    let mut next = vec![0.0f64; kernel.len() + 1];
    for (i, &k) in kernel.iter().enumerate() {
        next[i] += k * a;
        next[i + 1] += k * b;
    }
    next
}

/// Sobel kernels `(kx, ky)` for a first derivative along x.
///
/// For `kernel_size == 1` the derivative is `[-1, 0, 1]` with no cross
/// smoothing. Swap the pair for a derivative along y.
pub fn sobel_kernels(kernel_size: usize) -> (Vec<f64>, Vec<f64>) {
    let kernel_size = odd_kernel(kernel_size);
    let derivative = sobel_kernel_1d(kernel_size, 1);
    let smooth = if kernel_size <= 1 {
        vec![1.0]
    } else {
        sobel_kernel_1d(kernel_size, 0)
    };
    (derivative, smooth)
}

/// Sigma derived from the kernel size when none is given.
#[inline]
pub fn default_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Generate a normalised 1D Gaussian kernel of a given size.
///
/// With `sigma <= 0`, small kernels (1, 3, 5, 7) use fixed binomial
/// weights and larger kernels derive sigma from the size.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        match kernel_size {
            1 => return vec![1.0],
            3 => return vec![0.25, 0.5, 0.25],
            5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => {
                return vec![
                    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
                ]
            }
            _ => {}
        }
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_sigma(kernel_size)
    };
    let half = (kernel_size as f64 - 1.0) * 0.5;
    let scale = -0.5 / (sigma * sigma);

    let mut kernel: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (scale * x * x).exp()
        })
        .collect();

    // Normalize
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

// ============================================================================
// Normalisation
// ============================================================================

/// Linearly rescale a non-negative grid so its maximum maps to `target`.
///
/// A grid whose maximum is zero (or not a finite positive number) is
/// returned as all zeros instead of dividing by zero.
pub fn scale_to_max(src: ArrayView2<f64>, target: f64) -> Array2<f64> {
    let max = src.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return Array2::zeros(src.dim());
    }
    src.mapv(|v| v / max * target)
}
