//! Edge detection filters: Sobel, Gradient Magnitude, Canny.
//!
//! ## Sobel
//!
//! First-derivative correlation with binomial kernels of odd size 1-31 and
//! reflect-101 borders. The signed response is returned as-is; the display
//! path casts it straight to bytes (truncate, then wrap) without rescaling.
//!
//! ## Gradient Magnitude
//!
//! `sqrt(Sx² + Sy²)` rescaled so the frame maximum maps to 255.
//!
//! ## Canny
//!
//! 1. Gaussian blur of the 8-bit intensity grid
//! 2. Sobel gradients, magnitude rescaled to 0-255, direction in [0, 180]
//! 3. Non-maximum suppression over four direction sectors
//! 4. Double threshold into strong (255) / weak (75) / zero
//! 5. Single-pass hysteresis over the classification grid
//!
//! Each stage builds a fresh grid from the previous one.

use ndarray::{s, Array2, ArrayView2, Zip};

use super::blur::gaussian_blur_u8;
use super::core::{correlate_separable, scale_to_max, sobel_kernels, BorderMode};
use super::grayscale::{truncate_u8, wrap_u8};

/// Classification value of a strong edge pixel.
pub const STRONG: u8 = 255;
/// Classification value of a weak edge pixel.
pub const WEAK: u8 = 75;

/// Direction of a first derivative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientAxis {
    /// d/dx (responds to vertical edges)
    X,
    /// d/dy (responds to horizontal edges)
    Y,
}

// ============================================================================
// Sobel
// ============================================================================

/// Compute a signed Sobel derivative.
///
/// # Arguments
/// * `input` - Intensity grid (height, width), any real scale
/// * `kernel_size` - Odd kernel size (1-31)
/// * `axis` - Derivative direction
///
/// # Returns
/// Signed gradient grid of the same size
pub fn sobel(input: ArrayView2<f64>, kernel_size: usize, axis: GradientAxis) -> Array2<f64> {
    let (derivative, smooth) = sobel_kernels(kernel_size);
    match axis {
        GradientAxis::X => correlate_separable(input, &derivative, &smooth, BorderMode::Reflect101),
        GradientAxis::Y => correlate_separable(input, &smooth, &derivative, BorderMode::Reflect101),
    }
}

/// Sobel derivative cast directly to bytes for display.
///
/// No rescaling is applied: fractional responses truncate toward zero and
/// negative responses wrap modulo 256.
pub fn sobel_display(input: ArrayView2<f64>, kernel_size: usize, axis: GradientAxis) -> Array2<u8> {
    sobel(input, kernel_size, axis).mapv(wrap_u8)
}

// ============================================================================
// Gradient Magnitude
// ============================================================================

/// Combine two derivative grids into a magnitude image scaled to 0-255.
///
/// A frame with no gradient anywhere yields all zeros.
pub fn gradient_magnitude(gx: ArrayView2<f64>, gy: ArrayView2<f64>) -> Array2<u8> {
    let magnitude = Zip::from(&gx)
        .and(&gy)
        .map_collect(|&x, &y| (x * x + y * y).sqrt());
    scale_to_max(magnitude.view(), 255.0).mapv(truncate_u8)
}

// ============================================================================
// Canny
// ============================================================================

/// Run the full Canny pipeline on an 8-bit intensity grid.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd size of both the blur and the Sobel kernels
/// * `sigma` - Blur sigma; `<= 0` derives it from the kernel size
/// * `low` - Weak threshold on the 0-255 magnitude scale
/// * `high` - Strong threshold on the 0-255 magnitude scale
///
/// # Returns
/// Edge map with values 0, 75 (unlinked weak pixels on the border) or 255
pub fn canny(
    input: ArrayView2<u8>,
    kernel_size: usize,
    sigma: f64,
    low: f64,
    high: f64,
) -> Array2<u8> {
    let blurred = gaussian_blur_u8(input, kernel_size, sigma).mapv(|v| v as f64);

    let gx = sobel(blurred.view(), kernel_size, GradientAxis::X);
    let gy = sobel(blurred.view(), kernel_size, GradientAxis::Y);

    let magnitude = Zip::from(&gx).and(&gy).map_collect(|&x, &y| x.hypot(y));
    let magnitude = scale_to_max(magnitude.view(), 255.0);
    let direction = Zip::from(&gx)
        .and(&gy)
        .map_collect(|&x, &y| gradient_direction(x, y));

    let suppressed = non_max_suppression(magnitude.view(), direction.view());
    let classified = double_threshold(suppressed.view(), low, high);
    hysteresis(classified.view())
}

/// Gradient direction in degrees, folded into [0, 180].
#[inline]
pub fn gradient_direction(gx: f64, gy: f64) -> f64 {
    let angle = gy.atan2(gx).to_degrees();
    if angle < 0.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// Offsets `(dy, dx)` of the two neighbors compared for a direction.
#[inline]
fn sector_neighbors(angle: f64) -> [(isize, isize); 2] {
    if (0.0..22.5).contains(&angle) || (157.5..=180.0).contains(&angle) {
        [(0, 1), (0, -1)]
    } else if (22.5..67.5).contains(&angle) {
        [(1, -1), (-1, 1)]
    } else if (67.5..112.5).contains(&angle) {
        [(1, 0), (-1, 0)]
    } else {
        [(-1, -1), (1, 1)]
    }
}

/// Keep magnitudes that are at least as large as both neighbors along the
/// gradient direction; zero everything else.
///
/// The outer 1-pixel border is always zero.
pub fn non_max_suppression(magnitude: ArrayView2<f64>, direction: ArrayView2<f64>) -> Array2<f64> {
    let (height, width) = magnitude.dim();
    let mut output = Array2::<f64>::zeros((height, width));

    Zip::indexed(&mut output).par_for_each(|(y, x), out| {
        if y == 0 || x == 0 || y + 1 >= height || x + 1 >= width {
            return;
        }
        let m = magnitude[[y, x]];
        let keep = sector_neighbors(direction[[y, x]]).iter().all(|&(dy, dx)| {
            let ny = (y as isize + dy) as usize;
            let nx = (x as isize + dx) as usize;
            m >= magnitude[[ny, nx]]
        });
        if keep {
            *out = m;
        }
    });

    output
}

/// Classify suppressed magnitudes as strong, weak or zero.
///
/// Thresholds are direct values on the 0-255 magnitude scale.
pub fn double_threshold(suppressed: ArrayView2<f64>, low: f64, high: f64) -> Array2<u8> {
    suppressed.mapv(|m| {
        if m >= high {
            STRONG
        } else if m >= low {
            WEAK
        } else {
            0
        }
    })
}

/// Promote interior weak pixels with a strong 8-neighbor; drop the rest.
///
/// Reads only the classification grid, so a pixel promoted here never
/// promotes its own neighbors. Border pixels pass through unchanged.
pub fn hysteresis(classified: ArrayView2<u8>) -> Array2<u8> {
    let (height, width) = classified.dim();
    let mut output = classified.to_owned();

    Zip::indexed(&mut output).par_for_each(|(y, x), out| {
        if *out != WEAK || y == 0 || x == 0 || y + 1 >= height || x + 1 >= width {
            return;
        }
        let window = classified.slice(s![y - 1..=y + 1, x - 1..=x + 1]);
        let linked = window.iter().any(|&v| v == STRONG);
        *out = if linked { STRONG } else { 0 };
    });

    output
}
