//! Gaussian blur for intensity grids.
//!
//! Uses separable 2-pass convolution with reflect-101 borders. Used as the
//! smoothing stage of Canny edge detection.

use ndarray::{Array2, ArrayView2};

use super::core::{correlate_separable, gaussian_kernel_1d, odd_kernel, BorderMode};
use super::grayscale::saturate_u8;

/// Apply Gaussian blur to an 8-bit intensity grid.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd kernel size
/// * `sigma` - Standard deviation; `<= 0` derives it from the kernel size
///
/// # Returns
/// Blurred grid, rounded back to bytes
pub fn gaussian_blur_u8(input: ArrayView2<u8>, kernel_size: usize, sigma: f64) -> Array2<u8> {
    let kernel_size = odd_kernel(kernel_size);
    if kernel_size <= 1 {
        return input.to_owned();
    }

    let kernel = gaussian_kernel_1d(kernel_size, sigma);
    let src = input.mapv(|v| v as f64);
    correlate_separable(src.view(), &kernel, &kernel, BorderMode::Reflect101).mapv(saturate_u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_step_edge() {
        let img = Array2::from_shape_fn((3, 6), |(_, x)| if x < 3 { 0u8 } else { 255 });
        let result = gaussian_blur_u8(img.view(), 3, 0.0);
        for y in 0..3 {
            assert_eq!(result[[y, 1]], 0);
            assert_eq!(result[[y, 2]], 64); // 63.75
            assert_eq!(result[[y, 3]], 191); // 191.25
            assert_eq!(result[[y, 4]], 255);
        }
    }

    #[test]
    fn test_blur_constant_is_identity() {
        let img = Array2::<u8>::from_elem((5, 5), 123);
        for k in [3usize, 7, 11] {
            let result = gaussian_blur_u8(img.view(), k, 0.0);
            assert!(result.iter().all(|&v| v == 123));
        }
        let result = gaussian_blur_u8(img.view(), 5, 2.5);
        assert!(result.iter().all(|&v| v == 123));
    }

    #[test]
    fn test_blur_kernel_one_is_identity() {
        let img = Array2::from_shape_fn((4, 4), |(y, x)| (y * 4 + x) as u8);
        assert_eq!(gaussian_blur_u8(img.view(), 1, 0.0), img);
    }
}
