//! Morphology filters: Min (erode), Max (dilate), Midpoint.
//!
//! All filters take an 8-bit intensity grid and a square k×k structuring
//! neighborhood. Out-of-frame samples replicate the nearest edge sample,
//! which for min/max is the same as ignoring them.

use ndarray::{Array2, ArrayView2, Zip};

use super::core::{odd_kernel, BorderMode};

/// Fold every k×k neighborhood into a single byte.
fn fold_window<F>(input: ArrayView2<u8>, kernel_size: usize, init: u8, fold: F) -> Array2<u8>
where
    F: Fn(u8, u8) -> u8 + Sync,
{
    let (height, width) = input.dim();
    let half = (odd_kernel(kernel_size) / 2) as isize;
    let border = BorderMode::Replicate;

    let mut output = Array2::<u8>::zeros((height, width));
    Zip::indexed(&mut output).par_for_each(|(y, x), out| {
        let mut acc = init;
        for dy in -half..=half {
            let sy = border.index(y as isize + dy, height);
            for dx in -half..=half {
                let sx = border.index(x as isize + dx, width);
                acc = fold(acc, input[[sy, sx]]);
            }
        }
        *out = acc;
    });

    output
}

// ============================================================================
// Erode / Dilate
// ============================================================================

/// Apply a minimum filter (erosion).
///
/// Dark regions grow, isolated bright (salt) pixels vanish.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd neighborhood size
pub fn erode(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    fold_window(input, kernel_size, u8::MAX, u8::min)
}

/// Apply a maximum filter (dilation).
///
/// Bright regions grow, isolated dark (pepper) pixels vanish.
///
/// # Arguments
/// * `input` - Intensity grid (height, width)
/// * `kernel_size` - Odd neighborhood size
pub fn dilate(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    fold_window(input, kernel_size, u8::MIN, u8::max)
}

// ============================================================================
// Midpoint
// ============================================================================

/// Apply a midpoint filter: `floor((min + max) / 2)` per neighborhood.
///
/// The sum is formed in 16 bits so `255 + 255` cannot overflow.
pub fn midpoint(input: ArrayView2<u8>, kernel_size: usize) -> Array2<u8> {
    let min = erode(input, kernel_size);
    let max = dilate(input, kernel_size);
    Zip::from(&min)
        .and(&max)
        .map_collect(|&lo, &hi| ((lo as u16 + hi as u16) / 2) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(height: usize, width: usize) -> Array2<u8> {
        Array2::from_shape_fn((height, width), |(y, x)| ((y * 37 + x * 91) % 256) as u8)
    }

    #[test]
    fn test_dilate_grows_bright() {
        let mut img = Array2::<u8>::zeros((5, 5));
        img[[2, 2]] = 255;

        let result = dilate(img.view(), 3);

        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(result[[y, x]], 255);
            }
        }
        assert_eq!(result[[0, 0]], 0);
    }

    #[test]
    fn test_erode_shrinks_bright() {
        let mut img = Array2::<u8>::from_elem((5, 5), 255);
        img[[2, 2]] = 0;

        let result = erode(img.view(), 3);

        assert_eq!(result[[2, 1]], 0);
        assert_eq!(result[[1, 3]], 0);
        assert_eq!(result[[0, 0]], 255);
    }

    #[test]
    fn test_erode_border_does_not_darken() {
        // Out-of-frame samples must not count as black
        let img = Array2::<u8>::from_elem((4, 4), 200);
        assert!(erode(img.view(), 5).iter().all(|&v| v == 200));
        assert!(dilate(img.view(), 5).iter().all(|&v| v == 200));
    }

    #[test]
    fn test_kernel_one_is_identity() {
        let img = ramp(6, 7);
        assert_eq!(erode(img.view(), 1), img);
        assert_eq!(dilate(img.view(), 1), img);
        assert_eq!(midpoint(img.view(), 1), img);
    }

    #[test]
    fn test_midpoint_uses_wide_sum() {
        let mut img = Array2::<u8>::from_elem((3, 3), 255);
        img[[0, 0]] = 254;
        let result = midpoint(img.view(), 3);
        // (254 + 255) / 2 = 254 without wrapping
        assert_eq!(result[[1, 1]], 254);

        let img = Array2::<u8>::from_elem((3, 3), 255);
        assert_eq!(midpoint(img.view(), 3)[[1, 1]], 255);
    }

    #[test]
    fn test_min_midpoint_max_ordering() {
        let img = ramp(9, 11);
        for k in [3usize, 5, 7] {
            let lo = erode(img.view(), k);
            let mid = midpoint(img.view(), k);
            let hi = dilate(img.view(), k);
            for ((&a, &b), &c) in lo.iter().zip(mid.iter()).zip(hi.iter()) {
                assert!(a <= b && b <= c);
            }
        }
    }
}
