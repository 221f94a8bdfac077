//! Grayscale/channel adapter.
//!
//! Every filter works on a single intensity channel. This module converts
//! display frames into intensity grids and back.
//!
//! ## Supported Formats
//!
//! Input frames are `(height, width, channels)` u8 arrays:
//! - **Grayscale**: (height, width, 1) - copied directly
//! - **RGB**: (height, width, 3) - luminance from RGB
//! - **RGBA**: (height, width, 4) - luminance from RGB, alpha ignored
//!
//! Display frames are always (height, width, 3) with R=G=B.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{FilterError, FilterResult};

/// Weights used to collapse RGB into a single luminance value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrayscaleWeights {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl GrayscaleWeights {
    /// ITU-R BT.601 luma (the byte-domain conversion used by most filters).
    pub const BT601: GrayscaleWeights = GrayscaleWeights {
        r: 0.299,
        g: 0.587,
        b: 0.114,
    };

    /// Luminosity weights of `skimage.color.rgb2gray`.
    pub const SKIMAGE: GrayscaleWeights = GrayscaleWeights {
        r: 0.2125,
        g: 0.7154,
        b: 0.0721,
    };
}

// BT.601 in 14-bit fixed point, rounded: 4899, 9617 and 1868.
const FIX_SHIFT: u32 = 14;
const FIX_ONE: f64 = (1 << FIX_SHIFT) as f64;
const FIX_R: u32 = (GrayscaleWeights::BT601.r * FIX_ONE + 0.5) as u32;
const FIX_G: u32 = (GrayscaleWeights::BT601.g * FIX_ONE + 0.5) as u32;
const FIX_B: u32 = (GrayscaleWeights::BT601.b * FIX_ONE + 0.5) as u32;
const FIX_HALF: u32 = 1 << (FIX_SHIFT - 1);

/// Check that a frame has a non-zero area and a supported channel count.
///
/// # Returns
/// `(height, width, channels)` of the frame
pub fn validate_frame(frame: &ArrayView3<u8>) -> FilterResult<(usize, usize, usize)> {
    let (height, width, channels) = frame.dim();
    if height == 0 || width == 0 {
        return Err(FilterError::InvalidInput(format!(
            "frame has zero area ({}x{})",
            width, height
        )));
    }
    if !matches!(channels, 1 | 3 | 4) {
        return Err(FilterError::InvalidInput(format!(
            "unsupported channel count {}",
            channels
        )));
    }
    Ok((height, width, channels))
}

// ============================================================================
// Frame -> Intensity
// ============================================================================

/// Convert a frame to 8-bit intensity using BT.601 luma.
///
/// # Arguments
/// * `frame` - Image with 1, 3, or 4 channels (height, width, channels)
///
/// # Returns
/// Intensity grid (height, width) with values 0-255
pub fn to_intensity_u8(frame: ArrayView3<u8>) -> FilterResult<Array2<u8>> {
    let (height, width, channels) = validate_frame(&frame)?;

    if channels == 1 {
        return Ok(frame.index_axis(Axis(2), 0).to_owned());
    }

    Ok(Array2::from_shape_fn((height, width), |(y, x)| {
        let r = frame[[y, x, 0]] as u32;
        let g = frame[[y, x, 1]] as u32;
        let b = frame[[y, x, 2]] as u32;
        ((r * FIX_R + g * FIX_G + b * FIX_B + FIX_HALF) >> FIX_SHIFT) as u8
    }))
}

/// Convert a frame to normalised intensity in [0, 1].
///
/// # Arguments
/// * `frame` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `weights` - RGB weights; ignored for single-channel frames
///
/// # Returns
/// Intensity grid (height, width) with values 0.0-1.0
pub fn to_intensity_f64(
    frame: ArrayView3<u8>,
    weights: GrayscaleWeights,
) -> FilterResult<Array2<f64>> {
    let (height, width, channels) = validate_frame(&frame)?;

    Ok(Array2::from_shape_fn((height, width), |(y, x)| {
        if channels == 1 {
            frame[[y, x, 0]] as f64 / 255.0
        } else {
            let r = frame[[y, x, 0]] as f64 / 255.0;
            let g = frame[[y, x, 1]] as f64 / 255.0;
            let b = frame[[y, x, 2]] as f64 / 255.0;
            weights.r * r + weights.g * g + weights.b * b
        }
    }))
}

// ============================================================================
// Intensity -> Display
// ============================================================================

/// Replicate a single-channel grid into a 3-channel display frame.
pub fn to_display(intensity: ArrayView2<u8>) -> Array3<u8> {
    let (height, width) = intensity.dim();
    Array3::from_shape_fn((height, width, 3), |(y, x, _)| intensity[[y, x]])
}

// ============================================================================
// Cast Helpers
// ============================================================================

/// Round and saturate to 0-255 (8-bit output of a linear filter).
#[inline]
pub fn saturate_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Clip to 0-255, then truncate. NaN maps to 0.
#[inline]
pub fn truncate_u8(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Truncate toward zero, then wrap modulo 256. Non-finite values map to 0.
///
/// This is the unchecked float to unsigned byte conversion applied to the
/// signed Sobel outputs: `-1.7` becomes `255`, `300.2` becomes `44`.
#[inline]
pub fn wrap_u8(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.trunc() as i64).rem_euclid(256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_u8_matches_bt601() {
        let mut img = Array3::<u8>::zeros((1, 3, 3));
        img[[0, 0, 0]] = 255; // pure red
        img[[0, 1, 1]] = 255; // pure green
        img[[0, 2, 0]] = 200;
        img[[0, 2, 1]] = 100;
        img[[0, 2, 2]] = 50;

        let gray = to_intensity_u8(img.view()).unwrap();

        for x in 0..3 {
            let w = GrayscaleWeights::BT601;
            let expected = w.r * img[[0, x, 0]] as f64
                + w.g * img[[0, x, 1]] as f64
                + w.b * img[[0, x, 2]] as f64;
            assert!((gray[[0, x]] as f64 - expected).abs() <= 1.0);
        }
        assert_eq!(gray[[0, 0]], 76);
        assert_eq!(gray[[0, 1]], 150);
    }

    #[test]
    fn test_intensity_u8_white_stays_white() {
        let img = Array3::<u8>::from_elem((2, 2, 4), 255);
        let gray = to_intensity_u8(img.view()).unwrap();
        assert!(gray.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_intensity_single_channel_is_copied() {
        let img = Array3::from_shape_fn((2, 3, 1), |(y, x, _)| (y * 3 + x) as u8 * 10);
        let gray = to_intensity_u8(img.view()).unwrap();
        assert_eq!(gray[[1, 2]], 50);
        let norm = to_intensity_f64(img.view(), GrayscaleWeights::SKIMAGE).unwrap();
        assert!((norm[[1, 2]] - 50.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_f64_green() {
        let mut img = Array3::<u8>::zeros((1, 1, 3));
        img[[0, 0, 1]] = 255;
        let gray = to_intensity_f64(img.view(), GrayscaleWeights::SKIMAGE).unwrap();
        assert!((gray[[0, 0]] - 0.7154).abs() < 1e-9);
    }

    #[test]
    fn test_zero_area_is_invalid_input() {
        let img = Array3::<u8>::zeros((0, 4, 3));
        assert!(matches!(
            to_intensity_u8(img.view()),
            Err(FilterError::InvalidInput(_))
        ));
        let img = Array3::<u8>::zeros((4, 0, 3));
        assert!(matches!(
            to_intensity_f64(img.view(), GrayscaleWeights::SKIMAGE),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_two_channel_frame_is_rejected() {
        let img = Array3::<u8>::zeros((2, 2, 2));
        assert!(validate_frame(&img.view()).is_err());
    }

    #[test]
    fn test_to_display_replicates() {
        let gray = Array2::from_shape_fn((2, 2), |(y, x)| (y * 2 + x) as u8);
        let display = to_display(gray.view());
        assert_eq!(display.dim(), (2, 2, 3));
        for c in 0..3 {
            assert_eq!(display[[1, 1, c]], 3);
        }
    }

    #[test]
    fn test_fixed_point_weights() {
        assert_eq!((FIX_R, FIX_G, FIX_B), (4899, 9617, 1868));
        assert_eq!(FIX_R + FIX_G + FIX_B, 1 << FIX_SHIFT);
    }

    #[test]
    fn test_cast_helpers() {
        assert_eq!(saturate_u8(254.6), 255);
        assert_eq!(saturate_u8(-3.0), 0);
        assert_eq!(truncate_u8(254.9), 254);
        assert_eq!(truncate_u8(f64::NAN), 0);
        assert_eq!(truncate_u8(f64::INFINITY), 255);
        assert_eq!(wrap_u8(-1.7), 255);
        assert_eq!(wrap_u8(300.2), 44);
        assert_eq!(wrap_u8(0.99), 0);
        assert_eq!(wrap_u8(f64::NAN), 0);
    }
}
