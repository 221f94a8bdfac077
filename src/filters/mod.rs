//! Filter engines.
//!
//! ## Input Format
//!
//! Engines work on single-channel intensity grids. The [`grayscale`] module
//! converts `(H, W, C)` frames with 1, 3 or 4 `u8` channels into grids and
//! back into 3-channel display frames:
//!
//! | Grid | Type | Range | Used by |
//! |------|------|-------|---------|
//! | Intensity8 | `Array2<u8>` | 0-255 | Canny, frequency, mean, order statistics |
//! | Intensity float | `Array2<f64>` | 0.0-1.0 | Sobel, gradient magnitude |
//!
//! ## Architecture
//!
//! - **Pure** - engines never mutate their input and always return a new grid
//! - **Parallel** - per-pixel work runs on rayon through `ndarray::Zip`
//! - **Deterministic** - results do not depend on the thread count
//!
//! ## Filter Categories
//!
//! - **Edge**: sobel, gradient magnitude, canny
//! - **Frequency**: ideal/Gaussian/Butterworth low-pass and high-pass
//! - **Noise**: arithmetic, geometric, harmonic, contraharmonic mean, median
//! - **Morphology**: min (erode), max (dilate), midpoint

pub mod blur;
pub mod core;
pub mod edge;
pub mod frequency;
pub mod grayscale;
pub mod morphology;
pub mod noise;
