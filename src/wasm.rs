//! WebAssembly exports for FilterStudio filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen and work on
//! flat row-major pixel buffers such as `ImageData.data`.
//!
//! ## Channel Layout
//!
//! Buffers may have 1, 3 or 4 channels per pixel. Filter output keeps the
//! input layout: the display intensity is written to every color channel
//! and an alpha channel, if present, is copied from the input.

use log::error;
use ndarray::{Array3, ArrayView3};
use wasm_bindgen::prelude::*;

use crate::dispatch::{self, Filter, FilterId};
use crate::error::{FilterError, FilterResult};
use crate::params::ParameterSet;

/// Copy a 3-channel display frame back into the caller's channel layout.
fn to_layout(display: &Array3<u8>, input: ArrayView3<u8>) -> Vec<u8> {
    let (height, width, channels) = input.dim();
    let out = Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
        if channels == 4 && c == 3 {
            input[[y, x, 3]]
        } else {
            display[[y, x, c.min(2)]]
        }
    });
    out.into_raw_vec_and_offset().0
}

fn run(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    filter: &str,
    params: &str,
) -> FilterResult<Vec<u8>> {
    let input = ArrayView3::from_shape((height, width, channels), data)?;
    let id: FilterId = filter.parse()?;
    let snapshot: ParameterSet = params.parse()?;

    let filter = Filter::from_params(id, &snapshot);
    if filter == Filter::None {
        return Ok(data.to_vec());
    }
    let display = dispatch::apply(input, &filter);
    Ok(to_layout(&display, input))
}

// ============================================================================
// Filters
// ============================================================================

/// Apply a filter to a flat pixel buffer.
///
/// # Arguments
/// * `data` - Flat array of bytes (length = width * height * channels)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - Channels per pixel (1, 3 or 4)
/// * `filter` - Filter name (`canny`, `glpf`, `median`, ...)
/// * `params` - Parameter overrides, e.g. `"canny_low=40,canny_high=90"`
///
/// # Returns
/// Filtered buffer in the input layout, or a copy of the input if the
/// buffer, filter name or parameters are malformed
#[wasm_bindgen]
pub fn apply_filter_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    filter: &str,
    params: &str,
) -> Vec<u8> {
    match run(data, width, height, channels, filter, params) {
        Ok(out) => out,
        Err(err) => {
            error!("apply_filter_wasm({}) failed: {}", filter, err);
            data.to_vec()
        }
    }
}

/// Log-magnitude spectrum of a flat pixel buffer, as RGB bytes.
///
/// Returns an empty buffer if the input is malformed.
#[wasm_bindgen]
pub fn magnitude_spectrum_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Vec<u8> {
    let spectrum = ArrayView3::from_shape((height, width, channels), data)
        .map_err(FilterError::from)
        .and_then(dispatch::magnitude_spectrum);
    match spectrum {
        Ok(frame) => frame.into_raw_vec_and_offset().0,
        Err(err) => {
            error!("magnitude_spectrum_wasm failed: {}", err);
            Vec::new()
        }
    }
}

/// Names of all filters, comma separated, in menu order.
#[wasm_bindgen]
pub fn filter_names_wasm() -> String {
    FilterId::ALL
        .iter()
        .map(|id| id.name())
        .collect::<Vec<_>>()
        .join(",")
}
