//! FilterStudio Rust Engine
//!
//! Spatial and frequency-domain image filters for an interactive filtering
//! workbench, with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Frames are `(height, width, channels)` u8 arrays:
//! - **Grayscale**: (height, width, 1) - single channel
//! - **RGB**: (height, width, 3) - 3 color channels
//! - **RGBA**: (height, width, 4) - 3 color channels + alpha (ignored)
//!
//! Every filter reduces the frame to a single intensity channel and returns
//! a 3-channel display frame of the same size.
//!
//! ## Filters
//! - **Edge**: Sobel X/Y, gradient magnitude, Canny
//! - **Frequency**: ideal, Gaussian and Butterworth low-pass and high-pass
//! - **Mean**: arithmetic, geometric, harmonic, contraharmonic
//! - **Order statistic**: median, min, max, midpoint
//!
//! ## Usage
//! ```no_run
//! use filterstudio::{apply, Filter, FilterId, ParameterSet};
//! use ndarray::Array3;
//!
//! let frame = Array3::<u8>::zeros((480, 640, 3));
//! let params = ParameterSet::default();
//! let filter = Filter::from_params(FilterId::Canny, &params);
//! let display = apply(frame.view(), &filter);
//! assert_eq!(display.dim(), (480, 640, 3));
//! ```

pub mod dispatch;
pub mod error;
pub mod filters;
pub mod params;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use dispatch::{apply, apply_with_params, magnitude_spectrum, try_apply, Filter, FilterId};
pub use error::{FilterError, FilterResult};
pub use params::{ParamKey, ParameterSet, SharedParameters};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    use crate::dispatch::{self, Filter, FilterId};
    use crate::params::{ParamKey, ParameterSet};

    // ========================================================================
    // Filters
    // ========================================================================

    /// Apply a filter to an image.
    ///
    /// Failures inside the filter are logged and the input is returned.
    ///
    /// # Arguments
    /// * `image` - Input image (1, 3, or 4 channels)
    /// * `filter` - Filter name (`canny`, `glpf`, `median`, ...)
    /// * `**params` - Parameter overrides (`canny_low=40`, `glpf_radius=20`, ...)
    ///
    /// # Returns
    /// 3-channel display image
    #[pyfunction]
    #[pyo3(signature = (image, filter, **params))]
    pub fn apply_filter<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter: &str,
        params: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let id: FilterId = filter.parse()?;
        let mut snapshot = ParameterSet::default();
        if let Some(params) = params {
            for (name, value) in params.iter() {
                let key: ParamKey = name.extract::<String>()?.parse()?;
                snapshot.set(key, value.extract::<f64>()?)?;
            }
        }

        let filter = Filter::from_params(id, &snapshot);
        let result = dispatch::apply(image.as_array(), &filter);
        Ok(result.into_pyarray(py))
    }

    /// Log-magnitude spectrum of an image's intensity (3-channel).
    #[pyfunction]
    pub fn magnitude_spectrum<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = dispatch::magnitude_spectrum(image.as_array())?;
        Ok(result.into_pyarray(py))
    }

    /// Names of all filters, in menu order.
    #[pyfunction]
    pub fn filter_names() -> Vec<&'static str> {
        FilterId::ALL.iter().map(|id| id.name()).collect()
    }

    /// Parameter names read by a filter.
    #[pyfunction]
    pub fn filter_params(filter: &str) -> PyResult<Vec<&'static str>> {
        let id: FilterId = filter.parse()?;
        Ok(id.params().iter().map(|key| key.name()).collect())
    }

    // ========================================================================
    // Module Definition
    // ========================================================================

    #[pymodule]
    pub fn filterstudio(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(apply_filter, m)?)?;
        m.add_function(wrap_pyfunction!(magnitude_spectrum, m)?)?;
        m.add_function(wrap_pyfunction!(filter_names, m)?)?;
        m.add_function(wrap_pyfunction!(filter_params, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::filterstudio;
