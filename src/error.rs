//! Error type shared by every filter engine.

/// An error raised by a filter engine.
///
/// Engines propagate these with `?`; only the dispatcher swallows them
/// (see [`crate::dispatch::apply`]).
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// The frame has zero area or an unsupported channel layout.
    #[error("Invalid input frame: {0}")]
    InvalidInput(String),

    /// A parameter reached the engine outside its declared range.
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A numeric stage produced values that cannot be displayed.
    #[error("Numeric degeneracy: {0}")]
    NumericDegenerate(String),

    /// A flat buffer does not match the requested frame shape.
    #[error("Invalid shape")]
    InvalidShape(#[from] ndarray::ShapeError),
}

/// Result alias used across the engines.
pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(feature = "python")]
impl From<FilterError> for pyo3::PyErr {
    fn from(err: FilterError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
