//! Domain error types for data loading, preprocessing and model fitting.
//!
//! Library functions return [`crate::Result`], which is an `anyhow::Result`.
//! Failures that callers may want to match on are raised as [`DataError`]
//! and can be recovered with `err.downcast_ref::<DataError>()`.

use thiserror::Error;

/// Errors raised by the crate itself (as opposed to polars, linfa or plotters)
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("Column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Column '{column}' contains {count} missing value(s)")]
    MissingValues { column: String, count: usize },

    #[error("Column '{column}' is not numeric (dtype {dtype})")]
    NonNumeric { column: String, dtype: String },

    #[error("Column '{column}' has label {value}, expected 0 or 1")]
    InvalidLabel { column: String, value: f64 },

    #[error("Dataset is empty")]
    Empty,

    #[error("Training targets contain a single class")]
    SingleClass,

    #[error("Expected {expected} feature(s), got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_column() {
        let err = DataError::MissingValues {
            column: "Age".to_string(),
            count: 3,
        };
        assert_eq!(err.to_string(), "Column 'Age' contains 3 missing value(s)");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = DataError::SingleClass.into();
        assert_eq!(err.downcast_ref::<DataError>(), Some(&DataError::SingleClass));
    }
}
