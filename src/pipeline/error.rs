//! Error types for feature analysis and feature engineering.

use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

/// Errors raised by the IV calculator and the feature transforms.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A requested column is not present in the dataset.
    #[error("Column '{column}' not found in dataset. Available columns: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// The target holds a single class, so one of the class totals is zero
    /// and the Good/Bad distributions are undefined.
    #[error("Target column '{target}' has no variation (all rows are {class})")]
    DegenerateTarget { target: String, class: &'static str },

    /// The target holds values other than 0 and 1.
    #[error("Target column '{target}' must be binary (0/1). Found values: {values:?}")]
    InvalidTarget { target: String, values: Vec<String> },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl AnalysisError {
    pub(crate) fn column_not_found(df: &DataFrame, column: &str) -> Self {
        AnalysisError::ColumnNotFound {
            column: column.to_string(),
            available: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
