use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Required field '{field}' missing from the API payload")]
    Schema { field: String },

    #[error("Metrics {metrics:?} are not declared in '{expected}'")]
    UnitMismatch {
        expected: String,
        metrics: Vec<String>,
    },

    #[error("Metrics {metrics:?} must all belong to exactly one of the hourly or daily tables")]
    AmbiguousColumnSet { metrics: Vec<String> },

    #[error("Column '{column}' not found in the {table} table")]
    MissingColumn { table: String, column: String },

    #[error("Column '{metric}' has {found} values but 'time' has {expected}")]
    MisalignedSeries {
        metric: String,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' holds an unreadable timestamp: {value}")]
    InvalidTimestamp { column: String, value: String },

    #[error("Column '{column}' holds a non-numeric value: {value}")]
    InvalidValue { column: String, value: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}

impl TransformError {
    pub(crate) fn schema(field: impl Into<String>) -> Self {
        TransformError::Schema {
            field: field.into(),
        }
    }
}
