use crate::load::report::LoadReport;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Output directory path exists but is not a directory: '{0}'")]
    NotADirectory(PathBuf),

    // Errors during CSV writing (inside blocking task)
    #[error("I/O error writing CSV file '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing CSV file '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to open database '{0}'")]
    DatabaseOpen(PathBuf, #[source] rusqlite::Error),

    #[error("Database statement failed for table '{table}'")]
    Database {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed reading rows for table '{table}'")]
    Frame {
        table: String,
        #[source]
        source: PolarsError,
    },

    #[error("Key column '{key}' not found in table '{table}'")]
    MissingKey { table: String, key: String },

    #[error("Unknown conflict resolution '{0}', expected NOTHING/IGNORE or UPDATE/OVERWRITE")]
    UnknownConflictResolution(String),

    /// At least one output failed; the others were still written.
    #[error("{failed} output(s) failed to load, first failure")]
    Incomplete {
        completed: Vec<LoadReport>,
        failed: usize,
        #[source]
        source: Box<LoadError>,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
