use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirportLoadError {
    #[error("Failed to read airports file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    // Raw bytes are staged in a temporary file before parsing
    #[error("Failed to stage airport data in a temporary file")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to parse airports CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Airports CSV has {found} columns but {expected} are expected")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("Failed to read column '{column}' of the airports CSV")]
    Column {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
