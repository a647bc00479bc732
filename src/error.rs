// NVR Index Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Recording not found: {0}")]
    RecordingNotFound(i64),

    #[error("Invalid recording filename: {0}")]
    InvalidFilename(String),

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Scan already in progress ({0})")]
    ScanInProgress(crate::scan::ScanKind),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    /// Errors that abort the whole scan rather than a single extraction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexerError::Database(_))
    }
}

impl From<anyhow::Error> for IndexerError {
    fn from(err: anyhow::Error) -> Self {
        IndexerError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
