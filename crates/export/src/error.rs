//! Error types for export operations

use thiserror::Error;

/// Errors produced by export jobs and downloads
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("core error: {0}")]
    Core(#[from] vegtrack_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid region geometry: {0}")]
    InvalidRegion(String),

    #[error("nothing to mosaic: source collection is empty")]
    EmptyMosaic,

    #[error("invalid export scale: {0}")]
    InvalidScale(f64),

    #[error("export job panicked or was cancelled: {0}")]
    Join(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
