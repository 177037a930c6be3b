//! Error types for vegtrack

use thiserror::Error;

/// Main error type for vegtrack operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("scene has no band named '{0}'")]
    BandNotFound(String),

    #[error("scene collection is empty")]
    EmptyCollection,

    #[error("AOI ring must have at least 3 vertices, got {0}")]
    DegenerateAoi(usize),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TIFF codec error: {0}")]
    Tiff(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for vegtrack operations
pub type Result<T> = std::result::Result<T, Error>;
