//! Error types for covmap

use thiserror::Error;

/// Main error type for covmap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Invalid urban/rural code '{value}' for cluster {cluster}")]
    InvalidAreaType { cluster: i64, value: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Location {index} is not covered by any Voronoi region")]
    UnassignedLocation { index: usize },

    #[error("Degenerate indicator '{indicator}': {reason}")]
    DegenerateIndicator { indicator: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for covmap operations
pub type Result<T> = std::result::Result<T, Error>;
