//! Raster resolution and decoding errors.

use super::error_code::{self, FieldmergeErrorCode};

/// Errors that can occur while resolving or reading the value raster.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("No raster found for key '{key}'")]
    NotFound { key: String },

    #[error("Invalid raster header in {path}: {message}")]
    InvalidHeader { path: String, message: String },

    #[error("Malformed raster {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("Failed to read raster {path}: {message}")]
    Io { path: String, message: String },
}

impl FieldmergeErrorCode for RasterError {
    fn error_code(&self) -> &'static str {
        error_code::RASTER_ERROR
    }
}
