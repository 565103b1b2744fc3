//! Vector layer IO errors.

use super::error_code::{self, FieldmergeErrorCode};

/// Errors that can occur while reading or writing boundary layers.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("Failed to read layer {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write layer {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to parse layer {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported geometry in {path}: {kind}")]
    UnsupportedGeometry { path: String, kind: String },
}

impl FieldmergeErrorCode for LayerError {
    fn error_code(&self) -> &'static str {
        error_code::LAYER_ERROR
    }
}
