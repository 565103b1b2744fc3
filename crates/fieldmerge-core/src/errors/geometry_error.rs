//! Geometry kernel errors.

use super::error_code::{self, FieldmergeErrorCode};

/// Errors that can occur during geometric operations.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Empty input to {0}")]
    EmptyInput(String),

    #[error("Buffer by {distance_m}m failed in {stage}: {message}")]
    BufferFailed {
        stage: String,
        distance_m: f64,
        message: String,
    },

    #[error("Overlay failed: {0}")]
    OverlayFailed(String),

    #[error("Degenerate result in {stage}")]
    DegenerateResult { stage: String },
}

impl FieldmergeErrorCode for GeometryError {
    fn error_code(&self) -> &'static str {
        error_code::GEOMETRY_ERROR
    }
}
