//! Scratch workspace provisioning errors.

use super::error_code::{self, FieldmergeErrorCode};

/// Errors that can occur while provisioning the run-scoped scratch workspace.
///
/// `Exhausted` is the only error class in the whole pipeline that aborts a
/// run; everything else is isolated at group granularity.
#[derive(Debug, thiserror::Error)]
pub enum ScratchError {
    #[error("Failed to create scratch directory {path}: {message}")]
    CreateFailed { path: String, message: String },

    #[error("All scratch workspace candidates failed")]
    Exhausted,
}

impl FieldmergeErrorCode for ScratchError {
    fn error_code(&self) -> &'static str {
        error_code::SCRATCH_ERROR
    }
}
