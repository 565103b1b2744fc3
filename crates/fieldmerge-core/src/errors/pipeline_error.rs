//! Pipeline errors.

use super::error_code::FieldmergeErrorCode;
use super::{ConfigError, GeometryError, LayerError, RasterError, ScratchError};

/// Errors that can occur during pipeline execution.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("Scratch error: {0}")]
    Scratch(#[from] ScratchError),
}

impl PipelineError {
    /// Whether this error must abort the whole run.
    ///
    /// Scratch provisioning exhaustion is the only fatal class; every other
    /// error is caught at group granularity and counted as a warning.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Scratch(ScratchError::Exhausted))
    }
}

impl FieldmergeErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Layer(e) => e.error_code(),
            Self::Geometry(e) => e.error_code(),
            Self::Raster(e) => e.error_code(),
            Self::Scratch(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RasterError;

    #[test]
    fn only_scratch_exhaustion_is_fatal() {
        let fatal = PipelineError::Scratch(ScratchError::Exhausted);
        assert!(fatal.is_fatal());

        let missing = PipelineError::Raster(RasterError::NotFound {
            key: "Field".to_string(),
        });
        assert!(!missing.is_fatal());
    }

    #[test]
    fn error_codes_follow_the_wrapped_subsystem() {
        let e = PipelineError::Scratch(ScratchError::Exhausted);
        assert_eq!(e.error_code(), crate::errors::error_code::SCRATCH_ERROR);
    }
}
