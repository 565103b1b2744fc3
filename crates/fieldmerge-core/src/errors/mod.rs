//! Error handling for fieldmerge.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod geometry_error;
pub mod layer_error;
pub mod pipeline_error;
pub mod raster_error;
pub mod scratch_error;

pub use config_error::ConfigError;
pub use error_code::FieldmergeErrorCode;
pub use geometry_error::GeometryError;
pub use layer_error::LayerError;
pub use pipeline_error::PipelineError;
pub use raster_error::RasterError;
pub use scratch_error::ScratchError;
