//! Configuration system for fieldmerge.
//! TOML-based, 4-layer resolution: CLI > env > project file > defaults.

pub mod buffer_config;
pub mod cropland_config;
pub mod discovery_config;
pub mod filter_config;
pub mod paths_config;
pub mod pipeline_config;
pub mod raster_config;
pub mod scratch_config;

pub use buffer_config::BufferConfig;
pub use cropland_config::CroplandConfig;
pub use discovery_config::DiscoveryConfig;
pub use filter_config::FilterConfig;
pub use paths_config::PathsConfig;
pub use pipeline_config::{CliOverrides, PipelineConfig};
pub use raster_config::RasterConfig;
pub use scratch_config::ScratchConfig;
