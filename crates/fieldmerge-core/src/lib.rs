//! fieldmerge-core: shared contracts for the boundary reconciliation pipeline
//!
//! This crate provides the pieces every other fieldmerge crate depends on:
//! - Config: TOML-based configuration with layered resolution
//! - Errors: one enum per subsystem, aggregated into `PipelineError`
//! - Events: synchronous run lifecycle event dispatch
//! - Naming: pluggable file-stem → key conventions (year stripping)

pub mod config;
pub mod errors;
pub mod events;
pub mod naming;

// Re-exports for convenience
pub use config::{
    BufferConfig, CliOverrides, CroplandConfig, DiscoveryConfig, FilterConfig,
    PathsConfig, PipelineConfig, RasterConfig, ScratchConfig,
};
pub use errors::{
    ConfigError, FieldmergeErrorCode, GeometryError, LayerError, PipelineError,
    RasterError, ScratchError,
};
pub use events::{
    EventDispatcher, GroupCompletedEvent, GroupFailedEvent, GroupSkippedEvent,
    GroupStartedEvent, RunCompletedEvent, RunEventHandler, RunStartedEvent, SkipReason,
};
pub use naming::{NamingConvention, YearStripNaming};
