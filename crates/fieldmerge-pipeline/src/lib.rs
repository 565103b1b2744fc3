//! fieldmerge-pipeline: boundary reconciliation engine
//!
//! This crate turns noisy, per-tile/per-year field boundary layers into a
//! single cleaned, cropland-validated layer per region:
//! - Layer: polygon feature model with GeoJSON persistence
//! - Geom: geometry kernel adapter (overlay counts, offsets, metrics)
//! - Grouper: discovery and year-stripped grouping into jobs
//! - Reconcile: morphological opening + mask reconciliation + recovery
//! - Raster / Cropland: per-key raster resolution and the zonal gate
//! - Scratch: run-scoped scratch workspace with guaranteed cleanup
//! - Runner: sequential orchestrator with per-group failure isolation
//! - Assess: IoU accuracy assessment

pub mod assess;
pub mod cropland;
pub mod geom;
pub mod grouper;
pub mod layer;
pub mod raster;
pub mod reconcile;
pub mod runner;
pub mod scratch;

// Re-exports for convenience
pub use cropland::{apply_cropland_gate, zonal_mean, AREA_HA_FIELD, MEAN_FIELD, ZONE_FIELD};
pub use grouper::{discover_jobs, Discovery, GroupJob};
pub use layer::{read_layer, write_layer, write_layer_atomic, BoundaryLayer, Feature};
pub use raster::{resolve_raster, Raster};
pub use reconcile::reconcile_group;
pub use runner::{RunSummary, Runner};
pub use scratch::{GroupScratch, ScratchWorkspace};
