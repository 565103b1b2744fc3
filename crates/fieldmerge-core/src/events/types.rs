//! Event payload types for the run lifecycle.

use std::path::PathBuf;

/// Why a group produced no output without being a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A non-empty output already exists for the group.
    AlreadyDone,
    /// No eroded component passed the area/compactness floors.
    EmptySelection,
}

/// Payload for `on_run_started`.
#[derive(Debug, Clone)]
pub struct RunStartedEvent {
    pub input_dir: PathBuf,
    pub job_count: usize,
}

/// Payload for `on_group_started`.
#[derive(Debug, Clone)]
pub struct GroupStartedEvent {
    pub key: String,
    pub layer_count: usize,
}

/// Payload for `on_group_completed`.
#[derive(Debug, Clone)]
pub struct GroupCompletedEvent {
    pub key: String,
    pub cleaned_features: usize,
    /// Features surviving the cropland gate; `None` when the gate was
    /// skipped (no raster resolved for the group).
    pub cropland_features: Option<usize>,
    pub duration_ms: u64,
}

/// Payload for `on_group_skipped`.
#[derive(Debug, Clone)]
pub struct GroupSkippedEvent {
    pub key: String,
    pub reason: SkipReason,
}

/// Payload for `on_group_failed`.
#[derive(Debug, Clone)]
pub struct GroupFailedEvent {
    pub key: String,
    pub message: String,
}

/// Payload for `on_run_completed`.
#[derive(Debug, Clone)]
pub struct RunCompletedEvent {
    pub processed: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub missing_raster: usize,
    pub duration_ms: u64,
}
