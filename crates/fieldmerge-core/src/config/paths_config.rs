//! Pipeline directory layout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Input and output directories for a run.
///
/// `input_dir` and `output_dir` are required at run time; the others are
/// optional collaborators (mask reconciliation degrades gracefully, and the
/// cropland output directory falls back to `output_dir`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding raw boundary layers.
    pub input_dir: Option<PathBuf>,
    /// Directory receiving cleaned boundary layers.
    pub output_dir: Option<PathBuf>,
    /// Directory holding `<mask_key>_mask_final` layers.
    pub mask_dir: Option<PathBuf>,
    /// Directory receiving cropland selections. Default: `output_dir`.
    pub cropland_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Returns the effective cropland output directory.
    pub fn effective_cropland_dir(&self) -> Option<PathBuf> {
        self.cropland_dir.clone().or_else(|| self.output_dir.clone())
    }
}
