//! Value raster resolution configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the cropland-likelihood raster is resolved for each group.
///
/// A fixed path, when set, wins over the per-key search directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RasterConfig {
    /// Single raster used for every group.
    pub fixed_path: Option<PathBuf>,
    /// Directory searched per group key with widening glob patterns.
    pub search_dir: Option<PathBuf>,
}

impl RasterConfig {
    /// Returns true when neither resolution mode is configured.
    pub fn is_unconfigured(&self) -> bool {
        self.fixed_path.is_none() && self.search_dir.is_none()
    }
}
