//! Layer discovery configuration.

use serde::{Deserialize, Serialize};

/// Options controlling input discovery and output overwrite policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Walk the input directory recursively. Default: false.
    pub recursive: Option<bool>,
    /// Overwrite existing cropland outputs. Default: false.
    ///
    /// Cleaned boundary outputs are never overwritten: a non-empty output
    /// marks its group as done regardless of this flag.
    pub overwrite_output: Option<bool>,
}

impl DiscoveryConfig {
    /// Whether discovery walks subdirectories, defaulting to false.
    pub fn effective_recursive(&self) -> bool {
        self.recursive.unwrap_or(false)
    }

    /// Whether cropland outputs may be overwritten, defaulting to false.
    pub fn effective_overwrite_output(&self) -> bool {
        self.overwrite_output.unwrap_or(false)
    }
}
