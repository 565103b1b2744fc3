//! Scratch workspace configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for the run-scoped scratch workspace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScratchConfig {
    /// Preferred parent directory for the scratch workspace. When unset,
    /// the OS temp directory and then the current directory are tried.
    pub parent_override: Option<PathBuf>,
    /// Keep the workspace on disk at run end for diagnostics. Default: false.
    pub keep_for_diagnostics: Option<bool>,
}

impl ScratchConfig {
    /// Whether the workspace survives run teardown, defaulting to false.
    pub fn effective_keep_for_diagnostics(&self) -> bool {
        self.keep_for_diagnostics.unwrap_or(false)
    }
}
