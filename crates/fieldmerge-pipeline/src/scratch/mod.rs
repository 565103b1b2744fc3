//! Run-scoped scratch workspace.
//!
//! One workspace is created per pipeline invocation; each group gets a
//! subdirectory for its intermediate layers. Group directories are removed
//! on every exit path (success, early skip, failure) via `Drop`; cleanup
//! failures are logged, never propagated. Workspace provisioning is the
//! only failure class that aborts a run.

use std::fs;
use std::path::{Path, PathBuf};

use fieldmerge_core::errors::{LayerError, ScratchError};

use crate::layer::{self, BoundaryLayer};

/// Paths longer than this tend to break downstream tooling; creation still
/// succeeds but a diagnostic is emitted.
const LONG_PATH_CHARS: usize = 200;

/// Run-scoped scratch workspace, torn down on drop unless kept for
/// diagnostics.
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    keep: bool,
}

impl ScratchWorkspace {
    /// Provision a scratch workspace.
    ///
    /// Parent candidates are tried in order: the configured override, the
    /// OS temp directory, the current directory. Within each parent a
    /// timestamped run name is tried first, then an ultra-short fallback
    /// name. Only when every candidate fails does this return
    /// [`ScratchError::Exhausted`].
    pub fn create(
        parent_override: Option<&Path>,
        keep_for_diagnostics: bool,
    ) -> Result<Self, ScratchError> {
        let mut parents: Vec<PathBuf> = Vec::new();
        if let Some(parent) = parent_override {
            parents.push(parent.to_path_buf());
        }
        parents.push(std::env::temp_dir());
        if let Ok(cwd) = std::env::current_dir() {
            parents.push(cwd);
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        for parent in &parents {
            let base = parent.join("fieldmerge_scratch");
            if let Err(e) = fs::create_dir_all(&base) {
                tracing::debug!(parent = %base.display(), error = %e, "scratch parent rejected");
                continue;
            }

            let run_name = format!("run_{stamp}_{}", short_id(6));
            if let Some(root) = try_create(&base.join(run_name)) {
                return Ok(Self {
                    root,
                    keep: keep_for_diagnostics,
                });
            }

            // Retry with an ultra-short name before moving to the next parent.
            let short_name = format!("g{}", short_id(8));
            if let Some(root) = try_create(&base.join(short_name)) {
                return Ok(Self {
                    root,
                    keep: keep_for_diagnostics,
                });
            }
        }

        Err(ScratchError::Exhausted)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch directory for one group's intermediate layers.
    pub fn group(&self, key: &str) -> GroupScratch {
        GroupScratch {
            dir: self.root.join(key),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(path = %self.root.display(), "scratch workspace kept for diagnostics");
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.root) {
            tracing::warn!(path = %self.root.display(), error = %e, "scratch workspace cleanup failed");
        }
    }
}

/// Per-group scratch directory. Removed unconditionally on drop.
#[derive(Debug)]
pub struct GroupScratch {
    dir: PathBuf,
}

impl GroupScratch {
    /// Persist an intermediate layer under a stage name.
    pub fn save(&self, stage: &str, layer: &BoundaryLayer) -> Result<(), LayerError> {
        fs::create_dir_all(&self.dir).map_err(|e| LayerError::Write {
            path: self.dir.display().to_string(),
            message: e.to_string(),
        })?;
        layer::write_layer(&self.dir.join(format!("{stage}.geojson")), layer)
    }

    /// Path of a stage layer (for diagnostics).
    pub fn stage_path(&self, stage: &str) -> PathBuf {
        self.dir.join(format!("{stage}.geojson"))
    }
}

impl Drop for GroupScratch {
    fn drop(&mut self) {
        if !self.dir.exists() {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            tracing::warn!(path = %self.dir.display(), error = %e, "group scratch cleanup failed");
        }
    }
}

fn try_create(path: &Path) -> Option<PathBuf> {
    match fs::create_dir(path) {
        Ok(()) => {
            let chars = path.display().to_string().chars().count();
            if chars > LONG_PATH_CHARS {
                tracing::warn!(
                    path = %path.display(),
                    chars,
                    "scratch path is long; consider a shorter parent override"
                );
            }
            Some(path.to_path_buf())
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "scratch candidate rejected");
            None
        }
    }
}

fn short_id(len: usize) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..len].to_string()
}
