//! Job grouper — discovery and year-stripped grouping of raw layers.
//!
//! Raw boundary layers are named per tile and acquisition year; layers that
//! describe the same region across years share a group key and are
//! reconciled together into one output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use fieldmerge_core::errors::LayerError;
use fieldmerge_core::naming::NamingConvention;

use crate::layer;

const LAYER_EXTENSION: &str = "geojson";

/// One unit of reconciliation work: the ordered raw layers of a region and
/// the output path their cleaned boundary layer goes to.
#[derive(Debug, Clone)]
pub struct GroupJob {
    /// Canonical year-stripped group key.
    pub key: String,
    /// Input layer paths, sorted by (extracted year ascending, then stem).
    /// Order affects only logging; the reconciliation operations are
    /// order-independent.
    pub inputs: Vec<PathBuf>,
    /// Deterministic output path derived from the group key.
    pub output_path: PathBuf,
}

/// Result of job discovery: the work list plus the groups that were
/// already done and therefore omitted from it.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub jobs: Vec<GroupJob>,
    /// Keys of groups whose output already exists with at least one
    /// feature. Reported as skipped in the run summary.
    pub already_done: Vec<String>,
}

/// Discover input layers and group them into jobs.
///
/// Groups whose output already exists with at least one feature are
/// omitted from the work list (idempotence: re-running is a no-op for
/// completed groups) and surfaced via [`Discovery::already_done`]. An
/// empty input directory yields an empty job list and a diagnostic, not an
/// error.
pub fn discover_jobs(
    input_dir: &Path,
    output_dir: &Path,
    naming: &dyn NamingConvention,
    recursive: bool,
) -> Result<Discovery, LayerError> {
    if !input_dir.is_dir() {
        return Err(LayerError::Read {
            path: input_dir.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    let files = list_layer_files(input_dir, recursive);
    if files.is_empty() {
        tracing::info!(input = %input_dir.display(), "no layer files found");
        return Ok(Discovery::default());
    }

    // BTreeMap keeps group iteration deterministic.
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let key = naming.group_key(&stem_of(&path));
        groups.entry(key).or_default().push(path);
    }

    let mut discovery = Discovery::default();
    for (key, mut inputs) in groups {
        inputs.sort_by_key(|path| {
            let stem = stem_of(path);
            (naming.extract_year(&stem).unwrap_or(0), stem)
        });

        let output_path = output_dir.join(format!("{}.{}", naming.output_stem(&key), LAYER_EXTENSION));
        if output_is_done(&output_path) {
            tracing::info!(group = %key, output = %output_path.display(), "already processed");
            discovery.already_done.push(key);
            continue;
        }

        discovery.jobs.push(GroupJob {
            key,
            inputs,
            output_path,
        });
    }

    tracing::info!(
        count = discovery.jobs.len(),
        already_done = discovery.already_done.len(),
        "discovered jobs"
    );
    Ok(discovery)
}

/// Whether an output path already holds a valid (non-empty) layer.
pub fn output_is_done(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    layer::feature_count(path).map(|n| n > 0).unwrap_or(false)
}

fn list_layer_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case(LAYER_EXTENSION))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
