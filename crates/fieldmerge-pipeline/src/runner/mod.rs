//! Run orchestrator.
//!
//! Sequences groups through the reconciler and the cropland gate, owns the
//! scratch workspace lifecycle, and isolates failures at group granularity.
//! Groups are processed strictly sequentially; a group either completes, is
//! skipped a priori, or fails atomically — no partial output is ever left
//! at a declared output path.

use std::fs;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fieldmerge_core::config::PipelineConfig;
use fieldmerge_core::errors::{ConfigError, FieldmergeErrorCode, PipelineError, RasterError};
use fieldmerge_core::events::{
    EventDispatcher, GroupCompletedEvent, GroupFailedEvent, GroupSkippedEvent,
    GroupStartedEvent, RunCompletedEvent, RunEventHandler, RunStartedEvent, SkipReason,
};
use fieldmerge_core::naming::{NamingConvention, YearStripNaming};

use crate::cropland;
use crate::grouper::{self, GroupJob};
use crate::layer;
use crate::raster::{self, Raster};
use crate::reconcile;
use crate::scratch::{GroupScratch, ScratchWorkspace};

/// Per-run summary counters.
///
/// A group with a written cleaned layer but no resolvable raster counts in
/// both `processed` and `missing_raster`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Groups whose cleaned layer was written this run.
    pub processed: usize,
    /// Groups skipped: output already done, or empty selection.
    pub skipped: usize,
    /// Groups that failed and were isolated.
    pub warnings: usize,
    /// Groups whose cropland gate was skipped for lack of a raster.
    pub missing_raster: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed: {}, skipped: {}, warnings: {}, missing raster: {}",
            self.processed, self.skipped, self.warnings, self.missing_raster
        )
    }
}

enum GroupOutcome {
    Completed {
        cleaned_features: usize,
        cropland_features: Option<usize>,
        raster_missing: bool,
    },
    EmptySelection,
}

/// Sequential pipeline runner.
pub struct Runner {
    config: PipelineConfig,
    naming: Arc<dyn NamingConvention>,
    dispatcher: EventDispatcher,
}

impl Runner {
    /// Create a runner with the default year-strip naming convention.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            naming: Arc::new(YearStripNaming::new()),
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Substitute an alternate naming convention.
    pub fn with_naming(mut self, naming: Arc<dyn NamingConvention>) -> Self {
        self.naming = naming;
        self
    }

    /// Register a run event handler.
    pub fn with_handler(mut self, handler: Arc<dyn RunEventHandler>) -> Self {
        self.dispatcher.register(handler);
        self
    }

    /// Run the full pipeline over every discovered group.
    ///
    /// Only scratch provisioning failures (and unusable configuration)
    /// abort the run; per-group errors are logged, counted as warnings, and
    /// the run continues.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();

        let input_dir = self.required_dir(self.config.paths.input_dir.clone(), "paths.input_dir")?;
        let output_dir =
            self.required_dir(self.config.paths.output_dir.clone(), "paths.output_dir")?;
        fs::create_dir_all(&output_dir).map_err(|e| {
            PipelineError::Config(ConfigError::ValidationFailed {
                field: "paths.output_dir".to_string(),
                message: e.to_string(),
            })
        })?;

        let scratch = ScratchWorkspace::create(
            self.config.scratch.parent_override.as_deref(),
            self.config.scratch.effective_keep_for_diagnostics(),
        )?;
        tracing::info!(scratch = %scratch.root().display(), "scratch workspace ready");

        let discovery = grouper::discover_jobs(
            &input_dir,
            &output_dir,
            self.naming.as_ref(),
            self.config.discovery.effective_recursive(),
        )?;

        self.dispatcher.emit_run_started(&RunStartedEvent {
            input_dir: input_dir.clone(),
            job_count: discovery.jobs.len(),
        });

        let mut summary = RunSummary::default();

        // Groups already done at discovery time are reported, not reworked.
        for key in &discovery.already_done {
            summary.skipped += 1;
            self.dispatcher.emit_group_skipped(&GroupSkippedEvent {
                key: key.clone(),
                reason: SkipReason::AlreadyDone,
            });
        }

        for job in &discovery.jobs {
            // Discovery already filtered done groups; re-check in case an
            // earlier group of this very run produced the output.
            if grouper::output_is_done(&job.output_path) {
                tracing::info!(group = %job.key, "already processed");
                summary.skipped += 1;
                self.dispatcher.emit_group_skipped(&GroupSkippedEvent {
                    key: job.key.clone(),
                    reason: SkipReason::AlreadyDone,
                });
                continue;
            }

            self.dispatcher.emit_group_started(&GroupStartedEvent {
                key: job.key.clone(),
                layer_count: job.inputs.len(),
            });
            tracing::info!(group = %job.key, layers = job.inputs.len(), "processing group");

            let group_start = Instant::now();
            let group_scratch = scratch.group(&job.key);
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                self.process_group(job, &group_scratch)
            }));
            // Scratch for the group is torn down on every exit path.
            drop(group_scratch);

            match outcome {
                Ok(Ok(GroupOutcome::Completed {
                    cleaned_features,
                    cropland_features,
                    raster_missing,
                })) => {
                    summary.processed += 1;
                    if raster_missing {
                        summary.missing_raster += 1;
                    }
                    self.dispatcher.emit_group_completed(&GroupCompletedEvent {
                        key: job.key.clone(),
                        cleaned_features,
                        cropland_features,
                        duration_ms: group_start.elapsed().as_millis() as u64,
                    });
                }
                Ok(Ok(GroupOutcome::EmptySelection)) => {
                    summary.skipped += 1;
                    self.dispatcher.emit_group_skipped(&GroupSkippedEvent {
                        key: job.key.clone(),
                        reason: SkipReason::EmptySelection,
                    });
                }
                Ok(Err(e)) => {
                    summary.warnings += 1;
                    tracing::warn!(group = %job.key, code = e.error_code(), error = %e, "group failed");
                    self.dispatcher.emit_group_failed(&GroupFailedEvent {
                        key: job.key.clone(),
                        message: e.to_string(),
                    });
                }
                Err(panic) => {
                    summary.warnings += 1;
                    let message = panic_message(panic);
                    tracing::warn!(group = %job.key, error = %message, "geometry operation panicked");
                    self.dispatcher.emit_group_failed(&GroupFailedEvent {
                        key: job.key.clone(),
                        message,
                    });
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            warnings = summary.warnings,
            missing_raster = summary.missing_raster,
            "run complete"
        );
        self.dispatcher.emit_run_completed(&RunCompletedEvent {
            processed: summary.processed,
            skipped: summary.skipped,
            warnings: summary.warnings,
            missing_raster: summary.missing_raster,
            duration_ms: start.elapsed().as_millis() as u64,
        });

        Ok(summary)
    }

    fn process_group(
        &self,
        job: &GroupJob,
        scratch: &GroupScratch,
    ) -> Result<GroupOutcome, PipelineError> {
        let cleaned = match reconcile::reconcile_group(
            job,
            self.config.paths.mask_dir.as_deref(),
            self.naming.as_ref(),
            &self.config,
            scratch,
        )? {
            None => return Ok(GroupOutcome::EmptySelection),
            Some(layer) => layer,
        };

        layer::write_layer_atomic(&job.output_path, &cleaned)?;
        tracing::info!(
            group = %job.key,
            features = cleaned.len(),
            output = %job.output_path.display(),
            "wrote cleaned boundary layer"
        );

        if self.config.raster.is_unconfigured() {
            tracing::debug!(group = %job.key, "no raster configured; cropland gate skipped");
            return Ok(GroupOutcome::Completed {
                cleaned_features: cleaned.len(),
                cropland_features: None,
                raster_missing: false,
            });
        }

        let raster_key = self.naming.raster_key(&cleaned.name);
        let raster_path = match raster::resolve_raster(&raster_key, &self.config.raster) {
            Ok(path) => path,
            Err(RasterError::NotFound { .. }) => {
                tracing::warn!(group = %job.key, key = %raster_key, "no raster found; cropland gate skipped");
                return Ok(GroupOutcome::Completed {
                    cleaned_features: cleaned.len(),
                    cropland_features: None,
                    raster_missing: true,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let raster = Raster::from_ascii(&raster_path)?;
        let selection = cropland::apply_cropland_gate(&cleaned, &raster, &self.config.cropland);

        let cropland_dir = self
            .config
            .paths
            .effective_cropland_dir()
            .expect("output_dir resolved above");
        fs::create_dir_all(&cropland_dir).map_err(|e| {
            PipelineError::Config(ConfigError::ValidationFailed {
                field: "paths.cropland_dir".to_string(),
                message: e.to_string(),
            })
        })?;
        let cropland_path =
            cropland_dir.join(format!("{}.geojson", self.naming.cropland_stem(&cleaned.name)));

        if cropland_path.exists() && !self.config.discovery.effective_overwrite_output() {
            tracing::info!(
                group = %job.key,
                output = %cropland_path.display(),
                "cropland output exists; not overwriting"
            );
            return Ok(GroupOutcome::Completed {
                cleaned_features: cleaned.len(),
                cropland_features: None,
                raster_missing: false,
            });
        }

        layer::write_layer_atomic(&cropland_path, &selection)?;
        tracing::info!(
            group = %job.key,
            features = selection.len(),
            output = %cropland_path.display(),
            "wrote cropland selection"
        );

        Ok(GroupOutcome::Completed {
            cleaned_features: cleaned.len(),
            cropland_features: Some(selection.len()),
            raster_missing: false,
        })
    }

    fn required_dir(
        &self,
        value: Option<PathBuf>,
        field: &str,
    ) -> Result<PathBuf, PipelineError> {
        value.ok_or_else(|| {
            PipelineError::Config(ConfigError::ValidationFailed {
                field: field.to_string(),
                message: "required for a run".to_string(),
            })
        })
    }
}

/// Render a panic payload into a loggable message.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
