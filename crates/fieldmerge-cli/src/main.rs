//! fieldmerge - field boundary reconciliation CLI
//!
//! Reconciles noisy per-tile/per-year field boundary layers into cleaned,
//! cropland-validated boundary layers.
//!
//! Usage:
//!   fieldmerge run --input <dir> --output <dir>    Run the full pipeline
//!   fieldmerge jobs --input <dir> --output <dir>   List discovered groups
//!   fieldmerge iou <predicted> <reference>         Compare two layers

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldmerge_core::config::{CliOverrides, PipelineConfig};
use fieldmerge_core::naming::YearStripNaming;
use fieldmerge_pipeline::{assess, discover_jobs, read_layer, Runner};

#[derive(Parser)]
#[command(name = "fieldmerge", version, about = "Field boundary reconciliation pipeline")]
struct Cli {
    /// Directory holding fieldmerge.toml (defaults to the current directory).
    #[arg(long, global = true)]
    config_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation and the cropland gate over every group.
    Run {
        /// Directory holding raw boundary layers.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory receiving cleaned boundary layers.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Directory holding mask layers.
        #[arg(long)]
        mask_dir: Option<PathBuf>,
        /// Directory receiving cropland selections (defaults to --output).
        #[arg(long)]
        cropland_out: Option<PathBuf>,
        /// Single raster used for every group.
        #[arg(long, conflicts_with = "raster_dir")]
        raster: Option<PathBuf>,
        /// Directory searched per group key for rasters.
        #[arg(long)]
        raster_dir: Option<PathBuf>,
        /// Parent directory for the scratch workspace.
        #[arg(long)]
        scratch_parent: Option<PathBuf>,
        /// Walk the input directory recursively.
        #[arg(long)]
        recursive: bool,
        /// Overwrite existing cropland outputs.
        #[arg(long)]
        overwrite: bool,
    },
    /// List the groups a run would process.
    Jobs {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        recursive: bool,
    },
    /// Intersection-over-union between two polygon layers.
    Iou {
        predicted: PathBuf,
        reference: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_root = match cli.config_root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Run {
            input,
            output,
            mask_dir,
            cropland_out,
            raster,
            raster_dir,
            scratch_parent,
            recursive,
            overwrite,
        } => {
            let overrides = CliOverrides {
                input_dir: input,
                output_dir: output,
                mask_dir,
                cropland_dir: cropland_out,
                raster_fixed_path: raster,
                raster_search_dir: raster_dir,
                scratch_parent,
                recursive: recursive.then_some(true),
                overwrite_output: overwrite.then_some(true),
            };
            let config = PipelineConfig::load(&config_root, Some(&overrides))
                .context("Failed to load configuration")?;

            let summary = Runner::new(config).run().context("Run failed")?;
            println!("Summary → {summary}");
        }
        Commands::Jobs {
            input,
            output,
            recursive,
        } => {
            let overrides = CliOverrides {
                input_dir: input,
                output_dir: output,
                recursive: recursive.then_some(true),
                ..Default::default()
            };
            let config = PipelineConfig::load(&config_root, Some(&overrides))
                .context("Failed to load configuration")?;

            let input_dir = config
                .paths
                .input_dir
                .context("--input (or paths.input_dir) is required")?;
            let output_dir = config
                .paths
                .output_dir
                .context("--output (or paths.output_dir) is required")?;

            let naming = YearStripNaming::new();
            let discovery = discover_jobs(
                &input_dir,
                &output_dir,
                &naming,
                config.discovery.effective_recursive(),
            )
            .context("Discovery failed")?;

            for key in &discovery.already_done {
                println!("{key}  (already processed)");
            }
            if discovery.jobs.is_empty() {
                println!("No unprocessed groups.");
            }
            for job in discovery.jobs {
                println!(
                    "{}  ({} layers) → {}",
                    job.key,
                    job.inputs.len(),
                    job.output_path.display()
                );
            }
        }
        Commands::Iou {
            predicted,
            reference,
        } => {
            let predicted = read_layer(&predicted)
                .with_context(|| format!("Failed to read {}", predicted.display()))?;
            let reference = read_layer(&reference)
                .with_context(|| format!("Failed to read {}", reference.display()))?;
            println!("{:.4}", assess::iou(&predicted, &reference));
        }
    }

    Ok(())
}
