//! Top-level pipeline configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    BufferConfig, CroplandConfig, DiscoveryConfig, FilterConfig, PathsConfig,
    RasterConfig, ScratchConfig,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`FIELDMERGE_*`)
/// 3. Project config (`fieldmerge.toml` in the given root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub buffer: BufferConfig,
    pub filter: FilterConfig,
    pub cropland: CroplandConfig,
    pub discovery: DiscoveryConfig,
    pub raster: RasterConfig,
    pub scratch: ScratchConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub mask_dir: Option<PathBuf>,
    pub cropland_dir: Option<PathBuf>,
    pub raster_fixed_path: Option<PathBuf>,
    pub raster_search_dir: Option<PathBuf>,
    pub scratch_parent: Option<PathBuf>,
    pub recursive: Option<bool>,
    pub overwrite_output: Option<bool>,
}

impl PipelineConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. CLI flags
    /// 2. Environment variables (`FIELDMERGE_*`)
    /// 3. Project config (`fieldmerge.toml` in `root`)
    /// 4. Compiled defaults
    pub fn load(
        root: &Path,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3: project config
        let project_config_path = root.join("fieldmerge.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
        if let Some(d) = config.buffer.erode_m {
            if d <= 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "buffer.erode_m".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(d) = config.buffer.dilate_m {
            if d <= 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "buffer.dilate_m".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(c) = config.filter.min_compactness {
            if !(0.0..=1.0).contains(&c) {
                return Err(ConfigError::ValidationFailed {
                    field: "filter.min_compactness".to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(a) = config.filter.min_area_sqm {
            if a < 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "filter.min_area_sqm".to_string(),
                    message: "must be non-negative".to_string(),
                });
            }
        }
        let recovery = config.filter.effective_min_recovery_area_sqm();
        let primary = config.filter.effective_min_area_sqm();
        if recovery < primary {
            return Err(ConfigError::ValidationFailed {
                field: "filter.min_recovery_area_sqm".to_string(),
                message: "must not be below filter.min_area_sqm".to_string(),
            });
        }
        if let Some(m) = config.cropland.min_mean {
            if m < 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "cropland.min_mean".to_string(),
                    message: "must be non-negative".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut PipelineConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: PipelineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut PipelineConfig, other: &PipelineConfig) {
        // Paths
        if other.paths.input_dir.is_some() {
            base.paths.input_dir = other.paths.input_dir.clone();
        }
        if other.paths.output_dir.is_some() {
            base.paths.output_dir = other.paths.output_dir.clone();
        }
        if other.paths.mask_dir.is_some() {
            base.paths.mask_dir = other.paths.mask_dir.clone();
        }
        if other.paths.cropland_dir.is_some() {
            base.paths.cropland_dir = other.paths.cropland_dir.clone();
        }

        // Buffer
        if other.buffer.erode_m.is_some() {
            base.buffer.erode_m = other.buffer.erode_m;
        }
        if other.buffer.dilate_m.is_some() {
            base.buffer.dilate_m = other.buffer.dilate_m;
        }

        // Filter
        if other.filter.min_area_sqm.is_some() {
            base.filter.min_area_sqm = other.filter.min_area_sqm;
        }
        if other.filter.min_compactness.is_some() {
            base.filter.min_compactness = other.filter.min_compactness;
        }
        if other.filter.min_recovery_area_sqm.is_some() {
            base.filter.min_recovery_area_sqm = other.filter.min_recovery_area_sqm;
        }

        // Cropland
        if other.cropland.min_ha.is_some() {
            base.cropland.min_ha = other.cropland.min_ha;
        }
        if other.cropland.min_mean.is_some() {
            base.cropland.min_mean = other.cropland.min_mean;
        }
        if other.cropland.ignore_nodata.is_some() {
            base.cropland.ignore_nodata = other.cropland.ignore_nodata;
        }

        // Discovery
        if other.discovery.recursive.is_some() {
            base.discovery.recursive = other.discovery.recursive;
        }
        if other.discovery.overwrite_output.is_some() {
            base.discovery.overwrite_output = other.discovery.overwrite_output;
        }

        // Raster
        if other.raster.fixed_path.is_some() {
            base.raster.fixed_path = other.raster.fixed_path.clone();
        }
        if other.raster.search_dir.is_some() {
            base.raster.search_dir = other.raster.search_dir.clone();
        }

        // Scratch
        if other.scratch.parent_override.is_some() {
            base.scratch.parent_override = other.scratch.parent_override.clone();
        }
        if other.scratch.keep_for_diagnostics.is_some() {
            base.scratch.keep_for_diagnostics = other.scratch.keep_for_diagnostics;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `FIELDMERGE_BUFFER_ERODE_M`, `FIELDMERGE_MIN_AREA_SQM`, etc.
    fn apply_env_overrides(config: &mut PipelineConfig) {
        if let Ok(val) = std::env::var("FIELDMERGE_BUFFER_ERODE_M") {
            if let Ok(v) = val.parse::<f64>() {
                config.buffer.erode_m = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_BUFFER_DILATE_M") {
            if let Ok(v) = val.parse::<f64>() {
                config.buffer.dilate_m = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_MIN_AREA_SQM") {
            if let Ok(v) = val.parse::<f64>() {
                config.filter.min_area_sqm = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_MIN_COMPACTNESS") {
            if let Ok(v) = val.parse::<f64>() {
                config.filter.min_compactness = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_MIN_RECOVERY_AREA_SQM") {
            if let Ok(v) = val.parse::<f64>() {
                config.filter.min_recovery_area_sqm = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_MIN_HA") {
            if let Ok(v) = val.parse::<f64>() {
                config.cropland.min_ha = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_MIN_MEAN") {
            if let Ok(v) = val.parse::<f64>() {
                config.cropland.min_mean = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_RECURSIVE") {
            if let Ok(v) = val.parse::<bool>() {
                config.discovery.recursive = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FIELDMERGE_OVERWRITE_OUTPUT") {
            if let Ok(v) = val.parse::<bool>() {
                config.discovery.overwrite_output = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut PipelineConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.input_dir {
            config.paths.input_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.output_dir {
            config.paths.output_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.mask_dir {
            config.paths.mask_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.cropland_dir {
            config.paths.cropland_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.raster_fixed_path {
            config.raster.fixed_path = Some(v.clone());
        }
        if let Some(ref v) = cli.raster_search_dir {
            config.raster.search_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.scratch_parent {
            config.scratch.parent_override = Some(v.clone());
        }
        if let Some(v) = cli.recursive {
            config.discovery.recursive = Some(v);
        }
        if let Some(v) = cli.overwrite_output {
            config.discovery.overwrite_output = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(PipelineConfig::validate(&config).is_ok());
        assert_eq!(config.buffer.effective_erode_m(), 20.0);
        assert_eq!(config.filter.effective_min_area_sqm(), 50_000.0);
        assert_eq!(config.filter.effective_min_recovery_area_sqm(), 300_000.0);
        assert_eq!(config.cropland.effective_min_mean(), 0.5);
    }

    #[test]
    fn parses_toml_sections() {
        let config = PipelineConfig::from_toml(
            r#"
            [buffer]
            erode_m = 10.0

            [filter]
            min_area_sqm = 20000.0
            min_compactness = 0.25

            [discovery]
            recursive = true
            "#,
        )
        .unwrap();
        assert_eq!(config.buffer.effective_erode_m(), 10.0);
        assert_eq!(config.buffer.effective_dilate_m(), 20.0);
        assert_eq!(config.filter.effective_min_area_sqm(), 20_000.0);
        assert!(config.discovery.effective_recursive());
    }

    #[test]
    fn rejects_compactness_out_of_range() {
        let config = PipelineConfig::from_toml("[filter]\nmin_compactness = 1.5\n").unwrap();
        assert!(PipelineConfig::validate(&config).is_err());
    }

    #[test]
    fn rejects_recovery_floor_below_primary() {
        let config = PipelineConfig::from_toml(
            "[filter]\nmin_area_sqm = 50000.0\nmin_recovery_area_sqm = 10000.0\n",
        )
        .unwrap();
        assert!(PipelineConfig::validate(&config).is_err());
    }

    #[test]
    fn loads_project_file_from_root() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(
            root.path().join("fieldmerge.toml"),
            "[buffer]\nerode_m = 12.5\n",
        )
        .unwrap();
        let config = PipelineConfig::load(root.path(), None).unwrap();
        assert_eq!(config.buffer.effective_erode_m(), 12.5);
    }

    #[test]
    fn missing_project_file_uses_defaults() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(root.path(), None).unwrap();
        assert_eq!(config.buffer.effective_erode_m(), 20.0);
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = PipelineConfig::from_toml("[discovery]\nrecursive = false\n").unwrap();
        let cli = CliOverrides {
            recursive: Some(true),
            input_dir: Some(PathBuf::from("/data/in")),
            ..Default::default()
        };
        PipelineConfig::apply_cli_overrides(&mut config, &cli);
        assert!(config.discovery.effective_recursive());
        assert_eq!(config.paths.input_dir, Some(PathBuf::from("/data/in")));
    }
}
