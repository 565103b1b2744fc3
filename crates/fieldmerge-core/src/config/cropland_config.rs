//! Cropland gate configuration.

use serde::{Deserialize, Serialize};

/// Thresholds for the zonal-statistics-gated final selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CroplandConfig {
    /// Minimum polygon area in hectares. Default: 5.0.
    pub min_ha: Option<f64>,
    /// Minimum zonal mean of the value raster. Default: 0.5.
    pub min_mean: Option<f64>,
    /// Skip nodata cells when computing the zonal mean. Default: true.
    pub ignore_nodata: Option<bool>,
}

impl CroplandConfig {
    /// Returns the effective hectare floor, defaulting to 5.0 ha.
    pub fn effective_min_ha(&self) -> f64 {
        self.min_ha.unwrap_or(5.0)
    }

    /// Returns the effective zonal-mean floor, defaulting to 0.5.
    pub fn effective_min_mean(&self) -> f64 {
        self.min_mean.unwrap_or(0.5)
    }

    /// Whether nodata cells are ignored, defaulting to true.
    pub fn effective_ignore_nodata(&self) -> bool {
        self.ignore_nodata.unwrap_or(true)
    }
}
