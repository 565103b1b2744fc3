//! Shape filter configuration.

use serde::{Deserialize, Serialize};

/// Floors applied to eroded components during the opening, plus the larger
/// floor used by symmetric-difference recovery.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum component area in square metres. Default: 50 000.
    pub min_area_sqm: Option<f64>,
    /// Minimum compactness (4πA/P²) in (0, 1]. Default: 0.3.
    pub min_compactness: Option<f64>,
    /// Minimum area for recovered symmetric-difference parts, in square
    /// metres. Default: 300 000.
    pub min_recovery_area_sqm: Option<f64>,
}

impl FilterConfig {
    /// Returns the effective minimum area, defaulting to 50 000 m².
    pub fn effective_min_area_sqm(&self) -> f64 {
        self.min_area_sqm.unwrap_or(50_000.0)
    }

    /// Returns the effective compactness floor, defaulting to 0.3.
    pub fn effective_min_compactness(&self) -> f64 {
        self.min_compactness.unwrap_or(0.3)
    }

    /// Returns the effective recovery floor, defaulting to 300 000 m².
    pub fn effective_min_recovery_area_sqm(&self) -> f64 {
        self.min_recovery_area_sqm.unwrap_or(300_000.0)
    }
}
