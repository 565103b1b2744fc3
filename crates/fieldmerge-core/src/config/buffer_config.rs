//! Morphological buffer configuration.

use serde::{Deserialize, Serialize};

/// Buffer distances for the morphological opening.
///
/// Both distances are stored as positive metres; the erode distance is
/// applied as a negative (inward) offset. Keeping them equal makes the
/// erode/dilate pair a true opening; they are configurable separately to
/// match the recognized options of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BufferConfig {
    /// Inward buffer distance in metres. Default: 20.0.
    pub erode_m: Option<f64>,
    /// Outward buffer distance in metres. Default: 20.0.
    pub dilate_m: Option<f64>,
}

impl BufferConfig {
    /// Returns the effective erode distance, defaulting to 20 m.
    pub fn effective_erode_m(&self) -> f64 {
        self.erode_m.unwrap_or(20.0)
    }

    /// Returns the effective dilate distance, defaulting to 20 m.
    pub fn effective_dilate_m(&self) -> f64 {
        self.dilate_m.unwrap_or(20.0)
    }
}
