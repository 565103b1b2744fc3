//! Boundary layer data model.
//!
//! A layer is an immutable, named set of polygon features. Every pipeline
//! stage consumes layers and returns new ones; nothing is mutated in place.

pub mod io;

pub use io::{feature_count, read_layer, write_layer, write_layer_atomic};

use geo::MultiPolygon;
use serde_json::{Map, Value};

/// Attribute set of a feature.
pub type Properties = Map<String, Value>;

/// One polygon feature: geometry plus arbitrary attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub properties: Properties,
}

impl Feature {
    /// Create a feature with no attributes.
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_number(mut self, key: &str, value: f64) -> Self {
        self.set_number(key, value);
        self
    }

    /// Read a numeric attribute, if present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// Set a numeric attribute.
    pub fn set_number(&mut self, key: &str, value: f64) {
        if let Some(v) = serde_json::Number::from_f64(value) {
            self.properties.insert(key.to_string(), Value::Number(v));
        }
    }
}

/// A named set of polygon features.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    pub name: String,
    pub features: Vec<Feature>,
}

impl BoundaryLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
        }
    }

    pub fn with_features(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
