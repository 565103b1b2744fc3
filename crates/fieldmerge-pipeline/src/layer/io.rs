//! GeoJSON persistence for boundary layers.
//!
//! Layers are stored as FeatureCollections of Polygon/MultiPolygon features.
//! Writes go through a sibling temp file plus rename so a declared output
//! path never holds a partial layer.

use std::fs;
use std::path::Path;

use geo::{MultiPolygon, Polygon};
use geojson::{Feature as GjFeature, FeatureCollection, GeoJson, Geometry, Value as GjValue};

use fieldmerge_core::errors::LayerError;

use super::{BoundaryLayer, Feature};

/// Read a boundary layer from a GeoJSON file.
///
/// Features with a missing geometry are skipped; non-polygonal geometries
/// are an error (the pipeline only consumes polygon layers).
pub fn read_layer(path: &Path) -> Result<BoundaryLayer, LayerError> {
    let content = fs::read_to_string(path).map_err(|e| LayerError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| LayerError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(LayerError::Parse {
                path: path.display().to_string(),
                message: "expected a FeatureCollection".to_string(),
            })
        }
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for gj_feature in collection.features {
        let Some(geometry) = gj_feature.geometry else {
            continue;
        };
        let geometry = multipolygon_from(geometry.value, path)?;
        features.push(Feature {
            geometry,
            properties: gj_feature.properties.unwrap_or_default(),
        });
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(BoundaryLayer::with_features(name, features))
}

/// Write a boundary layer to a GeoJSON file.
pub fn write_layer(path: &Path, layer: &BoundaryLayer) -> Result<(), LayerError> {
    let content = to_geojson_string(layer);
    fs::write(path, content).map_err(|e| LayerError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write a boundary layer through a temp file plus rename.
///
/// The declared path either holds the complete layer or nothing; a crash
/// mid-write leaves only the temp file behind.
pub fn write_layer_atomic(path: &Path, layer: &BoundaryLayer) -> Result<(), LayerError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = Path::new(&tmp);

    write_layer(tmp_path, layer)?;
    fs::rename(tmp_path, path).map_err(|e| LayerError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Number of features in a stored layer.
///
/// Used by the skip-if-done check: an output is considered done when it
/// exists and holds at least one feature.
pub fn feature_count(path: &Path) -> Result<usize, LayerError> {
    read_layer(path).map(|layer| layer.len())
}

fn to_geojson_string(layer: &BoundaryLayer) -> String {
    let features = layer
        .features
        .iter()
        .map(|feature| GjFeature {
            bbox: None,
            geometry: Some(Geometry::new(GjValue::from(&feature.geometry))),
            id: None,
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    GeoJson::from(collection).to_string()
}

fn multipolygon_from(value: GjValue, path: &Path) -> Result<MultiPolygon<f64>, LayerError> {
    match value {
        GjValue::Polygon(_) => {
            let polygon: Polygon<f64> = value.try_into().map_err(|e: geojson::Error| {
                LayerError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
            Ok(MultiPolygon::new(vec![polygon]))
        }
        GjValue::MultiPolygon(_) => {
            value.try_into().map_err(|e: geojson::Error| LayerError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
        other => Err(LayerError::UnsupportedGeometry {
            path: path.display().to_string(),
            kind: kind_name(&other).to_string(),
        }),
    }
}

fn kind_name(value: &GjValue) -> &'static str {
    match value {
        GjValue::Point(_) => "Point",
        GjValue::MultiPoint(_) => "MultiPoint",
        GjValue::LineString(_) => "LineString",
        GjValue::MultiLineString(_) => "MultiLineString",
        GjValue::Polygon(_) => "Polygon",
        GjValue::MultiPolygon(_) => "MultiPolygon",
        GjValue::GeometryCollection(_) => "GeometryCollection",
    }
}
