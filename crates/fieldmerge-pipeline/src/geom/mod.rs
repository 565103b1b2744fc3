//! Geometry kernel adapter.
//!
//! Thin contract over the `geo` / `geo-buffer` stack: merge, overlap
//! consolidation, offsetting, explode, shape metrics, and Boolean set
//! operations. Everything downstream talks to these functions instead of
//! the geometry crates directly.

use geo::{Area, BooleanOps, EuclideanLength, Intersects, MultiPolygon, Polygon};

use crate::layer::{BoundaryLayer, Feature};

/// Attribute carrying the number of source polygons covering a region.
pub const OVERLAP_FIELD: &str = "overlap_count";

/// Area below which a polygon is treated as numeric noise and dropped.
/// Square metres; far below any configurable floor.
const SLIVER_SQM: f64 = 1e-6;

/// Concatenate the features of several layers into one.
///
/// No geometric consolidation happens here; overlaps are resolved by
/// [`count_overlaps`].
pub fn merge(layers: &[BoundaryLayer], name: &str) -> BoundaryLayer {
    let features = layers
        .iter()
        .flat_map(|layer| layer.features.iter().cloned())
        .collect();
    BoundaryLayer::with_features(name, features)
}

/// Overlap consolidation: decompose the layer into disjoint regions, each
/// tagged with the number of input polygons covering it.
///
/// Every distinct combination of overlapping source polygons becomes its
/// own output feature carrying an `overlap_count` attribute. Input
/// attributes do not survive; the counts are the substrate for later
/// filtering.
pub fn count_overlaps(layer: &BoundaryLayer) -> BoundaryLayer {
    let mut pieces: Vec<(MultiPolygon<f64>, u32)> = Vec::new();

    for feature in &layer.features {
        let polygon = &feature.geometry;
        if polygon.0.is_empty() {
            continue;
        }
        let mut next: Vec<(MultiPolygon<f64>, u32)> = Vec::new();
        let mut remainder = polygon.clone();

        for (region, count) in &pieces {
            let covered = drop_slivers(region.intersection(polygon));
            let uncovered = drop_slivers(region.difference(polygon));
            if !covered.0.is_empty() {
                next.push((covered, count + 1));
            }
            if !uncovered.0.is_empty() {
                next.push((uncovered, *count));
            }
            if !remainder.0.is_empty() {
                remainder = drop_slivers(remainder.difference(region));
            }
        }

        if !remainder.0.is_empty() {
            next.push((remainder, 1));
        }
        pieces = next;
    }

    let features = pieces
        .into_iter()
        .map(|(region, count)| {
            Feature::new(region).with_number(OVERLAP_FIELD, f64::from(count))
        })
        .collect();

    BoundaryLayer::with_features(format!("{}_overlap", layer.name), features)
}

/// Offset a multipolygon by a signed distance in metres.
/// Negative distances erode, positive distances dilate.
pub fn buffer(geometry: &MultiPolygon<f64>, distance_m: f64) -> MultiPolygon<f64> {
    if geometry.0.is_empty() {
        return MultiPolygon::new(Vec::new());
    }
    drop_slivers(geo_buffer::buffer_multi_polygon(geometry, distance_m))
}

/// Offset a single polygon by a signed distance in metres.
pub fn buffer_polygon(polygon: &Polygon<f64>, distance_m: f64) -> MultiPolygon<f64> {
    drop_slivers(geo_buffer::buffer_polygon(polygon, distance_m))
}

/// Multipart → singlepart: each connected component becomes its own polygon.
pub fn explode(geometry: &MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    geometry.0.clone()
}

/// Planar area in square metres.
pub fn area_sqm<G: Area<f64>>(geometry: &G) -> f64 {
    geometry.unsigned_area()
}

/// Planar area in hectares.
pub fn area_ha<G: Area<f64>>(geometry: &G) -> f64 {
    geometry.unsigned_area() / 10_000.0
}

/// Boundary length of a polygon, exterior plus interior rings, in metres.
pub fn perimeter_m(polygon: &Polygon<f64>) -> f64 {
    let exterior = polygon.exterior().euclidean_length();
    let interiors: f64 = polygon
        .interiors()
        .iter()
        .map(|ring| ring.euclidean_length())
        .sum();
    exterior + interiors
}

/// Shape regularity: `4π·area / perimeter²`, in (0, 1] with 1.0 a perfect
/// circle. Degenerate polygons score 0.
pub fn compactness(polygon: &Polygon<f64>) -> f64 {
    let area = polygon.unsigned_area();
    let perimeter = perimeter_m(polygon);
    if perimeter > 0.0 {
        (4.0 * std::f64::consts::PI * area) / (perimeter * perimeter)
    } else {
        0.0
    }
}

/// Union of all feature geometries in a layer.
pub fn union_all(features: &[Feature]) -> MultiPolygon<f64> {
    let mut iter = features.iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(Vec::new());
    };
    iter.fold(first.geometry.clone(), |acc, feature| {
        acc.union(&feature.geometry)
    })
}

/// Regions present in exactly one of the two inputs.
pub fn symmetric_difference(
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> MultiPolygon<f64> {
    if a.0.is_empty() {
        return drop_slivers(b.clone());
    }
    if b.0.is_empty() {
        return drop_slivers(a.clone());
    }
    drop_slivers(a.xor(b))
}

/// Whether two geometries share any point.
pub fn intersects(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.intersects(b)
}

/// Drop zero-area components produced by Boolean/offset operations.
fn drop_slivers(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        geometry
            .0
            .into_iter()
            .filter(|polygon| polygon.unsigned_area() > SLIVER_SQM)
            .collect(),
    )
}
