//! Boundary reconciler.
//!
//! Transforms a group of raw boundary layers into one cleaned layer:
//! merge → overlap consolidation → morphological opening (erode, filter by
//! area and compactness, dilate) → mask reconciliation → symmetric-
//! difference recovery of large, falsely rejected regions.

use std::path::Path;

use geo::MultiPolygon;

use fieldmerge_core::config::PipelineConfig;
use fieldmerge_core::errors::PipelineError;
use fieldmerge_core::naming::NamingConvention;

use crate::geom;
use crate::grouper::GroupJob;
use crate::layer::{self, BoundaryLayer, Feature};
use crate::scratch::GroupScratch;

/// Area of the eroded component, square metres.
pub const AREA_FIELD: &str = "Area";
/// Compactness of the eroded component.
pub const COMPACTNESS_FIELD: &str = "cmpness";
/// Area attribute carried by recovered symmetric-difference parts.
pub const RECOVERED_AREA_FIELD: &str = "Area_sqm";

/// Run the full reconciliation for one group.
///
/// Returns `Ok(None)` when the group degrades to a skip (no component
/// passes the floors, or nothing survives reconciliation); the caller
/// writes no output and does not mark the group failed.
pub fn reconcile_group(
    job: &GroupJob,
    mask_dir: Option<&Path>,
    naming: &dyn NamingConvention,
    config: &PipelineConfig,
    scratch: &GroupScratch,
) -> Result<Option<BoundaryLayer>, PipelineError> {
    let erode_m = config.buffer.effective_erode_m();
    let dilate_m = config.buffer.effective_dilate_m();

    // 1. Merge every layer of the group.
    let mut layers = Vec::with_capacity(job.inputs.len());
    for path in &job.inputs {
        layers.push(layer::read_layer(path)?);
    }
    let merged = geom::merge(&layers, &job.key);
    if merged.is_empty() {
        tracing::info!(group = %job.key, "inputs hold no features; skipping");
        return Ok(None);
    }
    scratch.save("merged", &merged)?;

    // 2. Overlap consolidation.
    let overlap = geom::count_overlaps(&merged);
    scratch.save("overlap", &overlap)?;

    // 3–4. Erode and measure, then filter by both floors.
    let eroded = erode_layer(&overlap, erode_m);
    scratch.save("eroded", &eroded)?;

    let filtered = filter_layer(
        &eroded,
        config.filter.effective_min_area_sqm(),
        config.filter.effective_min_compactness(),
    );
    if filtered.is_empty() {
        // 5. Empty selection degrades to a skip, not a failure.
        tracing::info!(group = %job.key, "no parts pass area/compactness floors; skipping");
        return Ok(None);
    }
    scratch.save("filtered", &filtered)?;

    // 6. Dilate the survivors back to their true extents.
    let dilated = dilate_layer(&filtered, dilate_m);
    scratch.save("dilated", &dilated)?;

    // 7–8. Mask reconciliation plus recovery, when a mask exists.
    let mut features = match load_mask_union(mask_dir, naming, &job.key)? {
        None => {
            tracing::warn!(group = %job.key, "mask layer not found; reconciliation ran unmasked");
            dilated.features
        }
        Some(mask) => {
            let reconciled = restrict_to_mask(&dilated, &mask);
            scratch.save("reconciled", &reconciled)?;

            let recovered = recover_from_diff(
                &reconciled,
                &mask,
                erode_m,
                dilate_m,
                config.filter.effective_min_recovery_area_sqm(),
            );
            scratch.save("recovered", &recovered)?;

            // 9. Union of the reconciled selection and the recovered parts.
            let mut features = reconciled.features;
            features.extend(recovered.features);
            features
        }
    };

    features.retain(|f| geom::area_sqm(&f.geometry) > 0.0);
    if features.is_empty() {
        tracing::info!(group = %job.key, "nothing survived reconciliation; skipping");
        return Ok(None);
    }

    Ok(Some(BoundaryLayer::with_features(
        naming.output_stem(&job.key),
        features,
    )))
}

/// Erode each component by `erode_m`, splitting multipart regions into
/// single connected components first, and attach area/compactness metrics
/// measured on the eroded geometry.
pub fn erode_layer(layer: &BoundaryLayer, erode_m: f64) -> BoundaryLayer {
    let mut features = Vec::new();
    for feature in &layer.features {
        for part in geom::explode(&feature.geometry) {
            let shrunk = geom::buffer_polygon(&part, -erode_m);
            for component in geom::explode(&shrunk) {
                let area = geom::area_sqm(&component);
                let compactness = geom::compactness(&component);
                let mut out = Feature {
                    geometry: MultiPolygon::new(vec![component]),
                    properties: feature.properties.clone(),
                };
                out.set_number(AREA_FIELD, area);
                out.set_number(COMPACTNESS_FIELD, compactness);
                features.push(out);
            }
        }
    }
    BoundaryLayer::with_features(format!("{}_eroded", layer.name), features)
}

/// Keep components meeting both the area and compactness floors.
pub fn filter_layer(layer: &BoundaryLayer, min_area_sqm: f64, min_compactness: f64) -> BoundaryLayer {
    let features = layer
        .features
        .iter()
        .filter(|feature| {
            feature.number(AREA_FIELD).unwrap_or(0.0) >= min_area_sqm
                && feature.number(COMPACTNESS_FIELD).unwrap_or(0.0) >= min_compactness
        })
        .cloned()
        .collect();
    BoundaryLayer::with_features(format!("{}_filtered", layer.name), features)
}

/// Dilate each surviving component by `dilate_m`, restoring the extent the
/// erosion removed. Attributes carry over unchanged (the stored metrics
/// describe the eroded form).
pub fn dilate_layer(layer: &BoundaryLayer, dilate_m: f64) -> BoundaryLayer {
    let features = layer
        .features
        .iter()
        .filter_map(|feature| {
            let grown = geom::buffer(&feature.geometry, dilate_m);
            if grown.0.is_empty() {
                return None;
            }
            Some(Feature {
                geometry: grown,
                properties: feature.properties.clone(),
            })
        })
        .collect();
    BoundaryLayer::with_features(format!("{}_dilated", layer.name), features)
}

/// Keep polygons that spatially intersect the mask.
pub fn restrict_to_mask(layer: &BoundaryLayer, mask: &MultiPolygon<f64>) -> BoundaryLayer {
    let features = layer
        .features
        .iter()
        .filter(|feature| geom::intersects(&feature.geometry, mask))
        .cloned()
        .collect();
    BoundaryLayer::with_features(format!("{}_reconciled", layer.name), features)
}

/// Recover large mask-supported regions the opening dropped.
///
/// Symmetric difference between the reconciled selection and the mask,
/// eroded and exploded; parts at or above the recovery floor that do not
/// intersect the reconciled selection are dilated back and returned.
pub fn recover_from_diff(
    reconciled: &BoundaryLayer,
    mask: &MultiPolygon<f64>,
    erode_m: f64,
    dilate_m: f64,
    min_recovery_area_sqm: f64,
) -> BoundaryLayer {
    let selection = geom::union_all(&reconciled.features);
    let diff = geom::symmetric_difference(&selection, mask);
    let eroded = geom::buffer(&diff, -erode_m);

    let mut features = Vec::new();
    for part in geom::explode(&eroded) {
        let area = geom::area_sqm(&part);
        if area < min_recovery_area_sqm {
            continue;
        }
        let part = MultiPolygon::new(vec![part]);
        if geom::intersects(&part, &selection) {
            continue;
        }
        let grown = geom::buffer(&part, dilate_m);
        if grown.0.is_empty() {
            continue;
        }
        features.push(Feature::new(grown).with_number(RECOVERED_AREA_FIELD, area));
    }

    BoundaryLayer::with_features(format!("{}_recovered", reconciled.name), features)
}

/// Union of the group's mask layer, when one exists.
///
/// A missing mask directory, a missing file, or an empty mask layer all
/// degrade to `None` (reconciliation runs unmasked).
fn load_mask_union(
    mask_dir: Option<&Path>,
    naming: &dyn NamingConvention,
    group_key: &str,
) -> Result<Option<MultiPolygon<f64>>, PipelineError> {
    let Some(dir) = mask_dir else {
        return Ok(None);
    };
    let mask_key = naming.mask_key(group_key);
    let path = dir.join(naming.mask_file_name(&mask_key));
    if !path.exists() {
        return Ok(None);
    }
    let mask = layer::read_layer(&path)?;
    if mask.is_empty() {
        tracing::warn!(mask = %path.display(), "mask layer is empty; treating as absent");
        return Ok(None);
    }
    Ok(Some(geom::union_all(&mask.features)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn rect_feature(x0: f64, y0: f64, w: f64, h: f64) -> Feature {
        Feature::new(MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + w, y: y0),
            (x: x0 + w, y: y0 + h),
            (x: x0, y: y0 + h),
        ]]))
    }

    fn rect_mp(x0: f64, y0: f64, w: f64, h: f64) -> MultiPolygon<f64> {
        rect_feature(x0, y0, w, h).geometry
    }

    #[test]
    fn erode_attaches_metrics_of_eroded_form() {
        let layer = BoundaryLayer::with_features("t", vec![rect_feature(0.0, 0.0, 300.0, 200.0)]);
        let eroded = erode_layer(&layer, 20.0);
        assert_eq!(eroded.len(), 1);

        let feature = &eroded.features[0];
        // 260 × 160 after a 20 m erosion.
        assert_relative_eq!(feature.number(AREA_FIELD).unwrap(), 41_600.0, epsilon = 10.0);
        let expected_cmp = 4.0 * std::f64::consts::PI * 41_600.0 / (840.0_f64 * 840.0);
        assert_relative_eq!(
            feature.number(COMPACTNESS_FIELD).unwrap(),
            expected_cmp,
            epsilon = 1e-2
        );
    }

    #[test]
    fn filter_applies_both_floors() {
        let mut big_compact = rect_feature(0.0, 0.0, 1.0, 1.0);
        big_compact.set_number(AREA_FIELD, 60_000.0);
        big_compact.set_number(COMPACTNESS_FIELD, 0.6);

        let mut big_stringy = rect_feature(0.0, 0.0, 1.0, 1.0);
        big_stringy.set_number(AREA_FIELD, 55_000.0);
        big_stringy.set_number(COMPACTNESS_FIELD, 0.1);

        let mut small_compact = rect_feature(0.0, 0.0, 1.0, 1.0);
        small_compact.set_number(AREA_FIELD, 5_000.0);
        small_compact.set_number(COMPACTNESS_FIELD, 0.7);

        let layer =
            BoundaryLayer::with_features("t", vec![big_compact, big_stringy, small_compact]);
        let filtered = filter_layer(&layer, 50_000.0, 0.3);

        assert_eq!(filtered.len(), 1);
        assert_relative_eq!(filtered.features[0].number(AREA_FIELD).unwrap(), 60_000.0);
    }

    #[test]
    fn restrict_keeps_only_mask_intersecting_polygons() {
        let inside = rect_feature(0.0, 0.0, 100.0, 100.0);
        let outside = rect_feature(1000.0, 0.0, 100.0, 100.0);
        let layer = BoundaryLayer::with_features("t", vec![inside, outside]);

        let mask = rect_mp(50.0, 50.0, 500.0, 500.0);
        let restricted = restrict_to_mask(&layer, &mask);
        assert_eq!(restricted.len(), 1);
    }

    #[test]
    fn recovery_keeps_large_disjoint_mask_regions_only() {
        // Selection occupies one corner; the mask also covers a large
        // disjoint block and a small one.
        let selection = BoundaryLayer::with_features("t", vec![rect_feature(0.0, 0.0, 500.0, 500.0)]);
        let mask_large = rect_mp(2000.0, 0.0, 800.0, 800.0); // 640 000 m²
        let mask_small = rect_mp(4000.0, 0.0, 200.0, 200.0); // 40 000 m²
        let mask = MultiPolygon::new(vec![mask_large.0[0].clone(), mask_small.0[0].clone()]);

        let recovered = recover_from_diff(&selection, &mask, 20.0, 20.0, 300_000.0);

        assert_eq!(recovered.len(), 1);
        let geometry = &recovered.features[0].geometry;
        // Restored to roughly the 800 × 800 mask block.
        assert_relative_eq!(geom::area_sqm(geometry), 640_000.0, epsilon = 2_000.0);
        // The recovery never touches the reconciled selection.
        assert!(!geom::intersects(geometry, &geom::union_all(&selection.features)));
    }

    #[test]
    fn recovery_drops_parts_intersecting_the_selection() {
        // A large selection outside the mask shows up in the symmetric
        // difference above the recovery floor; the intersects filter must
        // drop it so the selection is never duplicated into the recovery.
        let selection = BoundaryLayer::with_features("t", vec![rect_feature(0.0, 0.0, 700.0, 700.0)]);
        let mask = rect_mp(2000.0, 0.0, 800.0, 800.0);

        let recovered = recover_from_diff(&selection, &mask, 20.0, 20.0, 300_000.0);

        // Only the disjoint mask block comes back, not the selection's own
        // uncovered area (490 000 m², above the floor, but intersecting).
        assert_eq!(recovered.len(), 1);
        assert_relative_eq!(
            geom::area_sqm(&recovered.features[0].geometry),
            640_000.0,
            epsilon = 2_000.0
        );
    }
}
