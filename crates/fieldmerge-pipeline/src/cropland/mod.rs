//! Cropland gate — zonal statistics join and threshold selection.
//!
//! Every cleaned polygon gets a stable zone id, the mean of the value
//! raster within its footprint, and a hectare area; polygons pass when both
//! the area and the mean clear their configured floors. Survivors keep only
//! the mean and area attributes.

use geo::{BoundingRect, Contains, MultiPolygon, Point};

use fieldmerge_core::config::CroplandConfig;

use crate::geom;
use crate::layer::{BoundaryLayer, Feature};
use crate::raster::Raster;

/// Stable integer zone identifier used for the statistics join.
pub const ZONE_FIELD: &str = "zone_id";
/// Zonal mean of the value raster.
pub const MEAN_FIELD: &str = "mean_val";
/// Polygon area in hectares.
pub const AREA_HA_FIELD: &str = "area_ha";

/// Mean of raster cells whose centers fall inside the geometry.
///
/// Returns `None` when no cell center is sampled (polygon smaller than a
/// cell, or fully outside the grid, or all cells nodata).
pub fn zonal_mean(
    raster: &Raster,
    geometry: &MultiPolygon<f64>,
    ignore_nodata: bool,
) -> Option<f64> {
    let bounds = geometry.bounding_rect()?;
    let (cols, rows) = raster.cells_within(
        bounds.min().x,
        bounds.min().y,
        bounds.max().x,
        bounds.max().y,
    )?;

    let mut sum = 0.0;
    let mut count = 0usize;
    for row in rows {
        for col in cols.clone() {
            let value = raster.value(col, row);
            if ignore_nodata && raster.is_nodata(value) {
                continue;
            }
            let (x, y) = raster.cell_center(col, row);
            if geometry.contains(&Point::new(x, y)) {
                sum += value;
                count += 1;
            }
        }
    }

    (count > 0).then(|| sum / count as f64)
}

/// Apply the zonal-statistics gate to a cleaned layer.
///
/// Polygons with `area_ha > min_ha` and a zonal mean above `min_mean` are
/// retained; a polygon with no mean is excluded regardless of area. All
/// attributes other than the mean and area are dropped.
pub fn apply_cropland_gate(
    cleaned: &BoundaryLayer,
    raster: &Raster,
    config: &CroplandConfig,
) -> BoundaryLayer {
    let min_ha = config.effective_min_ha();
    let min_mean = config.effective_min_mean();
    let ignore_nodata = config.effective_ignore_nodata();

    let mut selected = Vec::new();
    for (index, feature) in cleaned.features.iter().enumerate() {
        // Zone ids are assigned from feature order when absent; they exist
        // to make the join stable, not to survive into the output.
        let zone_id = feature
            .number(ZONE_FIELD)
            .unwrap_or(index as f64);

        let mean = zonal_mean(raster, &feature.geometry, ignore_nodata);
        let area_ha = geom::area_ha(&feature.geometry);

        let Some(mean) = mean else {
            tracing::debug!(zone = zone_id, "no raster cells sampled; excluded");
            continue;
        };
        if area_ha <= min_ha || mean <= min_mean {
            continue;
        }

        let mut out = Feature::new(feature.geometry.clone());
        out.set_number(MEAN_FIELD, mean);
        out.set_number(AREA_HA_FIELD, area_ha);
        selected.push(out);
    }

    BoundaryLayer::with_features(format!("{}_cropland", cleaned.name), selected)
}
