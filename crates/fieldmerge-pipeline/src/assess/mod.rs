//! Accuracy assessment.
//!
//! Intersection-over-union between a predicted boundary layer and a
//! reference layer, for validating reconciliation output against ground
//! truth.

use geo::BooleanOps;

use crate::geom;
use crate::layer::BoundaryLayer;

/// Intersection over union of two polygon layers, in [0, 1].
/// Returns 0.0 when the union is empty.
pub fn iou(predicted: &BoundaryLayer, reference: &BoundaryLayer) -> f64 {
    let p = geom::union_all(&predicted.features);
    let r = geom::union_all(&reference.features);
    if p.0.is_empty() || r.0.is_empty() {
        return 0.0;
    }

    let intersection = geom::area_sqm(&p.intersection(&r));
    let union = geom::area_sqm(&p.union(&r));

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
