//! End-to-end pipeline tests: reconciliation, mask recovery, the cropland
//! gate, idempotence, and per-group failure isolation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geo::{polygon, MultiPolygon};

use fieldmerge_core::config::PipelineConfig;
use fieldmerge_core::events::{GroupSkippedEvent, RunEventHandler, SkipReason};
use fieldmerge_pipeline::{geom, layer, read_layer, BoundaryLayer, Feature, Runner};

fn rect_feature(x0: f64, y0: f64, w: f64, h: f64) -> Feature {
    Feature::new(MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x0 + w, y: y0),
        (x: x0 + w, y: y0 + h),
        (x: x0, y: y0 + h),
    ]]))
}

fn write_input(dir: &Path, stem: &str, features: Vec<Feature>) {
    let boundary = BoundaryLayer::with_features(stem, features);
    layer::write_layer(&dir.join(format!("{stem}.geojson")), &boundary).unwrap();
}

fn write_uniform_raster(path: &Path, value: f64) {
    // 42 × 12 grid of 100 m cells covering the whole test scene.
    let mut content =
        String::from("ncols 42\nnrows 12\nxllcorner -200\nyllcorner -200\ncellsize 100\nNODATA_value -9999\n");
    for _ in 0..12 {
        content.push_str(&vec![value.to_string(); 42].join(" "));
        content.push('\n');
    }
    fs::write(path, content).unwrap();
}

struct Scene {
    _input: tempfile::TempDir,
    _output: tempfile::TempDir,
    _mask: tempfile::TempDir,
    _scratch: tempfile::TempDir,
    config: PipelineConfig,
    cleaned_path: PathBuf,
    cropland_path: PathBuf,
}

/// Three overlapping raw polygons split across two acquisition years:
/// - A: 416 × 144 m (59 904 m², compactness ≈ 0.60)
/// - B: 1270 × 43.3 m (54 991 m², compactness ≈ 0.10), clipping A's corner
/// - C: 71 × 70.5 m (5 006 m², compactness ≈ 0.79), clipping A's corner
///
/// The mask covers A plus a large disjoint block that only recovery can
/// bring back.
fn build_scene(with_mask: bool, with_raster: bool) -> Scene {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mask = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    let a = rect_feature(0.0, 0.0, 416.0, 144.0);
    let b = rect_feature(380.0, -23.3, 1270.0, 43.3);
    let c = rect_feature(390.0, 120.0, 71.0, 70.5);
    write_input(input.path(), "Boundary_ON_Field_2019_07", vec![a, c]);
    write_input(input.path(), "Boundary_ON_Field_2021_07", vec![b]);

    if with_mask {
        let near = rect_feature(-100.0, -100.0, 700.0, 400.0);
        let far = rect_feature(3000.0, 0.0, 700.0, 700.0);
        let mask_layer = BoundaryLayer::with_features("mask", vec![near, far]);
        layer::write_layer(
            &mask.path().join("ON_Field_07_mask_final.geojson"),
            &mask_layer,
        )
        .unwrap();
    }

    let mut config = PipelineConfig::default();
    config.paths.input_dir = Some(input.path().to_path_buf());
    config.paths.output_dir = Some(output.path().to_path_buf());
    config.paths.mask_dir = with_mask.then(|| mask.path().to_path_buf());
    config.buffer.erode_m = Some(5.0);
    config.buffer.dilate_m = Some(5.0);
    config.filter.min_area_sqm = Some(50_000.0);
    config.filter.min_compactness = Some(0.3);
    config.filter.min_recovery_area_sqm = Some(300_000.0);
    config.cropland.min_ha = Some(30.0);
    config.cropland.min_mean = Some(0.5);
    config.scratch.parent_override = Some(scratch.path().to_path_buf());

    if with_raster {
        let raster_path = mask.path().join("likelihood.asc");
        write_uniform_raster(&raster_path, 0.7);
        config.raster.fixed_path = Some(raster_path);
    }

    let cleaned_path = output.path().join("Boundary_ON_Field_07_intersect.geojson");
    let cropland_path = output
        .path()
        .join("Boundary_ON_Field_07_intersect_cropland.geojson");

    Scene {
        _input: input,
        _output: output,
        _mask: mask,
        _scratch: scratch,
        config,
        cleaned_path,
        cropland_path,
    }
}

/// Morphological opening keeps the compact polygon's region, discards the
/// low-compactness strip and the under-sized polygon, and restores the
/// survivor to within buffer-rounding tolerance of its pre-erosion extent.
#[test]
fn end_to_end_opening_mask_recovery_and_gate() {
    let scene = build_scene(true, true);
    let summary = Runner::new(scene.config.clone()).run().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.warnings, 0);
    assert_eq!(summary.missing_raster, 0);

    let cleaned = read_layer(&scene.cleaned_path).unwrap();
    assert_eq!(cleaned.len(), 2);

    // Area floor invariant: nothing below 50 000 m² survives either path.
    for feature in &cleaned.features {
        assert!(geom::area_sqm(&feature.geometry) >= 50_000.0);
    }

    let mut areas: Vec<f64> = cleaned
        .features
        .iter()
        .map(|f| geom::area_sqm(&f.geometry))
        .collect();
    areas.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // The opened survivor: polygon A minus the two corner clips
    // (59 904 − 720 − 624 ≈ 58 560 m²), restored by the dilation.
    assert!((areas[0] - 58_560.0).abs() < 1_500.0, "got {}", areas[0]);
    // The recovered mask block: 700 × 700 m.
    assert!((areas[1] - 490_000.0).abs() < 5_000.0, "got {}", areas[1]);

    // The recovered feature never intersects the reconciled selection
    // before the union; post-union they remain disjoint here.
    let recovered = cleaned
        .features
        .iter()
        .find(|f| f.number("Area_sqm").is_some())
        .expect("recovered feature carries its eroded area");
    assert!(geom::area_sqm(&recovered.geometry) > 400_000.0);

    // Cropland gate: only the 49 ha recovered block clears min_ha = 30;
    // the 5.9 ha survivor does not. Exactly two attributes are retained.
    let cropland = read_layer(&scene.cropland_path).unwrap();
    assert_eq!(cropland.len(), 1);
    let selected = &cropland.features[0];
    assert_eq!(selected.properties.len(), 2);
    let mean = selected.number("mean_val").unwrap();
    let area_ha = selected.number("area_ha").unwrap();
    assert!((mean - 0.7).abs() < 1e-6, "got {mean}");
    assert!((area_ha - 49.0).abs() < 0.5, "got {area_ha}");
}

/// Without a mask layer the pipeline keeps the dilated selection unchanged
/// and runs no recovery.
#[test]
fn mask_absence_degrades_gracefully() {
    let scene = build_scene(false, false);
    let summary = Runner::new(scene.config.clone()).run().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.warnings, 0);

    let cleaned = read_layer(&scene.cleaned_path).unwrap();
    assert_eq!(cleaned.len(), 1);
    let area = geom::area_sqm(&cleaned.features[0].geometry);
    assert!((area - 58_560.0).abs() < 1_500.0, "got {area}");

    // No raster configured: gate skipped without counting as missing.
    assert_eq!(summary.missing_raster, 0);
    assert!(!scene.cropland_path.exists());
}

struct SkipCollector {
    already_done: AtomicUsize,
    empty_selection: AtomicUsize,
}

impl RunEventHandler for SkipCollector {
    fn on_group_skipped(&self, event: &GroupSkippedEvent) {
        match event.reason {
            SkipReason::AlreadyDone => self.already_done.fetch_add(1, Ordering::Relaxed),
            SkipReason::EmptySelection => self.empty_selection.fetch_add(1, Ordering::Relaxed),
        };
    }
}

/// A second run over the same inputs rewrites nothing and reports every
/// group as already processed.
#[test]
fn second_run_is_idempotent() {
    let scene = build_scene(true, true);

    let first = Runner::new(scene.config.clone()).run().unwrap();
    assert_eq!(first.processed, 1);
    let cleaned_bytes = fs::read(&scene.cleaned_path).unwrap();

    let collector = Arc::new(SkipCollector {
        already_done: AtomicUsize::new(0),
        empty_selection: AtomicUsize::new(0),
    });
    let second = Runner::new(scene.config.clone())
        .with_handler(collector.clone())
        .run()
        .unwrap();

    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.warnings, 0);
    assert_eq!(collector.already_done.load(Ordering::Relaxed), 1);

    // Byte-identical output.
    assert_eq!(fs::read(&scene.cleaned_path).unwrap(), cleaned_bytes);
}

/// Groups where nothing passes the floors produce no output and do not
/// fail the run.
#[test]
fn empty_selection_skips_without_output() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    // A narrow strip that the erosion removes entirely.
    write_input(
        input.path(),
        "Boundary_XX_Sliver_2020_01",
        vec![rect_feature(0.0, 0.0, 1000.0, 8.0)],
    );

    let mut config = PipelineConfig::default();
    config.paths.input_dir = Some(input.path().to_path_buf());
    config.paths.output_dir = Some(output.path().to_path_buf());
    config.buffer.erode_m = Some(5.0);
    config.buffer.dilate_m = Some(5.0);
    config.scratch.parent_override = Some(scratch.path().to_path_buf());

    let collector = Arc::new(SkipCollector {
        already_done: AtomicUsize::new(0),
        empty_selection: AtomicUsize::new(0),
    });
    let summary = Runner::new(config)
        .with_handler(collector.clone())
        .run()
        .unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.warnings, 0);
    assert_eq!(collector.empty_selection.load(Ordering::Relaxed), 1);
    assert!(!output
        .path()
        .join("Boundary_XX_Sliver_01_intersect.geojson")
        .exists());
}

/// A corrupt group is isolated as a warning; the rest of the run continues
/// and no partial output is left for the failed group.
#[test]
fn corrupt_group_is_isolated() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();

    write_input(
        input.path(),
        "Boundary_AA_Good_2020_01",
        vec![rect_feature(0.0, 0.0, 500.0, 500.0)],
    );
    fs::write(input.path().join("Boundary_BB_Bad_2020_01.geojson"), "not json").unwrap();

    let mut config = PipelineConfig::default();
    config.paths.input_dir = Some(input.path().to_path_buf());
    config.paths.output_dir = Some(output.path().to_path_buf());
    config.buffer.erode_m = Some(5.0);
    config.buffer.dilate_m = Some(5.0);
    config.filter.min_area_sqm = Some(50_000.0);
    config.scratch.parent_override = Some(scratch.path().to_path_buf());

    let summary = Runner::new(config).run().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.warnings, 1);
    assert!(output
        .path()
        .join("Boundary_AA_Good_01_intersect.geojson")
        .exists());
    assert!(!output
        .path()
        .join("Boundary_BB_Bad_01_intersect.geojson")
        .exists());
}

/// A configured per-key raster search with no hits counts the group as
/// missing while the cleaned layer is still written.
#[test]
fn missing_raster_is_counted_not_fatal() {
    let scene = build_scene(true, false);
    let empty_raster_dir = tempfile::tempdir().unwrap();

    let mut config = scene.config.clone();
    config.raster.search_dir = Some(empty_raster_dir.path().to_path_buf());

    let summary = Runner::new(config).run().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.missing_raster, 1);
    assert_eq!(summary.warnings, 0);
    assert!(scene.cleaned_path.exists());
    assert!(!scene.cropland_path.exists());
}
