//! Naming conventions — group keys, mask keys, raster keys.
//!
//! File-name glue is formalized as a pluggable strategy so alternate
//! conventions can be substituted without touching the reconciliation
//! algorithm.

pub mod year_strip;

pub use year_strip::YearStripNaming;

/// Strategy mapping layer file stems to the keys the pipeline joins on.
pub trait NamingConvention: Send + Sync {
    /// Canonical group key for a raw layer stem: year tokens removed,
    /// non-alphanumeric runs normalized to single underscores.
    ///
    /// Two raw layers belong to the same group iff their group keys are
    /// equal.
    fn group_key(&self, stem: &str) -> String;

    /// Acquisition year encoded in the stem, if any (1900–2099, bounded by
    /// underscores or end-of-string).
    fn extract_year(&self, stem: &str) -> Option<u16>;

    /// Mask key for a group key: the known boundary prefix stripped.
    fn mask_key(&self, group_key: &str) -> String;

    /// Raster search key for a cleaned-layer stem.
    fn raster_key(&self, cleaned_stem: &str) -> String;

    /// Output stem for a group's cleaned boundary layer.
    fn output_stem(&self, group_key: &str) -> String {
        format!("{group_key}_intersect")
    }

    /// Output stem for a cleaned layer's cropland selection.
    fn cropland_stem(&self, cleaned_stem: &str) -> String {
        format!("{cleaned_stem}_cropland")
    }

    /// Mask layer file name for a mask key.
    fn mask_file_name(&self, mask_key: &str) -> String {
        format!("{mask_key}_mask_final.geojson")
    }
}
