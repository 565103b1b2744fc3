//! Default naming convention: underscore-delimited stems with year tokens.

use regex::Regex;

use super::NamingConvention;

const BOUNDARY_PREFIX: &str = "Boundary_";

/// Default convention for stems like `Boundary_ON_Field_2019_07`.
///
/// A year token is a 4-digit number in 1900–2099 preceded by `_` and
/// followed by `_` or end-of-string. The leading token of a stem is never
/// treated as a year (it has no underscore on its left).
pub struct YearStripNaming {
    year_token: Regex,
    year_capture: Regex,
    raster_capture: Regex,
}

impl YearStripNaming {
    pub fn new() -> Self {
        Self {
            year_token: Regex::new(r"^(?:19|20)\d{2}$").expect("static regex"),
            year_capture: Regex::new(r"_(\d{4})(?:_|$)").expect("static regex"),
            raster_capture: Regex::new(r"(?i)^Boundary_[A-Za-z]{2}_(.+?)_\d+_intersect$")
                .expect("static regex"),
        }
    }

    fn is_year_token(&self, token: &str) -> bool {
        self.year_token.is_match(token)
    }
}

impl Default for YearStripNaming {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingConvention for YearStripNaming {
    fn group_key(&self, stem: &str) -> String {
        // Year stripping operates on the raw underscore structure; only
        // then are remaining non-alphanumerics normalized.
        let stripped: Vec<&str> = stem
            .split('_')
            .enumerate()
            .filter(|(i, token)| *i == 0 || !self.is_year_token(token))
            .map(|(_, token)| token)
            .collect();
        normalize(&stripped.join("_"))
    }

    fn extract_year(&self, stem: &str) -> Option<u16> {
        let captures = self.year_capture.captures(stem)?;
        let year: u16 = captures.get(1)?.as_str().parse().ok()?;
        (1900..=2099).contains(&year).then_some(year)
    }

    fn mask_key(&self, group_key: &str) -> String {
        group_key
            .strip_prefix(BOUNDARY_PREFIX)
            .unwrap_or(group_key)
            .to_string()
    }

    fn raster_key(&self, cleaned_stem: &str) -> String {
        if let Some(captures) = self.raster_capture.captures(cleaned_stem) {
            return captures[1].to_string();
        }
        let parts: Vec<&str> = cleaned_stem.split('_').collect();
        if parts.len() >= 3 {
            parts[2].to_string()
        } else {
            cleaned_stem.to_string()
        }
    }
}

/// Replace non-alphanumeric runs with single underscores and trim.
fn normalize(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut last_was_sep = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_year_tokens() {
        let naming = YearStripNaming::new();
        assert_eq!(
            naming.group_key("Boundary_ON_Field_2019_07"),
            "Boundary_ON_Field_07"
        );
        assert_eq!(
            naming.group_key("Boundary_ON_Field_2021_07"),
            "Boundary_ON_Field_07"
        );
    }

    #[test]
    fn same_region_across_years_shares_group_key() {
        let naming = YearStripNaming::new();
        assert_eq!(
            naming.group_key("Boundary_ON_Field_2019_07"),
            naming.group_key("Boundary_ON_Field_2021_07")
        );
    }

    #[test]
    fn invalid_year_grouped_literally() {
        let naming = YearStripNaming::new();
        assert_eq!(
            naming.group_key("Boundary_ON_Field_99_07"),
            "Boundary_ON_Field_99_07"
        );
        assert_eq!(naming.extract_year("Boundary_ON_Field_99_07"), None);
    }

    #[test]
    fn adjacent_year_tokens_all_stripped() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.group_key("A_2019_2020"), "A");
    }

    #[test]
    fn leading_token_never_stripped() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.group_key("2019_B"), "2019_B");
    }

    #[test]
    fn year_outside_range_kept() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.group_key("A_1899_B"), "A_1899_B");
        assert_eq!(naming.group_key("A_2100_B"), "A_2100_B");
        assert_eq!(naming.extract_year("A_1899_B"), None);
    }

    #[test]
    fn extracts_year_in_range() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.extract_year("Boundary_ON_Field_2019_07"), Some(2019));
        assert_eq!(naming.extract_year("Boundary_ON_Field_2021"), Some(2021));
    }

    #[test]
    fn normalizes_punctuation_to_underscores() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.group_key("Boundary ON-Field!!07"), "Boundary_ON_Field_07");
        assert_eq!(naming.group_key("_Boundary__ON_"), "Boundary_ON");
    }

    #[test]
    fn mask_key_strips_boundary_prefix() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.mask_key("Boundary_ON_Field_07"), "ON_Field_07");
        assert_eq!(naming.mask_key("ON_Field_07"), "ON_Field_07");
    }

    #[test]
    fn raster_key_from_cleaned_stem() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.raster_key("Boundary_ON_Field_07_intersect"), "Field");
        // Fallback: third underscore-separated token.
        assert_eq!(naming.raster_key("a_b_c_d"), "c");
        assert_eq!(naming.raster_key("a_b"), "a_b");
    }

    #[test]
    fn output_and_mask_names() {
        let naming = YearStripNaming::new();
        assert_eq!(naming.output_stem("Boundary_ON_Field_07"), "Boundary_ON_Field_07_intersect");
        assert_eq!(naming.cropland_stem("X_intersect"), "X_intersect_cropland");
        assert_eq!(naming.mask_file_name("ON_Field_07"), "ON_Field_07_mask_final.geojson");
    }
}
