//! Value raster access.
//!
//! Rasters arrive from an external pipeline as north-up ESRI ASCII grids.
//! Resolution is either a single fixed path or a per-key search with three
//! widening glob patterns, tie-broken by most recent modification time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use fieldmerge_core::config::RasterConfig;
use fieldmerge_core::errors::RasterError;

const RASTER_EXTENSION: &str = "asc";

/// A north-up, regular-grid raster of f64 values.
#[derive(Debug, Clone)]
pub struct Raster {
    ncols: usize,
    nrows: usize,
    /// Lower-left corner of the grid.
    xll: f64,
    yll: f64,
    cellsize: f64,
    nodata: Option<f64>,
    /// Row-major, row 0 at the top (north).
    values: Vec<f64>,
}

impl Raster {
    /// Read an ESRI ASCII grid from disk.
    pub fn from_ascii(path: &Path) -> Result<Self, RasterError> {
        let content = fs::read_to_string(path).map_err(|e| RasterError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ascii_str(&content, &path.display().to_string())
    }

    /// Parse an ESRI ASCII grid from a string. `label` names the source in
    /// errors.
    pub fn from_ascii_str(content: &str, label: &str) -> Result<Self, RasterError> {
        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut xll: Option<f64> = None;
        let mut yll: Option<f64> = None;
        let mut center_origin = false;
        let mut cellsize: Option<f64> = None;
        let mut nodata: Option<f64> = None;
        let mut values: Vec<f64> = Vec::new();

        for line in content.lines() {
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };

            if first.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                let value = tokens.next().ok_or_else(|| RasterError::InvalidHeader {
                    path: label.to_string(),
                    message: format!("header '{first}' has no value"),
                })?;
                match first.to_ascii_lowercase().as_str() {
                    "ncols" => ncols = value.parse().ok(),
                    "nrows" => nrows = value.parse().ok(),
                    "xllcorner" => xll = value.parse().ok(),
                    "yllcorner" => yll = value.parse().ok(),
                    "xllcenter" => {
                        xll = value.parse().ok();
                        center_origin = true;
                    }
                    "yllcenter" => {
                        yll = value.parse().ok();
                        center_origin = true;
                    }
                    "cellsize" => cellsize = value.parse().ok(),
                    "nodata_value" => nodata = value.parse().ok(),
                    other => {
                        return Err(RasterError::InvalidHeader {
                            path: label.to_string(),
                            message: format!("unknown header '{other}'"),
                        })
                    }
                }
            } else {
                for token in std::iter::once(first).chain(tokens) {
                    let v = token.parse::<f64>().map_err(|_| RasterError::Malformed {
                        path: label.to_string(),
                        message: format!("non-numeric cell value '{token}'"),
                    })?;
                    values.push(v);
                }
            }
        }

        let ncols = ncols.ok_or_else(|| missing_header(label, "ncols"))?;
        let nrows = nrows.ok_or_else(|| missing_header(label, "nrows"))?;
        let mut xll = xll.ok_or_else(|| missing_header(label, "xllcorner"))?;
        let mut yll = yll.ok_or_else(|| missing_header(label, "yllcorner"))?;
        let cellsize = cellsize.ok_or_else(|| missing_header(label, "cellsize"))?;

        if cellsize <= 0.0 {
            return Err(RasterError::InvalidHeader {
                path: label.to_string(),
                message: "cellsize must be positive".to_string(),
            });
        }
        if center_origin {
            xll -= cellsize / 2.0;
            yll -= cellsize / 2.0;
        }
        if values.len() != ncols * nrows {
            return Err(RasterError::Malformed {
                path: label.to_string(),
                message: format!(
                    "expected {} values, found {}",
                    ncols * nrows,
                    values.len()
                ),
            });
        }

        Ok(Self {
            ncols,
            nrows,
            xll,
            yll,
            cellsize,
            nodata,
            values,
        })
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Cell value at (col, row); row 0 is the northernmost row.
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.ncols + col]
    }

    /// Whether a value equals the grid's nodata marker.
    pub fn is_nodata(&self, value: f64) -> bool {
        self.nodata.is_some_and(|nd| value == nd)
    }

    /// World coordinates of a cell's center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.xll + (col as f64 + 0.5) * self.cellsize;
        let y = self.yll + (self.nrows as f64 - row as f64 - 0.5) * self.cellsize;
        (x, y)
    }

    /// Inclusive (col, row) ranges of cells whose centers may fall inside
    /// the given world-coordinate bounds. Empty ranges when disjoint.
    pub fn cells_within(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        let col_start = ((min_x - self.xll) / self.cellsize - 0.5).ceil().max(0.0) as i64;
        let col_end = ((max_x - self.xll) / self.cellsize - 0.5).floor() as i64;
        let row_start = (self.nrows as f64 - 0.5 - (max_y - self.yll) / self.cellsize)
            .ceil()
            .max(0.0) as i64;
        let row_end = (self.nrows as f64 - 0.5 - (min_y - self.yll) / self.cellsize).floor() as i64;

        let col_end = col_end.min(self.ncols as i64 - 1);
        let row_end = row_end.min(self.nrows as i64 - 1);
        if col_start > col_end || row_start > row_end {
            return None;
        }
        Some((
            col_start as usize..=col_end as usize,
            row_start as usize..=row_end as usize,
        ))
    }
}

fn missing_header(label: &str, name: &str) -> RasterError {
    RasterError::InvalidHeader {
        path: label.to_string(),
        message: format!("missing header '{name}'"),
    }
}

/// Resolve the value raster for a group key.
///
/// A fixed path wins when configured; otherwise the search directory is
/// probed with three widening patterns, and among multiple candidates the
/// most recently modified file is chosen.
pub fn resolve_raster(key: &str, config: &RasterConfig) -> Result<PathBuf, RasterError> {
    if let Some(ref fixed) = config.fixed_path {
        if fixed.exists() {
            return Ok(fixed.clone());
        }
        return Err(RasterError::NotFound {
            key: key.to_string(),
        });
    }

    let Some(ref dir) = config.search_dir else {
        return Err(RasterError::NotFound {
            key: key.to_string(),
        });
    };

    let mut patterns = vec![
        format!("Mask_{key}_*.{RASTER_EXTENSION}"),
        format!("*{key}*.{RASTER_EXTENSION}"),
    ];
    if key.len() > 3 {
        patterns.push(format!("*{}*.{RASTER_EXTENSION}", &key[1..]));
    }

    for pattern in patterns {
        let full = dir.join(&pattern);
        let hits: Vec<PathBuf> = glob::glob(&full.to_string_lossy())
            .map(|paths| paths.filter_map(Result::ok).collect())
            .unwrap_or_default();
        if !hits.is_empty() {
            return Ok(pick_most_recent(hits));
        }
    }

    Err(RasterError::NotFound {
        key: key.to_string(),
    })
}

/// Deterministic tie-break: most recently modified file wins.
fn pick_most_recent(mut paths: Vec<PathBuf>) -> PathBuf {
    if paths.len() == 1 {
        return paths.remove(0);
    }
    paths
        .into_iter()
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(UNIX_EPOCH)
        })
        .expect("non-empty candidate list")
}
