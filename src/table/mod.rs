// src/table/mod.rs

use anyhow::{anyhow, bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::config::Config;

mod delimited;
mod sheet;

/// Header names the loader requires.
pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "long";

/// One coordinate row. `index` is the zero-based data-row position and
/// doubles as the output filename.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
}

/// Records of one input file, in file order. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct Table {
    source: PathBuf,
    records: Vec<Record>,
}

impl Table {
    pub fn new(source: impl Into<PathBuf>, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `limit` records. `None` and `Some(0)` both mean every record.
    pub fn head(&self, limit: Option<usize>) -> &[Record] {
        match limit {
            Some(n) if n > 0 => &self.records[..n.min(self.records.len())],
            _ => &self.records,
        }
    }
}

/// Load a table, picking the parser from the file extension.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let records = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => sheet::read_workbook(path),
        "csv" => delimited::read_csv(path),
        other => Err(anyhow!("unsupported table format `{}`", other)),
    }
    .with_context(|| format!("loading table {}", path.display()))?;

    info!(table = %path.display(), rows = records.len(), "loaded table");
    Ok(Table::new(path, records))
}

/// Create `<images_dir>/<split>` for every configured split. Existing
/// directories are left alone.
pub fn prepare_output_dirs(config: &Config) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::with_capacity(config.splits.len());
    for split in &config.splits {
        let dir = config.split_dir(&split.name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        debug!(dir = %dir.display(), "output directory ready");
        dirs.push(dir);
    }
    Ok(dirs)
}

/// Positions of the latitude and longitude columns within a header row.
pub(crate) fn locate_columns<S: AsRef<str>>(headers: &[S]) -> Result<(usize, usize)> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.as_ref().trim() == name)
            .ok_or_else(|| anyhow!("missing column `{}`", name))
    };
    Ok((find(LAT_COLUMN)?, find(LON_COLUMN)?))
}

pub(crate) fn parse_coordinate(text: &str, index: usize, column: &str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("row {}: empty `{}` value", index, column);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| anyhow!("row {}: `{}` value {:?} is not a number", index, column, trimmed))?;
    if !value.is_finite() {
        bail!("row {}: `{}` value {:?} is not finite", index, column, trimmed);
    }
    Ok(value)
}
