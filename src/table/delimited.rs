use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

use super::{locate_columns, parse_coordinate, Record, LAT_COLUMN, LON_COLUMN};

/// Read a headed CSV file into records.
pub(crate) fn read_csv(path: &Path) -> Result<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let (lat_col, lon_col) = locate_columns(&header_names)?;

    let mut records = Vec::new();
    for (index, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("reading CSV row {}", index))?;
        let lat = parse_coordinate(row.get(lat_col).unwrap_or(""), index, LAT_COLUMN)?;
        let lon = parse_coordinate(row.get(lon_col).unwrap_or(""), index, LON_COLUMN)?;
        records.push(Record { index, lat, lon });
    }
    Ok(records)
}
