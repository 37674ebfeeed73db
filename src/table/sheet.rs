use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use super::{locate_columns, parse_coordinate, Record, LAT_COLUMN, LON_COLUMN};

/// Read the first worksheet of a workbook. Row 0 is the header; blank rows
/// are skipped and do not consume an index.
pub(crate) fn read_workbook(path: &Path) -> Result<Vec<Record>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .context("reading first worksheet")?;
    records_from_range(&range)
}

pub(crate) fn records_from_range(range: &Range<Data>) -> Result<Vec<Record>> {
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => bail!("worksheet is empty"),
    };
    let (lat_col, lon_col) = locate_columns(&header)?;

    rows.filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)))
        .enumerate()
        .map(|(index, row)| -> Result<Record> {
            Ok(Record {
                index,
                lat: cell_value(row.get(lat_col), index, LAT_COLUMN)?,
                lon: cell_value(row.get(lon_col), index, LON_COLUMN)?,
            })
        })
        .collect()
}

fn cell_value(cell: Option<&Data>, index: usize, column: &str) -> Result<f64> {
    match cell {
        Some(Data::Float(f)) if f.is_finite() => Ok(*f),
        Some(Data::Int(i)) => Ok(*i as f64),
        Some(Data::String(s)) => parse_coordinate(s, index, column),
        Some(Data::Empty) | None => bail!("row {}: empty `{}` value", index, column),
        Some(other) => bail!("row {}: `{}` cell {:?} is not a number", index, column, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn reads_mixed_cell_types() -> Result<()> {
        let range = sheet(&[
            &[s("id"), s("lat"), s("long")],
            &[Data::Int(10), Data::Float(40.0), Data::Float(-73.0)],
            &[Data::Int(11), Data::Int(47), s("-122.5")],
            &[Data::Empty, Data::Empty, Data::Empty],
        ]);
        let records = records_from_range(&range)?;
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record {
                index: 0,
                lat: 40.0,
                lon: -73.0
            }
        );
        assert_eq!(
            records[1],
            Record {
                index: 1,
                lat: 47.0,
                lon: -122.5
            }
        );
        Ok(())
    }

    #[test]
    fn interior_blank_row_is_skipped() -> Result<()> {
        let range = sheet(&[
            &[s("lat"), s("long")],
            &[Data::Float(1.0), Data::Float(2.0)],
            &[Data::Empty, Data::Empty],
            &[Data::Float(3.0), Data::Float(4.0)],
        ]);
        let records = records_from_range(&range)?;
        assert_eq!(
            records,
            vec![
                Record {
                    index: 0,
                    lat: 1.0,
                    lon: 2.0
                },
                Record {
                    index: 1,
                    lat: 3.0,
                    lon: 4.0
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_column_is_an_error() {
        let range = sheet(&[&[s("lat"), s("lng")], &[Data::Float(1.0), Data::Float(2.0)]]);
        let err = records_from_range(&range).unwrap_err();
        assert!(err.to_string().contains("missing column `long`"));
    }

    #[test]
    fn blank_coordinate_in_body_is_an_error() {
        let range = sheet(&[
            &[s("lat"), s("long")],
            &[Data::Float(1.0), Data::Empty],
            &[Data::Float(1.0), Data::Float(2.0)],
        ]);
        let err = records_from_range(&range).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn empty_sheet_is_an_error() {
        let range: Range<Data> = Range::empty();
        assert!(records_from_range(&range).is_err());
    }
}
