// Spreadsheet I/O: tabular files in, record sets out, and back again.

pub mod csv;
pub mod error;
pub mod xlsx;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use keybridge_recon::{OutputSheet, Record};

pub use error::IoError;

/// Header used for a column whose header cell is blank.
const EMPTY_HEADER: &str = "__EMPTY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Tsv,
    Excel,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("txt") => Ok(Format::Csv),
            Some("tsv") => Ok(Format::Tsv),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => Ok(Format::Excel),
            _ => Err(IoError::UnsupportedFormat { path: path.to_path_buf() }),
        }
    }
}

/// Read one record set. For workbooks `sheet` picks a sheet by name (first
/// sheet when `None`); it is ignored for delimited text.
///
/// The first row is the header. Each later non-blank row becomes a record
/// whose handle is its position in the returned vector.
pub fn read_records(path: &Path, sheet: Option<&str>) -> Result<Vec<Record>, IoError> {
    let records = match Format::from_path(path)? {
        Format::Csv => crate::csv::read_records(path, None)?,
        Format::Tsv => crate::csv::read_records(path, Some(b'\t'))?,
        Format::Excel => xlsx::read_records(path, sheet)?,
    };
    log::info!("read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Format an output path will be written in. Only `.xlsx` is writable
/// among the Excel family.
pub fn output_format(path: &Path) -> Result<Format, IoError> {
    let format = Format::from_path(path)?;
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if format == Format::Excel && !is_xlsx {
        return Err(IoError::UnsupportedFormat { path: path.to_path_buf() });
    }
    Ok(format)
}

/// Write the output sheets. Workbooks get every sheet; delimited text only
/// holds the first one.
pub fn write_output(path: &Path, sheets: &[OutputSheet<'_>]) -> Result<(), IoError> {
    match output_format(path)? {
        Format::Excel => xlsx::write_workbook(path, sheets),
        format => {
            let delimiter = if format == Format::Tsv { b'\t' } else { b',' };
            if sheets.len() > 1 {
                log::warn!(
                    "{} holds a single sheet; writing '{}' only",
                    path.display(),
                    sheets.first().map(|s| s.name).unwrap_or_default()
                );
            }
            let records = sheets.first().map(|s| s.records).unwrap_or(&[]);
            crate::csv::write_csv(path, records, delimiter)
        }
    }
}

/// Union of field names across records, in first-appearance order.
pub fn union_header(records: &[Record]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut header = Vec::new();
    for record in records {
        for name in record.field_names() {
            if seen.insert(name) {
                header.push(name);
            }
        }
    }
    header
}

/// Blank header cells become `__EMPTY`, `__EMPTY_1`, ...; repeated headers
/// get `_1`, `_2`, ... suffixes.
fn header_names(raw: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|cell| {
            let base = if cell.trim().is_empty() { EMPTY_HEADER } else { cell.as_str() };
            let n = counts.entry(base.to_string()).or_insert(0);
            let name = if *n == 0 { base.to_string() } else { format!("{base}_{n}") };
            *n += 1;
            name
        })
        .collect()
}

/// Turn raw rows (header first) into records. Blank rows are dropped and
/// empty cells are left out of the record.
fn rows_to_records<I>(mut rows: I) -> Vec<Record>
where
    I: Iterator<Item = Vec<String>>,
{
    let Some(first) = rows.next() else {
        return Vec::new();
    };
    let mut header = header_names(&first);
    let mut records = Vec::new();

    for (row_idx, row) in rows.enumerate() {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        if row.len() > header.len() {
            log::warn!(
                "data row {} has {} cells but the header has {}; extra cells get blank headers",
                row_idx + 1,
                row.len(),
                header.len()
            );
            let mut padded = first.clone();
            padded.resize(row.len(), String::new());
            header = header_names(&padded);
        }
        let record: Record = header
            .iter()
            .zip(row)
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), value))
            .collect();
        records.push(record);
    }
    records
}
