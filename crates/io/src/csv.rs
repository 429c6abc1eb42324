// CSV/TSV record import/export

use std::io::Read;
use std::path::Path;

use keybridge_recon::Record;

use crate::error::IoError;
use crate::{rows_to_records, union_header};

/// Read delimited text into records. The delimiter is sniffed when not given.
pub fn read_records(path: &Path, delimiter: Option<u8>) -> Result<Vec<Record>, IoError> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(content));
    records_from_string(content, delimiter).map_err(|message| IoError::Read {
        path: path.to_path_buf(),
        message,
    })
}

/// Guess the delimiter from the first lines. Ledgers exported from Hebrew
/// Excel often use `;`, so every candidate is scored by how many lines share
/// the header's field count, weighted by that count. A single-column file
/// falls back to `,`.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = (b',', 0usize);
    for delim in [b'\t', b';', b',', b'|'] {
        let mut counts = sample.iter().map(|line| field_count(line, delim));
        let Some(header) = counts.next() else {
            break;
        };
        if header <= 1 {
            continue;
        }
        let score = header * (1 + counts.filter(|&c| c == header).count());
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

/// Read file and convert to UTF-8 if needed (Windows-1252 for Excel-exported CSVs)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::warn!("{} is not UTF-8; decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn records_from_string(content: &str, delimiter: u8) -> Result<Vec<Record>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(rows_to_records(rows.into_iter()))
}

/// Write records under a union header. Fields a record lacks are left blank.
pub fn write_csv(path: &Path, records: &[Record], delimiter: u8) -> Result<(), IoError> {
    let write_err = |message: String| IoError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| write_err(e.to_string()))?;

    let header = union_header(records);
    writer.write_record(&header).map_err(|e| write_err(e.to_string()))?;
    for record in records {
        let row: Vec<&str> = header.iter().map(|name| record.get(name).unwrap_or("")).collect();
        writer.write_record(&row).map_err(|e| write_err(e.to_string()))?;
    }

    writer.flush().map_err(|e| write_err(e.to_string()))?;
    Ok(())
}
