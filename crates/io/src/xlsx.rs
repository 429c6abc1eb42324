// Excel record import (xlsx, xls, xlsb, ods) and workbook export (xlsx)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

use keybridge_recon::{OutputSheet, Record};

use crate::error::IoError;
use crate::{rows_to_records, union_header};

/// Reading order value for right-to-left text in a cell format.
const READING_ORDER_RTL: u8 = 2;

/// Largest integer written as a number; the reader prints integral floats
/// below this without a decimal point.
const MAX_NUMERIC_CELL: i64 = 999_999_999_999_999;

/// Read one sheet of a workbook into records. `sheet` selects by name; the
/// first sheet is used when it is `None`.
pub fn read_records(path: &Path, sheet: Option<&str>) -> Result<Vec<Record>, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(IoError::NoSheets { path: path.to_path_buf() });
    };

    let target = match sheet {
        None => first.clone(),
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.to_string(),
                available: sheet_names.clone(),
            })?,
    };

    let range = workbook.worksheet_range(&target).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        message: format!("sheet '{}': {}", target, e),
    })?;
    log::debug!("reading sheet '{}' ({:?}) from {}", target, range.get_size(), path.display());

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    Ok(rows_to_records(rows))
}

/// Text form of a cell, as a person would see it typed in.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Serial number; the 1904 flag is not exposed by calamine.
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Write each sheet with a union header row followed by one row per record.
/// Right-to-left sheets get RTL sheet direction and right-aligned cells with
/// RTL reading order.
pub fn write_workbook(path: &Path, sheets: &[OutputSheet<'_>]) -> Result<(), IoError> {
    let write_err = |e: XlsxError| IoError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook
            .add_worksheet()
            .set_name(sheet.name)
            .map_err(|e| IoError::Write {
                path: path.to_path_buf(),
                message: format!("sheet '{}': {}", sheet.name, e),
            })?;
        write_sheet(worksheet, sheet).map_err(write_err)?;
        log::debug!("wrote sheet '{}' with {} rows", sheet.name, sheet.records.len());
    }

    workbook.save(path).map_err(write_err)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &OutputSheet<'_>) -> Result<(), XlsxError> {
    let format = if sheet.right_to_left {
        worksheet.set_right_to_left(true);
        Format::new()
            .set_align(FormatAlign::Right)
            .set_reading_direction(READING_ORDER_RTL)
    } else {
        Format::new()
    };

    let header = union_header(sheet.records);
    for (col, name) in header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &format)?;
    }

    for (idx, record) in sheet.records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, name) in header.iter().enumerate() {
            let Some(value) = record.get(name) else {
                continue;
            };
            match integer_cell(value) {
                Some(n) => worksheet.write_number_with_format(row, col as u16, n as f64, &format)?,
                None => worksheet.write_string_with_format(row, col as u16, value, &format)?,
            };
        }
    }
    Ok(())
}

/// Plain integers (ids, account keys) become numeric cells. Leading zeros,
/// signs other than `-`, and anything the reader would not print back
/// identically stay text.
fn integer_cell(value: &str) -> Option<i64> {
    let n: i64 = value.parse().ok()?;
    (n.abs() <= MAX_NUMERIC_CELL && n.to_string() == value).then_some(n)
}
