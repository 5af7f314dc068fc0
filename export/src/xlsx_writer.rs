//! FILENAME: export/src/xlsx_writer.rs
//! PURPOSE: Native XLSX workbook output for report rows.
//! CONTEXT: One worksheet named after the report. Row 0 holds the bold
//! header (fields of the first row); data starts at row 1. Numbers and
//! booleans keep their cell type, dates are written as RFC 3339 text and
//! nulls leave the cell empty.

use crate::ExportError;
use engine::{FieldValue, Row};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

/// Excel's sheet-name length limit.
pub const MAX_SHEET_NAME_LEN: usize = 31;
const FALLBACK_SHEET_NAME: &str = "Report";

pub fn save_xlsx(report_name: &str, rows: &[Row], path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(report_name, rows)?;
    workbook.save(path)?;
    Ok(())
}

pub fn xlsx_bytes(report_name: &str, rows: &[Row]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(report_name, rows)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(report_name: &str, rows: &[Row]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(report_name))?;

    let Some(first) = rows.first() else {
        return Ok(workbook);
    };

    let header_format = Format::new().set_bold();
    let headers: Vec<&str> = first.keys().collect();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, *header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_idx = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, header) in headers.iter().enumerate() {
            write_value(worksheet, row_idx, column_index(col)?, row.get(header))?;
        }
    }

    Ok(workbook)
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &FieldValue) -> Result<(), XlsxError> {
    match value {
        FieldValue::Null => {}
        FieldValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        FieldValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        FieldValue::Boolean(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        FieldValue::Date(d) => {
            worksheet.write_string(row, col, d.to_rfc3339())?;
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Makes a report name usable as a worksheet name: strips the characters
/// Excel rejects, trims leading/trailing apostrophes and truncates.
pub fn sheet_name(report_name: &str) -> String {
    let cleaned: String = report_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let truncated: String = cleaned.trim_matches('\'').chars().take(MAX_SHEET_NAME_LEN).collect();
    let truncated = truncated.trim_matches('\'').trim();

    if truncated.is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else {
        truncated.to_string()
    }
}
