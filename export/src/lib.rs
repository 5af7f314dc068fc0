//! FILENAME: export/src/lib.rs
//! Report export formatters.
//!
//! Turns executed report rows into a downloadable payload. `csv` and
//! `excel` share the CSV renderer and differ only in labelling; `pdf`
//! is a plain-text report. A native XLSX workbook writer is also
//! available for callers that want a real spreadsheet file.

mod csv;
mod error;
mod text;
mod xlsx_writer;

pub use crate::csv::to_csv;
pub use error::ExportError;
pub use text::to_text_report;
pub use xlsx_writer::{save_xlsx, sheet_name, xlsx_bytes, MAX_SHEET_NAME_LEN};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use engine::Row;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Default timestamp pattern used in export file names.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// ============================================================================
// FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => "application/vnd.ms-excel",
            ExportFormat::Pdf => "text/plain",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xls",
            ExportFormat::Pdf => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// A rendered export, ready to hand to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub content_type: String,
    pub file_name: String,
    pub content: String,
}

/// Renders rows in the requested format.
pub fn render(
    format: ExportFormat,
    report_name: &str,
    rows: &[Row],
    generated_at: DateTime<Utc>,
    timestamp_format: &str,
) -> Result<ExportPayload, ExportError> {
    let content = match format {
        ExportFormat::Csv | ExportFormat::Excel => to_csv(rows),
        ExportFormat::Pdf => to_text_report(report_name, generated_at, rows)?,
    };

    Ok(ExportPayload {
        format,
        content_type: format.content_type().to_string(),
        file_name: file_name(report_name, format, generated_at, timestamp_format)?,
        content,
    })
}

/// Rejects strftime patterns chrono cannot render.
pub fn validate_timestamp_format(pattern: &str) -> Result<(), ExportError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ExportError::InvalidTimestampFormat(pattern.to_string()));
    }
    Ok(())
}

/// Builds `<slug>-<timestamp>.<ext>` from the report name.
pub fn file_name(
    report_name: &str,
    format: ExportFormat,
    at: DateTime<Utc>,
    timestamp_format: &str,
) -> Result<String, ExportError> {
    validate_timestamp_format(timestamp_format)?;
    let mut slug = String::with_capacity(report_name.len());
    for c in report_name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "report" } else { slug };

    let mut name = String::with_capacity(slug.len() + 24);
    write!(name, "{}-{}.{}", slug, at.format(timestamp_format), format.extension())
        .map_err(|_| ExportError::InvalidTimestampFormat(timestamp_format.to_string()))?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            "docx".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "docx"
        ));
    }

    #[test]
    fn test_excel_is_relabelled_csv() {
        let rows = vec![Row::new().with("a", 1.0)];
        let csv = render(ExportFormat::Csv, "R", &rows, at(), DEFAULT_TIMESTAMP_FORMAT).unwrap();
        let excel = render(ExportFormat::Excel, "R", &rows, at(), DEFAULT_TIMESTAMP_FORMAT).unwrap();
        assert_eq!(csv.content, excel.content);
        assert_ne!(csv.content_type, excel.content_type);
        assert!(excel.file_name.ends_with(".xls"));
    }

    #[test]
    fn test_pdf_payload() {
        let payload = render(ExportFormat::Pdf, "Monthly", &[], at(), DEFAULT_TIMESTAMP_FORMAT).unwrap();
        assert_eq!(payload.content_type, "text/plain");
        assert!(payload.content.starts_with("Report: Monthly\n"));
    }

    #[test]
    fn test_file_name_slug() {
        assert_eq!(
            file_name("Przychody: Śródmieście Q1", ExportFormat::Csv, at(), DEFAULT_TIMESTAMP_FORMAT).unwrap(),
            "przychody-śródmieście-q1-20240305-140709.csv"
        );
        assert_eq!(file_name("***", ExportFormat::Pdf, at(), "%Y").unwrap(), "report-2024.txt");
    }

    #[test]
    fn test_invalid_timestamp_format_is_an_error() {
        assert!(validate_timestamp_format(DEFAULT_TIMESTAMP_FORMAT).is_ok());
        assert!(matches!(
            validate_timestamp_format("%Q"),
            Err(ExportError::InvalidTimestampFormat(p)) if p == "%Q"
        ));
        assert!(matches!(
            file_name("R", ExportFormat::Csv, at(), "%Y-%"),
            Err(ExportError::InvalidTimestampFormat(_))
        ));
        assert!(matches!(
            render(ExportFormat::Csv, "R", &[], at(), "%Q"),
            Err(ExportError::InvalidTimestampFormat(_))
        ));
    }
}
