//! FILENAME: export/src/text.rs
//! PURPOSE: Human-readable plain-text report, served for the "pdf" format.
//! CONTEXT: A short metadata header followed by the rows as pretty JSON.

use crate::ExportError;
use chrono::{DateTime, Utc};
use engine::Row;

pub fn to_text_report(report_name: &str, generated_at: DateTime<Utc>, rows: &[Row]) -> Result<String, ExportError> {
    let body = serde_json::to_string_pretty(rows)?;
    Ok(format!(
        "Report: {}\nGenerated: {}\nTotal rows: {}\n\n{}",
        report_name,
        generated_at.to_rfc3339(),
        rows.len(),
        body
    ))
}
