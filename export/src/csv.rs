//! FILENAME: export/src/csv.rs
//! PURPOSE: Delimited-text rendering of report rows.
//! CONTEXT: The header comes from the field names of the FIRST row; later
//! rows are read by those names, so extra fields are dropped and missing
//! ones render empty. Text containing a comma is wrapped in double quotes.
//! Embedded quotes are not escaped.

use engine::{FieldValue, Row};

pub const DELIMITER: char = ',';

/// Renders rows as CSV. An empty row set renders as an empty string.
pub fn to_csv(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let headers: Vec<&str> = first.keys().collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));

    for row in rows {
        let cells: Vec<String> = headers.iter().map(|h| csv_cell(row.get(h))).collect();
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

fn csv_cell(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) if s.contains(DELIMITER) => format!("\"{}\"", s),
        other => other.display_text(),
    }
}
