//! FILENAME: report-engine/src/error.rs

use export::ExportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("User {user} is not allowed to {action} report {report_id}")]
    PermissionDenied {
        user: String,
        action: &'static str,
        report_id: String,
    },

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid report: {0}")]
    Validation(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl ReportError {
    pub(crate) fn denied(user: &str, action: &'static str, report_id: &str) -> Self {
        ReportError::PermissionDenied {
            user: user.to_string(),
            action,
            report_id: report_id.to_string(),
        }
    }
}

/// Failure inside a row-source provider. The executor logs these and
/// continues with an empty row set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Data source of type {0} requires a table")]
    MissingTable(&'static str),

    #[error("Data source of type {0} requires a query")]
    MissingQuery(&'static str),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Rejected engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config rejected: {0}")]
    Export(#[from] ExportError),
}
