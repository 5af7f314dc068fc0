//! FILENAME: tests/test_export.rs
//! Integration tests for report export.

mod common;

use common::*;
use report_engine::*;

fn contacts_report(harness: &mut TestHarness) -> Report {
    harness.create(table_report("Contacts: Warsaw", "contacts"))
}

#[test]
fn test_csv_export() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);

    let payload = harness
        .executor
        .export(&ExportRequest::new(&report.id, "csv"), OWNER)
        .unwrap();

    assert_eq!(payload.format, ExportFormat::Csv);
    assert_eq!(payload.content_type, "text/csv");
    assert_eq!(payload.file_name, "contacts-warsaw-20240715-090000.csv");
    assert_eq!(payload.content, "name,district\nAnna Nowak,Wola\nPiotr Zieliński,Ursynów");
}

#[test]
fn test_excel_export_is_csv_content() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);

    let csv = harness.executor.export(&ExportRequest::new(&report.id, "csv"), OWNER).unwrap();
    let excel = harness.executor.export(&ExportRequest::new(&report.id, "excel"), OWNER).unwrap();

    assert_eq!(excel.content, csv.content);
    assert_eq!(excel.content_type, "application/vnd.ms-excel");
}

#[test]
fn test_pdf_export_is_text_report() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);

    let payload = harness.executor.export(&ExportRequest::new(&report.id, "pdf"), OWNER).unwrap();

    assert!(payload.content.starts_with("Report: Contacts: Warsaw\nGenerated: 2024-07-15T09:00:00+00:00\nTotal rows: 2\n\n["));
    assert!(payload.content.contains("\"Anna Nowak\""));
}

#[test]
fn test_unknown_format_is_rejected_before_execution() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);

    let err = harness
        .executor
        .export(&ExportRequest::new(&report.id, "docx"), OWNER)
        .unwrap_err();

    assert!(matches!(err, ReportError::UnsupportedFormat(f) if f == "docx"));
    assert_eq!(harness.fetch_calls(), 0);
}

#[test]
fn test_export_respects_permissions() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);
    let err = harness
        .executor
        .export(&ExportRequest::new(&report.id, "csv"), STRANGER)
        .unwrap_err();
    assert!(matches!(err, ReportError::PermissionDenied { .. }));
}

#[test]
fn test_export_uses_cached_rows() {
    let mut harness = TestHarness::new();
    let report = contacts_report(&mut harness);

    harness.run(&report.id);
    harness.executor.export(&ExportRequest::new(&report.id, "csv"), OWNER).unwrap();

    assert_eq!(harness.fetch_calls(), 1);
}

#[test]
fn test_unrenderable_timestamp_format_is_an_error() {
    let config = EngineConfig {
        export_timestamp_format: "%Q".to_string(),
        ..EngineConfig::default()
    };
    let mut harness = TestHarness::with_config(config);
    assert!(harness.executor.config().validate().is_err());
    let report = contacts_report(&mut harness);

    let err = harness
        .executor
        .export(&ExportRequest::new(&report.id, "csv"), OWNER)
        .unwrap_err();
    assert!(matches!(err, ReportError::Export(ExportError::InvalidTimestampFormat(_))));
}
