//! FILENAME: tests/test_execution.rs
//! Integration tests for report execution.

mod common;

use common::*;
use engine::{AggregationType, CalculatedField, FieldValue, Filter, FilterOperator, RegionalSettings};
use report_engine::*;

// ============================================================================
// END-TO-END SCENARIOS
// ============================================================================

#[test]
fn test_calculated_only_report_is_empty() {
    let mut harness = TestHarness::new();
    let report = harness.create(NewReport::new(
        "Derived only",
        ReportType::Table,
        ReportConfig::new(vec![DataSource::calculated()], Visualization::new(ChartType::Table)),
    ));

    let result = harness.run(&report.id);

    assert!(result.data.is_empty());
    assert_eq!(result.metadata.total_rows, 0);
    assert_eq!(result.metadata.data_sources_used, vec!["calculated".to_string()]);
    assert_eq!(result.metadata.source_timings, SourceTimings::default());
    assert_eq!(harness.fetch_calls(), 0);
}

#[test]
fn test_district_filter_with_affluence_weighting() {
    let provider = MemoryProvider::new().with_collection(
        "visits",
        vec![
            engine::Row::new().with("district", "Wola").with("value", 10.0),
            engine::Row::new().with("district", "Śródmieście").with("value", 10.0),
        ],
    );
    let mut harness = TestHarness::with_provider(SpyProvider::new(provider));
    let config = ReportConfig::new(
        vec![DataSource::table(DataSourceType::Convex, "visits")],
        Visualization::new(ChartType::Table),
    )
    .with_regional_settings(RegionalSettings::for_district("Śródmieście").with_affluence());
    let report = harness.create(NewReport::new("Centre", ReportType::Table, config));

    let result = harness.run(&report.id);

    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].get("district"), &FieldValue::from("Śródmieście"));
    assert_eq!(result.data[0].get("affluenceWeightedValue"), &FieldValue::Number(15.0));
    let metrics = result.metadata.regional_metrics.unwrap();
    assert_eq!(metrics.affluence_score, Some(1.5));
    assert_eq!(metrics.districts_analyzed, vec!["Śródmieście".to_string()]);
}

#[test]
fn test_full_pipeline_groups_weighted_values() {
    let mut harness = TestHarness::new();
    let config = ReportConfig::new(
        vec![DataSource::table(DataSourceType::Convex, "jobs")
            .with_filter(Filter::new("type", FilterOperator::NotEquals, "maintenance"))],
        Visualization::new(ChartType::Bar).grouped("type", "total", AggregationType::Sum),
    )
    .with_calculated_field(CalculatedField::new("total", "seasonalAdjustedValue - value"))
    .with_regional_settings(RegionalSettings::default().with_seasonal().with_route_efficiency());
    let report = harness.create(NewReport::new("Summer uplift", ReportType::Chart, config));

    let result = harness.run(&report.id);

    // July factor 1.5: uplift is half of the original value
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.data[0].get("type"), &FieldValue::from("repair"));
    assert_eq!(result.data[0].get("total"), &FieldValue::Number(375.0));
    assert_eq!(result.data[1].get("type"), &FieldValue::from("install"));
    assert_eq!(result.data[1].get("total"), &FieldValue::Number(4600.0));

    let metrics = result.metadata.regional_metrics.unwrap();
    assert_eq!(metrics.seasonal_factor, Some(1.5));
    assert_eq!(metrics.route_efficiency, Some(60.0));
    assert_eq!(metrics.districts_analyzed.len(), 4);
}

#[test]
fn test_calculated_source_derives_from_earlier_rows() {
    let mut harness = TestHarness::new();
    let config = ReportConfig::new(
        vec![
            DataSource::table(DataSourceType::Convex, "jobs"),
            DataSource::calculated().with_filter(Filter::new("value", FilterOperator::GreaterThan, 1000.0)),
        ],
        Visualization::new(ChartType::Table),
    );
    let report = harness.create(NewReport::new("Jobs plus big jobs", ReportType::Table, config));

    let result = harness.run(&report.id);

    // 5 fetched rows, then the 2 large installs appended again
    assert_eq!(result.data.len(), 7);
    assert_eq!(result.data[5].get("value"), &FieldValue::Number(5000.0));
    assert_eq!(result.data[6].get("value"), &FieldValue::Number(4200.0));
    assert_eq!(
        result.metadata.data_sources_used,
        vec!["convex".to_string(), "calculated".to_string()]
    );
}

#[test]
fn test_sources_are_appended_in_declared_order() {
    let mut harness = TestHarness::new();
    let config = ReportConfig::new(
        vec![
            DataSource::table(DataSourceType::Convex, "contacts"),
            DataSource::table(DataSourceType::Weaviate, "equipment").with_query("heat pump"),
            DataSource::table(DataSourceType::Supabase, "invoices"),
        ],
        Visualization::new(ChartType::Table),
    );
    let report = harness.create(NewReport::new("Mixed", ReportType::Custom, config));

    let result = harness.run(&report.id);

    assert_eq!(result.data.len(), 3);
    assert!(result.data[0].contains("name"));
    assert!(result.data[2].contains("model"));
    assert_eq!(harness.fetch_calls(), 3);
}

#[test]
fn test_vector_results_are_capped_by_config() {
    let rows: Vec<engine::Row> = (0..150)
        .map(|i| engine::Row::new().with("note", format!("filter change visit {}", i)))
        .collect();
    let provider = MemoryProvider::new().with_vector_documents("notes", rows);
    let mut harness = TestHarness::with_provider(SpyProvider::new(provider));
    let config = ReportConfig::new(
        vec![DataSource::table(DataSourceType::Weaviate, "notes").with_query("filter change")],
        Visualization::new(ChartType::Table),
    );
    let report = harness.create(NewReport::new("Notes", ReportType::Table, config));

    let result = harness.run(&report.id);

    assert_eq!(result.metadata.total_rows, 100);
}

// ============================================================================
// FAILURE ABSORPTION
// ============================================================================

#[test]
fn test_failed_source_contributes_no_rows() {
    let provider = SpyProvider::new(sample_provider()).failing_on("jobs");
    let mut harness = TestHarness::with_provider(provider);
    let config = ReportConfig::new(
        vec![
            DataSource::table(DataSourceType::Convex, "jobs"),
            DataSource::table(DataSourceType::Convex, "contacts"),
            DataSource::table(DataSourceType::Convex, "no_such_table"),
            DataSource::new(DataSourceType::Convex),
            DataSource::new(DataSourceType::Weaviate),
        ],
        Visualization::new(ChartType::Table),
    );
    let report = harness.create(NewReport::new("Partial", ReportType::Table, config));

    let result = harness.run(&report.id);

    assert_eq!(result.data.len(), 2);
    assert_eq!(result.metadata.data_sources_used.len(), 5);
}

#[test]
fn test_bad_formula_yields_zero() {
    let mut harness = TestHarness::new();
    let config = ReportConfig::new(
        vec![DataSource::table(DataSourceType::Convex, "jobs")],
        Visualization::new(ChartType::Table),
    )
    .with_calculated_field(CalculatedField::new("broken", "value + unknownVar"))
    .with_calculated_field(CalculatedField::new("double", "value * 2"));
    let report = harness.create(NewReport::new("Formulas", ReportType::Table, config));

    let result = harness.run(&report.id);

    assert_eq!(result.data[0].get("broken"), &FieldValue::Number(0.0));
    assert_eq!(result.data[0].get("double"), &FieldValue::Number(800.0));
}

// ============================================================================
// ACCESS AND BOOKKEEPING
// ============================================================================

#[test]
fn test_missing_report() {
    let mut harness = TestHarness::new();
    let err = harness.executor.execute(&ExecuteRequest::new("nope"), OWNER).unwrap_err();
    assert!(matches!(err, ReportError::NotFound(id) if id == "nope"));
}

#[test]
fn test_private_report_rejects_strangers() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Private", "jobs"));

    let err = harness
        .executor
        .execute(&ExecuteRequest::new(&report.id), STRANGER)
        .unwrap_err();

    assert!(matches!(err, ReportError::PermissionDenied { action: "execute", .. }));
    assert_eq!(harness.fetch_calls(), 0);
}

#[test]
fn test_public_report_runs_for_anyone() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Public", "jobs").public());
    let result = harness.executor.execute(&ExecuteRequest::new(&report.id), STRANGER).unwrap();
    assert_eq!(result.metadata.total_rows, 5);
}

#[test]
fn test_execution_stats_recorded() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Stats", "jobs"));
    assert!(report.last_executed.is_none());

    harness.advance_secs(30);
    let result = harness.run(&report.id);

    let stored = harness.executor.store().get(&report.id).unwrap();
    assert_eq!(stored.last_executed, Some(start_time() + chrono::Duration::seconds(30)));
    assert_eq!(stored.execution_time, Some(result.metadata.execution_time));
    assert_eq!(result.metadata.generated_at, start_time() + chrono::Duration::seconds(30));
}
