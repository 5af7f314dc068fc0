//! FILENAME: tests/test_cache.rs
//! Integration tests for result caching.

mod common;

use common::*;
use report_engine::*;
use serde_json::json;

#[test]
fn test_live_entry_is_served_without_fetching() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    let first = harness.run(&report.id);
    assert_eq!(harness.fetch_calls(), 1);
    assert!(!first.metadata.from_cache);

    harness.advance_secs(120);
    let second = harness.run(&report.id);

    assert_eq!(harness.fetch_calls(), 1);
    assert!(second.metadata.from_cache);
    assert_eq!(second.data, first.data);
    assert_eq!(second.metadata.generated_at, first.metadata.generated_at);
}

#[test]
fn test_expired_entry_is_never_served() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    harness.run(&report.id);
    harness.advance_secs(301);
    let result = harness.run(&report.id);

    assert_eq!(harness.fetch_calls(), 2);
    assert!(!result.metadata.from_cache);
}

#[test]
fn test_report_ttl_overrides_default() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Short lived", "jobs").with_cache_ttl(10));

    harness.run(&report.id);
    harness.advance_secs(9);
    harness.run(&report.id);
    assert_eq!(harness.fetch_calls(), 1);

    harness.advance_secs(1);
    harness.run(&report.id);
    assert_eq!(harness.fetch_calls(), 2);
}

#[test]
fn test_parameters_are_part_of_the_key() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    let march = ExecuteRequest::new(&report.id).with_parameter("month", json!(3));
    let april = ExecuteRequest::new(&report.id).with_parameter("month", json!(4));

    harness.executor.execute(&march, OWNER).unwrap();
    harness.executor.execute(&april, OWNER).unwrap();
    assert_eq!(harness.fetch_calls(), 2);

    let again = harness.executor.execute(&march, OWNER).unwrap();
    assert!(again.metadata.from_cache);
    assert_eq!(harness.fetch_calls(), 2);
}

#[test]
fn test_use_cache_false_skips_read_but_still_writes() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    harness.run(&report.id);
    let fresh = harness
        .executor
        .execute(&ExecuteRequest::new(&report.id).bypass_cache(), OWNER)
        .unwrap();

    assert!(!fresh.metadata.from_cache);
    assert_eq!(harness.fetch_calls(), 2);
    assert_eq!(harness.executor.cache().len(), 2);
}

#[test]
fn test_disabled_cache_never_reads_or_writes() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Live", "jobs").without_cache());

    harness.run(&report.id);
    harness.run(&report.id);

    assert_eq!(harness.fetch_calls(), 2);
    assert!(harness.executor.cache().is_empty());
}

#[test]
fn test_cache_hit_does_not_touch_execution_stats() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    harness.run(&report.id);
    let recorded = harness.executor.store().get(&report.id).unwrap().last_executed;

    harness.advance_secs(60);
    harness.run(&report.id);

    assert_eq!(harness.executor.store().get(&report.id).unwrap().last_executed, recorded);
}

#[test]
fn test_cleanup_expired_cache() {
    let mut harness = TestHarness::new();
    let short = harness.create(table_report("Short", "jobs").with_cache_ttl(10));
    let long = harness.create(table_report("Long", "jobs").with_cache_ttl(1000));

    harness.run(&short.id);
    harness.run(&long.id);
    harness.advance_secs(60);

    assert_eq!(harness.executor.cleanup_expired_cache(), 1);
    assert_eq!(harness.executor.cache().len(), 1);
    assert_eq!(harness.executor.cleanup_expired_cache(), 0);
}

#[test]
fn test_config_update_drops_cached_rows() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    harness.run(&report.id);
    assert_eq!(harness.executor.cache().len(), 1);

    let patch = ReportPatch {
        config: Some(table_report("Contacts", "contacts").config),
        ..Default::default()
    };
    harness.executor.update_report(&report.id, &patch, OWNER).unwrap();
    assert!(harness.executor.cache().is_empty());

    let result = harness.run(&report.id);
    assert!(!result.metadata.from_cache);
    assert_eq!(harness.fetch_calls(), 2);
}

#[test]
fn test_rename_keeps_cached_rows() {
    let mut harness = TestHarness::new();
    let report = harness.create(table_report("Jobs", "jobs"));

    harness.run(&report.id);
    let patch = ReportPatch {
        name: Some("Jobs (renamed)".to_string()),
        ..Default::default()
    };
    harness.executor.update_report(&report.id, &patch, OWNER).unwrap();

    assert!(harness.run(&report.id).metadata.from_cache);
    assert_eq!(harness.fetch_calls(), 1);
}
