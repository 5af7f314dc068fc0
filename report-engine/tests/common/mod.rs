//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for report-engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use engine::{Filter, ManualClock, Row};
use report_engine::*;
use std::cell::Cell;
use std::rc::Rc;

pub const OWNER: &str = "owner-1";
pub const COLLEAGUE: &str = "tech-2";
pub const STRANGER: &str = "outsider-3";

/// Counts fetch calls and delegates to an in-memory provider.
/// Tables listed in `failing` return a backend error instead.
#[derive(Debug, Clone, Default)]
pub struct SpyProvider {
    pub inner: MemoryProvider,
    pub calls: Rc<Cell<usize>>,
    pub failing: Vec<String>,
}

impl SpyProvider {
    pub fn new(inner: MemoryProvider) -> Self {
        SpyProvider {
            inner,
            calls: Rc::new(Cell::new(0)),
            failing: Vec::new(),
        }
    }

    pub fn failing_on(mut self, table: &str) -> Self {
        self.failing.push(table.to_string());
        self
    }

    fn hit(&self, table: &str) -> Result<(), SourceError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.iter().any(|t| t == table) {
            return Err(SourceError::Backend(format!("{} is unavailable", table)));
        }
        Ok(())
    }
}

impl RowSourceProvider for SpyProvider {
    fn fetch_documents(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, SourceError> {
        self.hit(table)?;
        self.inner.fetch_documents(table, filters)
    }

    fn fetch_external(&self, table: &str, query: Option<&str>) -> Result<Vec<Row>, SourceError> {
        self.hit(table)?;
        self.inner.fetch_external(table, query)
    }

    fn fetch_vector(&self, query: &str, result_type: Option<&str>, limit: usize) -> Result<Vec<Row>, SourceError> {
        self.hit(result_type.unwrap_or(""))?;
        self.inner.fetch_vector(query, result_type, limit)
    }
}

pub type TestExecutor = ReportExecutor<MemoryReportStore, MemoryResultCache, SpyProvider, ManualClock>;

/// Executor over in-memory parts plus handles to observe them.
pub struct TestHarness {
    pub executor: TestExecutor,
    pub clock: ManualClock,
    pub calls: Rc<Cell<usize>>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_provider(SpyProvider::new(sample_provider()))
    }

    pub fn with_provider(provider: SpyProvider) -> Self {
        Self::build(provider, EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(SpyProvider::new(sample_provider()), config)
    }

    fn build(provider: SpyProvider, config: EngineConfig) -> Self {
        let clock = ManualClock::new(start_time());
        let calls = provider.calls.clone();
        let executor = ReportExecutor::new(
            MemoryReportStore::new(),
            MemoryResultCache::new(),
            provider,
            clock.clone(),
            config,
        );
        TestHarness { executor, clock, calls }
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.get()
    }

    /// Creates a report owned by OWNER.
    pub fn create(&mut self, new: NewReport) -> Report {
        self.executor.create_report(new, OWNER).unwrap()
    }

    pub fn run(&mut self, report_id: &str) -> ExecutionResult {
        self.executor.execute(&ExecuteRequest::new(report_id), OWNER).unwrap()
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }
}

/// Mid-July, so seasonal adjustment uses the summer peak factor (1.5).
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap()
}

pub fn job(district: &str, kind: &str, value: f64) -> Row {
    Row::new()
        .with("district", district)
        .with("address", format!("ul. Przykładowa 1, {}", district))
        .with("type", kind)
        .with("value", value)
}

pub fn jobs() -> Vec<Row> {
    vec![
        job("Wola", "repair", 400.0),
        job("Śródmieście", "install", 5000.0),
        job("Mokotów", "repair", 350.0),
        job("Śródmieście", "maintenance", 200.0),
        job("Targówek", "install", 4200.0),
    ]
}

pub fn sample_provider() -> MemoryProvider {
    MemoryProvider::new()
        .with_collection("jobs", jobs())
        .with_collection(
            "contacts",
            vec![
                Row::new().with("name", "Anna Nowak").with("district", "Wola"),
                Row::new().with("name", "Piotr Zieliński").with("district", "Ursynów"),
            ],
        )
        .with_vector_documents(
            "equipment",
            vec![
                Row::new().with("model", "Daikin Altherma heat pump").with("value", 32000.0),
                Row::new().with("model", "LG split air conditioner").with("value", 6500.0),
            ],
        )
}

pub fn table_report(name: &str, table: &str) -> NewReport {
    NewReport::new(
        name,
        ReportType::Table,
        ReportConfig::new(
            vec![DataSource::table(DataSourceType::Convex, table)],
            Visualization::new(ChartType::Table),
        ),
    )
}
