//! FILENAME: report-engine/src/executor.rs
//! PURPOSE: Report execution orchestrator.
//! CONTEXT: One execution is a single sequential pass:
//!   cache lookup -> per-source pipeline -> calculated fields -> aggregation
//!   -> cache write -> execution stats.
//! Each source in declared order is fetched, filtered by its own clauses,
//! regionally weighted (when the report has regional settings) and appended
//! to the running row set. A `calculated` source reads a snapshot of the
//! rows accumulated so far instead of fetching. Fetch failures are logged
//! and count as an empty row set.

use crate::cache::{CacheKey, CachedResult, Parameters, ResultCache};
use crate::config::EngineConfig;
use crate::definition::{DataSource, DataSourceType, Report, ReportId};
use crate::error::{ReportError, SourceError};
use crate::result::{merge_metrics, ExecutionMetadata, ExecutionResult, SourceTimings};
use crate::sources::RowSourceProvider;
use crate::store::{can_view, ReportStore};
use chrono::{DateTime, Duration, Utc};
use engine::{
    aggregate_rows, apply_calculated_fields, apply_filters, apply_regional_weighting, log_debug, log_enter,
    log_error, log_exit, log_info, log_warn, Clock, RegionalMetrics, RegionalSettings, Row,
};
use export::{ExportFormat, ExportPayload};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub report_id: ReportId,
    #[serde(default)]
    pub parameters: Parameters,
    /// Read from the cache when possible. Unset means the engine default.
    #[serde(default)]
    pub use_cache: Option<bool>,
}

impl ExecuteRequest {
    pub fn new(report_id: impl Into<ReportId>) -> Self {
        ExecuteRequest {
            report_id: report_id.into(),
            parameters: Parameters::new(),
            use_cache: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn bypass_cache(mut self) -> Self {
        self.use_cache = Some(false);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub report_id: ReportId,
    /// `csv`, `excel` or `pdf`.
    pub format: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl ExportRequest {
    pub fn new(report_id: impl Into<ReportId>, format: impl Into<String>) -> Self {
        ExportRequest {
            report_id: report_id.into(),
            format: format.into(),
            parameters: Parameters::new(),
        }
    }
}

// ============================================================================
// EXECUTOR
// ============================================================================

pub struct ReportExecutor<S, C, P, K> {
    pub(crate) store: S,
    pub(crate) cache: C,
    provider: P,
    pub(crate) clock: K,
    config: EngineConfig,
}

impl<S, C, P, K> ReportExecutor<S, C, P, K>
where
    S: ReportStore,
    C: ResultCache,
    P: RowSourceProvider,
    K: Clock,
{
    pub fn new(store: S, cache: C, provider: P, clock: K, config: EngineConfig) -> Self {
        ReportExecutor {
            store,
            cache,
            provider,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes a report for a user.
    pub fn execute(&mut self, request: &ExecuteRequest, user: &str) -> Result<ExecutionResult, ReportError> {
        let report = self
            .store
            .get(&request.report_id)
            .ok_or_else(|| ReportError::NotFound(request.report_id.clone()))?;
        if !can_view(&report, user) {
            return Err(ReportError::denied(user, "execute", &report.id));
        }

        let key = CacheKey::new(&report.id, &request.parameters);
        let use_cache = request.use_cache.unwrap_or(self.config.use_cache_by_default);

        if report.cache_enabled && use_cache {
            let now = self.clock.now();
            if let Some(hit) = self.cache.lookup(&key, &report.id, &request.parameters, now) {
                log_debug!("CACHE", "hit report={} key={}", report.id, key);
                let mut metadata = hit.metadata;
                metadata.from_cache = true;
                return Ok(ExecutionResult {
                    data: hit.rows,
                    metadata,
                });
            }
            log_debug!("CACHE", "miss report={} key={}", report.id, key);
        }

        let started = Instant::now();
        let (rows, source_timings, regional_metrics) = self.run_sources(&report);

        let mut rows = rows;
        apply_calculated_fields(&mut rows, &report.config.calculated_fields);

        let viz = &report.config.visualization;
        let rows = aggregate_rows(rows, viz.group_by.as_deref(), viz.y_axis.as_deref(), viz.aggregation);

        let execution_time = elapsed_millis(started);
        let generated_at = self.clock.now();
        let metadata = ExecutionMetadata {
            total_rows: rows.len(),
            execution_time,
            data_sources_used: report
                .config
                .data_sources
                .iter()
                .map(|ds| ds.source_type.as_str().to_string())
                .collect(),
            generated_at,
            source_timings,
            regional_metrics,
            from_cache: false,
        };

        if report.cache_enabled {
            let ttl = report.cache_ttl_secs(self.config.default_cache_ttl_secs);
            let expires_at = i64::try_from(ttl)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|ttl| generated_at.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.cache.insert(CachedResult {
                id: Uuid::new_v4(),
                report_id: report.id.clone(),
                cache_key: key,
                executed_by: user.to_string(),
                parameters: request.parameters.clone(),
                rows: rows.clone(),
                metadata: metadata.clone(),
                created_at: generated_at,
                expires_at,
            });
        }

        self.record_execution(report, generated_at, execution_time);

        log_info!(
            "REPORT",
            "executed report={} rows={} time={}ms user={}",
            request.report_id,
            metadata.total_rows,
            execution_time,
            user
        );

        Ok(ExecutionResult { data: rows, metadata })
    }

    /// Executes a report and renders the result in the requested format.
    pub fn export(&mut self, request: &ExportRequest, user: &str) -> Result<ExportPayload, ReportError> {
        let format: ExportFormat = request
            .format
            .parse()
            .map_err(|_| ReportError::UnsupportedFormat(request.format.clone()))?;

        let execute = ExecuteRequest {
            report_id: request.report_id.clone(),
            parameters: request.parameters.clone(),
            use_cache: None,
        };
        let result = self.execute(&execute, user)?;

        let report_name = self
            .store
            .get(&request.report_id)
            .map(|r| r.name)
            .unwrap_or_else(|| request.report_id.clone());

        let payload = export::render(
            format,
            &report_name,
            &result.data,
            self.clock.now(),
            &self.config.export_timestamp_format,
        )
        .map_err(|e| {
            log_error!("REPORT", "export of report={} as {} failed: {}", request.report_id, format, e);
            e
        })?;

        log_info!(
            "REPORT",
            "exported report={} format={} rows={}",
            request.report_id,
            format,
            result.metadata.total_rows
        );
        Ok(payload)
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    fn run_sources(&self, report: &Report) -> (Vec<Row>, SourceTimings, Option<RegionalMetrics>) {
        log_enter!("SOURCE", "run_sources", "report={} sources={}", report.id, report.config.data_sources.len());
        let settings = report.config.warsaw_settings.as_ref();
        let mut rows: Vec<Row> = Vec::new();
        let mut timings = SourceTimings::default();
        let mut metrics: Option<RegionalMetrics> = None;

        for source in &report.config.data_sources {
            let started = Instant::now();

            let fetched = match source.source_type {
                DataSourceType::Calculated => rows.clone(),
                _ => match self.fetch(source) {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        log_warn!(
                            "SOURCE",
                            "{} source failed for report {}: {}",
                            source.source_type.as_str(),
                            report.id,
                            e
                        );
                        Vec::new()
                    }
                },
            };

            let (shaped, pass_metrics) = self.shape(fetched, source, settings);
            if let Some(pass_metrics) = pass_metrics {
                merge_metrics(&mut metrics, pass_metrics);
            }
            rows.extend(shaped);

            timings.record(source.source_type, elapsed_millis(started));
        }

        log_exit!("SOURCE", "run_sources", "rows={}", rows.len());
        (rows, timings, metrics)
    }

    fn fetch(&self, source: &DataSource) -> Result<Vec<Row>, SourceError> {
        let kind = source.source_type.as_str();
        match source.source_type {
            DataSourceType::Convex => {
                let table = source.table.as_deref().ok_or(SourceError::MissingTable(kind))?;
                self.provider.fetch_documents(table, &source.filters)
            }
            DataSourceType::Supabase => {
                let table = source.table.as_deref().ok_or(SourceError::MissingTable(kind))?;
                self.provider.fetch_external(table, source.query.as_deref())
            }
            DataSourceType::Weaviate => {
                let query = source.query.as_deref().ok_or(SourceError::MissingQuery(kind))?;
                let limit = self.config.vector_result_limit;
                let mut rows = self.provider.fetch_vector(query, source.table.as_deref(), limit)?;
                rows.truncate(limit);
                Ok(rows)
            }
            DataSourceType::Calculated => Ok(Vec::new()),
        }
    }

    fn shape(
        &self,
        rows: Vec<Row>,
        source: &DataSource,
        settings: Option<&RegionalSettings>,
    ) -> (Vec<Row>, Option<RegionalMetrics>) {
        let rows = apply_filters(rows, &source.filters);
        match settings {
            Some(settings) => {
                let (rows, metrics) = apply_regional_weighting(rows, settings, &self.clock);
                (rows, Some(metrics))
            }
            None => (rows, None),
        }
    }

    fn record_execution(&mut self, mut report: Report, at: DateTime<Utc>, execution_time: u64) {
        report.last_executed = Some(at);
        report.execution_time = Some(execution_time);
        self.store.insert(report);
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
