//! FILENAME: report-engine/src/result.rs
//! PURPOSE: What an execution hands back to the caller.

use chrono::{DateTime, Utc};
use engine::{RegionalMetrics, Row};
use serde::{Deserialize, Serialize};

use crate::definition::DataSourceType;

/// Milliseconds spent per fetching source type. Derived sources are not timed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTimings {
    pub convex: u64,
    pub supabase: u64,
    pub weaviate: u64,
}

impl SourceTimings {
    pub fn record(&mut self, source_type: DataSourceType, millis: u64) {
        match source_type {
            DataSourceType::Convex => self.convex += millis,
            DataSourceType::Supabase => self.supabase += millis,
            DataSourceType::Weaviate => self.weaviate += millis,
            DataSourceType::Calculated => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub total_rows: usize,
    /// Milliseconds spent producing the rows.
    pub execution_time: u64,
    pub data_sources_used: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub source_timings: SourceTimings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_metrics: Option<RegionalMetrics>,
    #[serde(default)]
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub data: Vec<Row>,
    pub metadata: ExecutionMetadata,
}

/// Folds the metrics of one weighting pass into the running total:
/// districts are unioned, scores keep the latest value.
pub(crate) fn merge_metrics(total: &mut Option<RegionalMetrics>, pass: RegionalMetrics) {
    let Some(current) = total else {
        *total = Some(pass);
        return;
    };
    for district in pass.districts_analyzed {
        if !current.districts_analyzed.contains(&district) {
            current.districts_analyzed.push(district);
        }
    }
    if pass.affluence_score.is_some() {
        current.affluence_score = pass.affluence_score;
    }
    if pass.route_efficiency.is_some() {
        current.route_efficiency = pass.route_efficiency;
    }
    if pass.seasonal_factor.is_some() {
        current.seasonal_factor = pass.seasonal_factor;
    }
}
