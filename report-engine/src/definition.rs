//! FILENAME: report-engine/src/definition.rs
//! Report Definition - the serializable description of a custom report.
//!
//! These types describe WHAT a report is: where its rows come from, how they
//! are shaped and who may see it. They round-trip through camelCase JSON so
//! definitions can be stored as documents or loaded from fixtures.

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use engine::{AggregationType, CalculatedField, Filter, RegionalSettings};
use serde::{Deserialize, Serialize};

pub type ReportId = String;
pub type UserId = String;

// ============================================================================
// REPORT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Dashboard,
    #[default]
    Table,
    Chart,
    Kpi,
    Custom,
}

// ============================================================================
// DATA SOURCES
// ============================================================================

/// Where a data source reads its rows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    /// Managed document store (contacts, jobs, quotes, equipment...).
    Convex,
    /// External relational store.
    Supabase,
    /// Vector / semantic search.
    Weaviate,
    /// Derived from the rows produced by earlier sources.
    Calculated,
}

impl DataSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::Convex => "convex",
            DataSourceType::Supabase => "supabase",
            DataSourceType::Weaviate => "weaviate",
            DataSourceType::Calculated => "calculated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

/// A join declared on a data source. Stored with the definition; the
/// executor does not perform joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDescriptor {
    pub table: String,
    pub local_field: String,
    pub foreign_field: String,
    #[serde(default)]
    pub join_type: JoinType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    /// Collection name; for semantic search, the result-type tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinDescriptor>,
}

impl DataSource {
    pub fn new(source_type: DataSourceType) -> Self {
        DataSource {
            source_type,
            table: None,
            query: None,
            filters: Vec::new(),
            joins: Vec::new(),
        }
    }

    pub fn table(source_type: DataSourceType, table: impl Into<String>) -> Self {
        DataSource {
            table: Some(table.into()),
            ..DataSource::new(source_type)
        }
    }

    pub fn calculated() -> Self {
        DataSource::new(DataSourceType::Calculated)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

// ============================================================================
// VISUALIZATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
    Heatmap,
    #[default]
    Table,
    Kpi,
    Gauge,
    Map,
}

/// Presentation settings. Only `group_by`, `y_axis` and `aggregation`
/// influence execution; the rest is carried for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,

    // Type-specific settings (kpi, gauge)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpi_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Visualization {
    pub fn new(chart_type: ChartType) -> Self {
        Visualization {
            chart_type,
            ..Default::default()
        }
    }

    pub fn grouped(mut self, group_by: impl Into<String>, y_axis: impl Into<String>, aggregation: AggregationType) -> Self {
        self.group_by = Some(group_by.into());
        self.y_axis = Some(y_axis.into());
        self.aggregation = Some(aggregation);
        self
    }
}

// ============================================================================
// REPORT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub visualization: Visualization,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculated_fields: Vec<CalculatedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warsaw_settings: Option<RegionalSettings>,
}

impl ReportConfig {
    pub fn new(data_sources: Vec<DataSource>, visualization: Visualization) -> Self {
        ReportConfig {
            data_sources,
            visualization,
            calculated_fields: Vec::new(),
            warsaw_settings: None,
        }
    }

    pub fn with_calculated_field(mut self, field: CalculatedField) -> Self {
        self.calculated_fields.push(field);
        self
    }

    pub fn with_regional_settings(mut self, settings: RegionalSettings) -> Self {
        self.warsaw_settings = Some(settings);
        self
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.data_sources.is_empty() {
            return Err(ReportError::Validation(
                "a report needs at least one data source".to_string(),
            ));
        }
        for field in &self.calculated_fields {
            if field.name.trim().is_empty() {
                return Err(ReportError::Validation("calculated field without a name".to_string()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SHARING
// ============================================================================

/// Access levels, ordered: view < edit < admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    View,
    Edit,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportShare {
    pub user_id: UserId,
    pub permission: PermissionLevel,
}

impl ReportShare {
    pub fn new(user_id: impl Into<UserId>, permission: PermissionLevel) -> Self {
        ReportShare {
            user_id: user_id.into(),
            permission,
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub config: ReportConfig,
    pub created_by: UserId,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub shared_with: Vec<ReportShare>,
    #[serde(default)]
    pub cache_enabled: bool,
    /// Cache lifetime in seconds. Falls back to the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
    #[serde(default)]
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed: Option<DateTime<Utc>>,
    /// Duration of the last fresh execution, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
}

impl Report {
    /// Effective access level of a user. The owner is admin; a public
    /// report grants at least view to everyone.
    pub fn permission_for(&self, user: &str) -> Option<PermissionLevel> {
        if self.created_by == user {
            return Some(PermissionLevel::Admin);
        }
        let shared = self
            .shared_with
            .iter()
            .filter(|s| s.user_id == user)
            .map(|s| s.permission)
            .max();
        match shared {
            Some(level) => Some(level),
            None if self.is_public => Some(PermissionLevel::View),
            None => None,
        }
    }

    pub fn cache_ttl_secs(&self, default_secs: u64) -> u64 {
        self.cache_ttl.unwrap_or(default_secs)
    }
}

/// Input for creating a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub report_type: ReportType,
    pub config: ReportConfig,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default)]
    pub cache_ttl: Option<u64>,
    #[serde(default)]
    pub is_template: bool,
}

fn default_cache_enabled() -> bool {
    true
}

impl NewReport {
    pub fn new(name: impl Into<String>, report_type: ReportType, config: ReportConfig) -> Self {
        NewReport {
            name: name.into(),
            description: None,
            report_type,
            config,
            is_public: false,
            cache_enabled: true,
            cache_ttl: None,
            is_template: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn template(mut self) -> Self {
        self.is_template = true;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl = Some(secs);
        self
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub config: Option<ReportConfig>,
    pub is_public: Option<bool>,
    pub cache_enabled: Option<bool>,
    pub cache_ttl: Option<u64>,
    pub is_template: Option<bool>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        *self == ReportPatch::default()
    }

    pub fn apply(&self, report: &mut Report, at: DateTime<Utc>) {
        if let Some(name) = &self.name {
            report.name = name.clone();
        }
        if let Some(description) = &self.description {
            report.description = Some(description.clone());
        }
        if let Some(report_type) = self.report_type {
            report.report_type = report_type;
        }
        if let Some(config) = &self.config {
            report.config = config.clone();
        }
        if let Some(is_public) = self.is_public {
            report.is_public = is_public;
        }
        if let Some(cache_enabled) = self.cache_enabled {
            report.cache_enabled = cache_enabled;
        }
        if let Some(ttl) = self.cache_ttl {
            report.cache_ttl = Some(ttl);
        }
        if let Some(is_template) = self.is_template {
            report.is_template = is_template;
        }
        report.updated_at = at;
    }
}
