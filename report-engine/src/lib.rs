//! FILENAME: report-engine/src/lib.rs
//! Custom report execution for the HVAC CRM.
//!
//! A report definition names its data sources, per-source filters, optional
//! Warsaw regional weighting, calculated fields and a visualization. The
//! executor turns that definition into rows, caches the result and renders
//! exports. Row-level operations live in the `engine` crate; this crate
//! wires them to stores, providers and the cache.
//!
//! Layers:
//! - `definition`: Serializable report description (what a report IS)
//! - `sources`: Row-source providers (where rows come FROM)
//! - `cache`: Result cache keyed by report and parameters
//! - `store`: Report persistence seam and access checks
//! - `executor`: Execution orchestrator (HOW a report runs)
//! - `service`: Report management around the executor

pub mod cache;
pub mod config;
pub mod definition;
pub mod executor;
pub mod error;
pub mod result;
pub mod service;
pub mod sources;
pub mod store;

pub use cache::{canonical_json, CacheKey, CachedResult, MemoryResultCache, Parameters, ResultCache};
pub use config::EngineConfig;
pub use definition::*;
pub use executor::{ExecuteRequest, ExportRequest, ReportExecutor};
pub use error::{ConfigError, ReportError, SourceError};
pub use result::{ExecutionMetadata, ExecutionResult, SourceTimings};
pub use service::ReportQuery;
pub use sources::{MemoryProvider, RowSourceProvider};
pub use store::{can_admin, can_edit, can_view, MemoryReportStore, ReportStore};

pub use export::{ExportError, ExportFormat, ExportPayload};
