//! FILENAME: report-engine/src/cache.rs
//! Result cache.
//!
//! Entries are keyed by a hash of the report id and its execution
//! parameters, so two parameter sets never share a cached result. An entry
//! lives until `expires_at`; there is no capacity eviction. Several live
//! entries may exist for one key (concurrent writers); lookups return the
//! oldest live one.

use crate::definition::ReportId;
use crate::result::ExecutionMetadata;
use chrono::{DateTime, Utc};
use engine::Row;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Caller-supplied execution parameters. Ordered, so the JSON form is canonical.
pub type Parameters = BTreeMap<String, Value>;

// ============================================================================
// CACHE KEY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(report_id: &str, parameters: &Parameters) -> Self {
        let mut hasher = FxHasher::default();
        report_id.hash(&mut hasher);
        canonical_json(parameters).hash(&mut hasher);
        CacheKey(hasher.finish())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Serializes parameters with object keys sorted at every depth.
pub fn canonical_json(parameters: &Parameters) -> String {
    let object: Map<String, Value> = parameters
        .iter()
        .map(|(k, v)| (k.clone(), canonicalize(v)))
        .collect();
    Value::Object(object).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// ENTRIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResult {
    pub id: Uuid,
    pub report_id: ReportId,
    pub cache_key: CacheKey,
    pub executed_by: String,
    pub parameters: Parameters,
    pub rows: Vec<Row>,
    pub metadata: ExecutionMetadata,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedResult {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// ============================================================================
// STORE
// ============================================================================

pub trait ResultCache {
    fn insert(&mut self, entry: CachedResult);

    /// Oldest entry for `key` that has not expired at `now`.
    /// The entry's report and parameters must also match; the key is only a hash.
    fn lookup(
        &self,
        key: &CacheKey,
        report_id: &str,
        parameters: &Parameters,
        now: DateTime<Utc>,
    ) -> Option<CachedResult>;

    /// Drops every expired entry. Returns how many were removed.
    fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize;

    /// Drops every entry of a report. Returns how many were removed.
    fn remove_for_report(&mut self, report_id: &str) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryResultCache {
    entries: Vec<CachedResult>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CachedResult] {
        &self.entries
    }
}

impl ResultCache for MemoryResultCache {
    fn insert(&mut self, entry: CachedResult) {
        self.entries.push(entry);
    }

    fn lookup(
        &self,
        key: &CacheKey,
        report_id: &str,
        parameters: &Parameters,
        now: DateTime<Utc>,
    ) -> Option<CachedResult> {
        self.entries
            .iter()
            .find(|e| {
                e.cache_key == *key
                    && e.report_id == report_id
                    && e.parameters == *parameters
                    && e.is_live(now)
            })
            .cloned()
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_live(now));
        before - self.entries.len()
    }

    fn remove_for_report(&mut self, report_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.report_id != report_id);
        before - self.entries.len()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
