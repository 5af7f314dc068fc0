//! FILENAME: report-engine/src/sources.rs
//! PURPOSE: Row-source providers behind the data-source types.
//! CONTEXT: The executor resolves each `DataSource` to one of three fetch
//! calls. Providers may fail; the executor absorbs every `SourceError` into
//! an empty row set, so implementations should report problems rather than
//! paper over them.

use crate::error::SourceError;
use engine::{Filter, Row};
use rustc_hash::FxHashMap;

pub trait RowSourceProvider {
    /// Rows of a document-store collection. `filters` are the source's own
    /// clauses, offered as a pushdown hint; the executor filters again.
    fn fetch_documents(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, SourceError>;

    /// Rows from the external relational store. Not wired to a backend.
    fn fetch_external(&self, _table: &str, _query: Option<&str>) -> Result<Vec<Row>, SourceError> {
        Ok(Vec::new())
    }

    /// Semantic search results for a free-text query.
    fn fetch_vector(&self, query: &str, result_type: Option<&str>, limit: usize) -> Result<Vec<Row>, SourceError>;
}

impl<P: RowSourceProvider + ?Sized> RowSourceProvider for &P {
    fn fetch_documents(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_documents(table, filters)
    }

    fn fetch_external(&self, table: &str, query: Option<&str>) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_external(table, query)
    }

    fn fetch_vector(&self, query: &str, result_type: Option<&str>, limit: usize) -> Result<Vec<Row>, SourceError> {
        (**self).fetch_vector(query, result_type, limit)
    }
}

// ============================================================================
// IN-MEMORY PROVIDER
// ============================================================================

/// Named collections held in memory, plus a small term-matching index that
/// stands in for the semantic search service.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    collections: FxHashMap<String, Vec<Row>>,
    vector_documents: Vec<(String, Row)>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.insert_collection(name, rows);
        self
    }

    pub fn insert_collection(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.collections.insert(name.into(), rows);
    }

    /// Adds searchable documents tagged with a result type.
    pub fn with_vector_documents(mut self, result_type: impl Into<String>, rows: Vec<Row>) -> Self {
        let result_type = result_type.into();
        self.vector_documents
            .extend(rows.into_iter().map(|row| (result_type.clone(), row)));
        self
    }
}

impl RowSourceProvider for MemoryProvider {
    fn fetch_documents(&self, table: &str, _filters: &[Filter]) -> Result<Vec<Row>, SourceError> {
        self.collections
            .get(table)
            .cloned()
            .ok_or_else(|| SourceError::UnknownTable(table.to_string()))
    }

    fn fetch_vector(&self, query: &str, result_type: Option<&str>, limit: usize) -> Result<Vec<Row>, SourceError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &Row)> = self
            .vector_documents
            .iter()
            .filter(|(kind, _)| result_type.map_or(true, |t| t == kind))
            .map(|(_, row)| (match_score(row, &terms), row))
            .filter(|(score, _)| *score > 0)
            .collect();

        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored.into_iter().take(limit).map(|(_, row)| row.clone()).collect())
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Number of query terms found in the row's text fields.
fn match_score(row: &Row, terms: &[String]) -> usize {
    let haystack: String = row
        .iter()
        .filter_map(|(_, value)| value.as_text().map(str::to_lowercase))
        .collect::<Vec<_>>()
        .join(" ");
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}
