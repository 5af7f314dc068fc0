//! FILENAME: engine/src/filter.rs
//! PURPOSE: Row filter clauses and their evaluation.
//! CONTEXT: Each data source may carry an ordered list of filters. A row is
//! kept when the left-to-right combination of all clauses is true.
//!
//! COMBINATION RULE:
//! The running result starts as `true` with a pending AND. Each clause is
//! combined with the pending operator, and then the clause's OWN logical
//! operator becomes the pending operator for the next clause. The first
//! clause's operator therefore governs the second combination, and the
//! last clause's operator is never used.

use crate::row::Row;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// FILTER DEFINITION
// ============================================================================

/// Comparison applied by a single filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    In,
    Between,
    /// Any operator name this engine does not know. Always evaluates to false.
    #[serde(other)]
    Unknown,
}

/// How a clause combines with the NEXT clause in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// The right-hand side of a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Used by `in` (any member) and `between` ([min, max]).
    List(Vec<FieldValue>),
    Scalar(FieldValue),
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Scalar(FieldValue::Null)
    }
}

macro_rules! scalar_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_filter_value!(FieldValue, f64, i64, i32, bool, &str, String);

/// A single filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: FilterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Filter {
            field: field.into(),
            operator,
            value: value.into(),
            logical_operator: None,
        }
    }

    /// Builds a `between` clause with an inclusive [min, max] range.
    pub fn between(field: impl Into<String>, min: impl Into<FieldValue>, max: impl Into<FieldValue>) -> Self {
        Filter::new(
            field,
            FilterOperator::Between,
            FilterValue::List(vec![min.into(), max.into()]),
        )
    }

    /// Builds an `in` clause.
    pub fn one_of(field: impl Into<String>, members: Vec<FieldValue>) -> Self {
        Filter::new(field, FilterOperator::In, FilterValue::List(members))
    }

    pub fn with_logical(mut self, op: LogicalOperator) -> Self {
        self.logical_operator = Some(op);
        self
    }

    /// Evaluates this clause alone against a row.
    pub fn matches(&self, row: &Row) -> bool {
        let field_value = row.get(&self.field);

        match (self.operator, &self.value) {
            (FilterOperator::Equals, FilterValue::Scalar(v)) => field_value == v,
            (FilterOperator::NotEquals, FilterValue::Scalar(v)) => field_value != v,
            (FilterOperator::GreaterThan, FilterValue::Scalar(v)) => {
                field_value.compare(v) == Some(Ordering::Greater)
            }
            (FilterOperator::LessThan, FilterValue::Scalar(v)) => {
                field_value.compare(v) == Some(Ordering::Less)
            }
            (FilterOperator::Contains, FilterValue::Scalar(v)) => {
                text_match(field_value, v, |hay, needle| hay.contains(needle))
            }
            (FilterOperator::StartsWith, FilterValue::Scalar(v)) => {
                text_match(field_value, v, |hay, needle| hay.starts_with(needle))
            }
            (FilterOperator::In, FilterValue::List(members)) => {
                members.iter().any(|member| member == field_value)
            }
            (FilterOperator::Between, FilterValue::List(bounds)) => match bounds.as_slice() {
                [min, max] => {
                    matches!(field_value.compare(min), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(field_value.compare(max), Some(Ordering::Less | Ordering::Equal))
                }
                _ => false,
            },
            // Shape mismatches (e.g. `in` with a scalar) and unknown operators
            _ => false,
        }
    }
}

/// Case-insensitive text comparison on the textual rendering of both sides.
fn text_match(field_value: &FieldValue, filter_value: &FieldValue, pred: impl Fn(&str, &str) -> bool) -> bool {
    if field_value.is_null() || filter_value.is_null() {
        return false;
    }
    let hay = field_value.display_text().to_lowercase();
    let needle = filter_value.display_text().to_lowercase();
    pred(&hay, &needle)
}

// ============================================================================
// SEQUENCE EVALUATION
// ============================================================================

/// Evaluates an ordered filter sequence against a row.
pub fn row_passes(row: &Row, filters: &[Filter]) -> bool {
    let mut result = true;
    let mut current_op = LogicalOperator::And;

    for filter in filters {
        let condition_met = filter.matches(row);
        result = match current_op {
            LogicalOperator::And => result && condition_met,
            LogicalOperator::Or => result || condition_met,
        };
        current_op = filter.logical_operator.unwrap_or_default();
    }

    result
}

/// Keeps the rows that pass the filter sequence, preserving order.
pub fn apply_filters(rows: Vec<Row>, filters: &[Filter]) -> Vec<Row> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter().filter(|row| row_passes(row, filters)).collect()
}
