//! FILENAME: engine/src/aggregate.rs
//! Grouped aggregation of report rows.
//!
//! Rows are bucketed by the value of a group-by field in order of first
//! occurrence. Each bucket collapses into one output row holding the group
//! key and a single aggregate over the y-axis field.
//!
//! Only `FieldValue::Number` counts as numeric. `count` is the bucket size
//! regardless of value types; every other function looks at numbers only.

use crate::row::Row;
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Field that receives the aggregate when no y-axis is configured.
pub const DEFAULT_VALUE_FIELD: &str = "value";

/// Supported aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    Distinct,
}

// ============================================================================
// GROUP KEYS
// ============================================================================

/// A hashable form of a FieldValue used to bucket rows.
/// NaN keys collapse together and -0.0 groups with 0.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Number(u64),
    Text(String),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl From<&FieldValue> for GroupKey {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => GroupKey::Null,
            FieldValue::Number(n) => GroupKey::Number(number_bits(*n)),
            FieldValue::Text(s) => GroupKey::Text(s.clone()),
            FieldValue::Boolean(b) => GroupKey::Boolean(*b),
            FieldValue::Date(d) => GroupKey::Date(*d),
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        u64::MAX
    } else if n == 0.0 {
        0.0_f64.to_bits()
    } else {
        n.to_bits()
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state for one group.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    count: usize,
    numbers: Vec<f64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: &FieldValue) {
        self.count += 1;
        if let Some(n) = value.as_number() {
            self.numbers.push(n);
        }
    }

    // Folds from +0.0 so an empty group never reports -0.
    fn sum(&self) -> f64 {
        self.numbers.iter().fold(0.0, |acc, n| acc + n)
    }

    /// Computes the aggregate. Empty numeric sets yield 0.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Sum => self.sum(),
            AggregationType::Avg => {
                if self.numbers.is_empty() {
                    0.0
                } else {
                    self.sum() / self.numbers.len() as f64
                }
            }
            AggregationType::Count => self.count as f64,
            AggregationType::Min => self.numbers.iter().copied().reduce(f64::min).unwrap_or(0.0),
            AggregationType::Max => self.numbers.iter().copied().reduce(f64::max).unwrap_or(0.0),
            AggregationType::Distinct => {
                let unique: FxHashSet<u64> = self.numbers.iter().map(|n| number_bits(*n)).collect();
                unique.len() as f64
            }
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Groups and aggregates rows.
///
/// Rows pass through unchanged unless both `group_by` and `aggregation` are set.
pub fn aggregate_rows(
    rows: Vec<Row>,
    group_by: Option<&str>,
    y_axis: Option<&str>,
    aggregation: Option<AggregationType>,
) -> Vec<Row> {
    let (group_by, aggregation) = match (group_by, aggregation) {
        (Some(g), Some(a)) => (g, a),
        _ => return rows,
    };
    let y_axis = y_axis.unwrap_or(DEFAULT_VALUE_FIELD);

    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<(FieldValue, Accumulator)> = Vec::new();

    for row in &rows {
        let key_value = row.get(group_by);
        let slot = *index.entry(GroupKey::from(key_value)).or_insert_with(|| {
            groups.push((key_value.clone(), Accumulator::new()));
            groups.len() - 1
        });
        groups[slot].1.add(row.get(y_axis));
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            Row::new()
                .with(group_by, key)
                .with(y_axis, acc.compute(aggregation))
        })
        .collect()
}
