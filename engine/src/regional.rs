//! FILENAME: engine/src/regional.rs
//! PURPOSE: Warsaw district weighting applied to report rows.
//! CONTEXT: Field-service value depends on where and when the work happens.
//! A data source can carry RegionalSettings; when present, its rows go through
//! up to four steps, each behind its own toggle:
//!   1. District filter: keep rows in the configured district
//!   2. Affluence weighting: `affluenceWeightedValue = value * district multiplier`
//!   3. Seasonal adjustment: `seasonalAdjustedValue = value * month factor`
//!   4. Route efficiency: a single score for the whole row set
//! The step outcomes are summarised in RegionalMetrics.

use crate::clock::Clock;
use crate::row::Row;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};

pub const VALUE_FIELD: &str = "value";
pub const DISTRICT_FIELD: &str = "district";
pub const ADDRESS_FIELD: &str = "address";
pub const AFFLUENCE_FIELD: &str = "affluenceWeightedValue";
pub const SEASONAL_FIELD: &str = "seasonalAdjustedValue";

/// Multiplier used when the district is unset or not one of the 18 below.
pub const DEFAULT_DISTRICT_MULTIPLIER: f64 = 1.0;

/// Affluence multipliers for the 18 districts of Warsaw.
pub const DISTRICT_MULTIPLIERS: [(&str, f64); 18] = [
    ("Śródmieście", 1.5),
    ("Wilanów", 1.4),
    ("Mokotów", 1.3),
    ("Żoliborz", 1.3),
    ("Ursynów", 1.2),
    ("Ochota", 1.1),
    ("Wola", 1.1),
    ("Bielany", 1.0),
    ("Bemowo", 1.0),
    ("Wesoła", 1.0),
    ("Włochy", 0.9),
    ("Praga-Południe", 0.9),
    ("Wawer", 0.9),
    ("Białołęka", 0.9),
    ("Ursus", 0.9),
    ("Targówek", 0.8),
    ("Praga-Północ", 0.8),
    ("Rembertów", 0.8),
];

/// HVAC demand by calendar month, January first.
/// Heating peaks in Dec/Jan, cooling peaks in Jul/Aug, May is the trough.
pub const SEASONAL_FACTORS: [f64; 12] = [
    1.5, // January
    1.3, // February
    1.0, // March
    0.9, // April
    0.8, // May
    1.2, // June
    1.5, // July
    1.5, // August
    1.1, // September
    1.0, // October
    1.2, // November
    1.5, // December
];

// ============================================================================
// SETTINGS AND METRICS
// ============================================================================

/// Per-source regional configuration ("Warsaw settings").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionalSettings {
    pub district: Option<String>,
    pub affluence_weighting: bool,
    pub seasonal_adjustment: bool,
    pub route_efficiency: bool,
}

impl RegionalSettings {
    pub fn for_district(district: impl Into<String>) -> Self {
        RegionalSettings {
            district: Some(district.into()),
            ..Default::default()
        }
    }

    pub fn with_affluence(mut self) -> Self {
        self.affluence_weighting = true;
        self
    }

    pub fn with_seasonal(mut self) -> Self {
        self.seasonal_adjustment = true;
        self
    }

    pub fn with_route_efficiency(mut self) -> Self {
        self.route_efficiency = true;
        self
    }

    fn district(&self) -> Option<&str> {
        self.district.as_deref().filter(|d| !d.is_empty())
    }
}

/// Summary of one weighting pass. Scores are None when their step was off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalMetrics {
    pub districts_analyzed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affluence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_efficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_factor: Option<f64>,
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Affluence multiplier for a district name (exact match).
pub fn district_multiplier(district: Option<&str>) -> f64 {
    district
        .and_then(|name| {
            DISTRICT_MULTIPLIERS
                .iter()
                .find(|(known, _)| *known == name)
                .map(|(_, m)| *m)
        })
        .unwrap_or(DEFAULT_DISTRICT_MULTIPLIER)
}

/// Seasonal factor for a 1-based month. Out-of-range months get 1.0.
pub fn seasonal_factor(month: u32) -> f64 {
    month
        .checked_sub(1)
        .and_then(|i| SEASONAL_FACTORS.get(i as usize))
        .copied()
        .unwrap_or(1.0)
}

/// Route efficiency score for a row set, clamped to 0..=100.
///
/// Stand-in for a route optimiser: 3 of every 5 visits are assumed to be
/// on an efficient route, so any non-empty set scores 60.
pub fn route_efficiency(row_count: usize) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    let optimised = row_count as f64 * 3.0;
    let total = row_count as f64 * 5.0;
    (optimised / total * 100.0).clamp(0.0, 100.0)
}

fn in_district(row: &Row, district: &str) -> bool {
    row.get(DISTRICT_FIELD).as_text() == Some(district)
        || row
            .get(ADDRESS_FIELD)
            .as_text()
            .is_some_and(|address| address.contains(district))
}

fn weighted(row: &Row, factor: f64) -> FieldValue {
    match row.get(VALUE_FIELD) {
        FieldValue::Number(v) => FieldValue::Number(v * factor),
        _ => FieldValue::Null,
    }
}

// ============================================================================
// WEIGHTING PASS
// ============================================================================

/// Applies the enabled weighting steps to a row set.
pub fn apply_regional_weighting(
    rows: Vec<Row>,
    settings: &RegionalSettings,
    clock: &dyn Clock,
) -> (Vec<Row>, RegionalMetrics) {
    let mut metrics = RegionalMetrics::default();

    let mut rows = match settings.district() {
        Some(district) => rows.into_iter().filter(|row| in_district(row, district)).collect(),
        None => rows,
    };

    if settings.affluence_weighting {
        let multiplier = district_multiplier(settings.district());
        for row in rows.iter_mut() {
            let value = weighted(row, multiplier);
            row.set(AFFLUENCE_FIELD, value);
        }
        metrics.affluence_score = Some(multiplier);
    }

    if settings.seasonal_adjustment {
        let factor = seasonal_factor(clock.current_month());
        for row in rows.iter_mut() {
            let value = weighted(row, factor);
            row.set(SEASONAL_FIELD, value);
        }
        metrics.seasonal_factor = Some(factor);
    }

    if settings.route_efficiency {
        metrics.route_efficiency = Some(route_efficiency(rows.len()));
    }

    metrics.districts_analyzed = districts_in(&rows);
    if metrics.districts_analyzed.is_empty() {
        if let Some(district) = settings.district() {
            metrics.districts_analyzed.push(district.to_string());
        }
    }

    crate::log_debug!(
        "REGIONAL",
        "weighted {} rows district={:?} affluence={:?} seasonal={:?}",
        rows.len(),
        settings.district(),
        metrics.affluence_score,
        metrics.seasonal_factor
    );

    (rows, metrics)
}

/// Distinct district names found in the rows, in first-occurrence order.
fn districts_in(rows: &[Row]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        if let Some(d) = row.get(DISTRICT_FIELD).as_text() {
            if !d.is_empty() && !seen.iter().any(|s| s == d) {
                seen.push(d.to_string());
            }
        }
    }
    seen
}
