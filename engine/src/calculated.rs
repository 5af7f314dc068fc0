//! FILENAME: engine/src/calculated.rs
//! PURPOSE: Per-row calculated fields defined by restricted arithmetic formulas.
//! CONTEXT: A formula references other fields of the same row by name.
//! Evaluation happens in three steps:
//!   1. Substitute every row field (whole-word match) with its textual value.
//!   2. Reject the result unless it only contains digits, whitespace,
//!      + - * / ( ) and dots.
//!   3. Parse and evaluate with the arithmetic parser.
//! Any failure along the way yields 0. Evaluation never panics.

use crate::evaluator::evaluate;
use crate::row::Row;
use crate::value::FieldValue;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

static ARITHMETIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s+\-*/().]+$").expect("arithmetic whitelist pattern is valid"));

/// Declared result type of a calculated field. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldDataType {
    #[default]
    Number,
    String,
    Boolean,
    Date,
}

/// A derived per-row value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedField {
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub data_type: FieldDataType,
}

impl CalculatedField {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        CalculatedField {
            name: name.into(),
            formula: formula.into(),
            data_type: FieldDataType::Number,
        }
    }
}

/// Evaluates formulas against rows.
/// Keeps compiled whole-word patterns per field name across rows.
#[derive(Debug, Default)]
pub struct FormulaEvaluator {
    patterns: FxHashMap<String, Option<Regex>>,
}

impl FormulaEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitutes row values into the formula text, in row field order.
    pub fn substitute(&mut self, formula: &str, row: &Row) -> String {
        let mut expression = formula.to_string();
        for (name, value) in row.iter() {
            let Some(pattern) = self.pattern_for(name) else {
                continue;
            };
            let replacement = value.formula_text();
            expression = pattern
                .replace_all(&expression, NoExpand(&replacement))
                .into_owned();
        }
        expression
    }

    /// Evaluates a formula for one row. Returns 0 on any failure.
    pub fn evaluate(&mut self, formula: &str, row: &Row) -> f64 {
        let expression = self.substitute(formula, row);

        if !ARITHMETIC_ONLY.is_match(&expression) {
            crate::log_debug!("FORMULA", "rejected non-arithmetic formula '{}' -> '{}'", formula, expression);
            return 0.0;
        }

        let ast = match parser::parse(&expression) {
            Ok(ast) => ast,
            Err(e) => {
                crate::log_debug!("FORMULA", "'{}': {}", expression, e);
                return 0.0;
            }
        };

        match evaluate(&ast) {
            Ok(value) => value,
            Err(e) => {
                crate::log_debug!("FORMULA", "'{}': {}", expression, e);
                0.0
            }
        }
    }

    fn pattern_for(&mut self, name: &str) -> Option<&Regex> {
        if !self.patterns.contains_key(name) {
            let compiled = Regex::new(&format!(r"\b{}\b", regex::escape(name))).ok();
            self.patterns.insert(name.to_string(), compiled);
        }
        self.patterns.get(name).and_then(Option::as_ref)
    }
}

/// Evaluates a single formula against a row.
pub fn evaluate_formula(formula: &str, row: &Row) -> f64 {
    FormulaEvaluator::new().evaluate(formula, row)
}

/// Applies calculated fields to every row, in declared order.
/// Each result is stored as a number, so later formulas can reference
/// earlier calculated fields.
pub fn apply_calculated_fields(rows: &mut [Row], fields: &[CalculatedField]) {
    if fields.is_empty() {
        return;
    }
    let mut evaluator = FormulaEvaluator::new();
    for row in rows.iter_mut() {
        for field in fields {
            let value = evaluator.evaluate(&field.formula, row);
            row.set(field.name.clone(), FieldValue::Number(value));
        }
    }
}
