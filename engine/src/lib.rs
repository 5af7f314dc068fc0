//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the report row engine.
//! CONTEXT: Holds everything that operates on rows independent of where
//! they came from: the value model, filters, aggregation, calculated fields
//! and regional weighting. Re-exports public types for the report crates.

pub mod aggregate;
pub mod calculated;
pub mod clock;
pub mod evaluator;
pub mod filter;
pub mod logging;
pub mod regional;
pub mod row;
pub mod value;

// Used by the logging macros so downstream crates need no direct `log` dependency.
#[doc(hidden)]
pub use log as __log;

// Re-export commonly used types at the crate root
pub use aggregate::{aggregate_rows, Accumulator, AggregationType, DEFAULT_VALUE_FIELD};
pub use calculated::{apply_calculated_fields, evaluate_formula, CalculatedField, FieldDataType, FormulaEvaluator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use evaluator::{evaluate, EvalError, EvalResult};
pub use filter::{apply_filters, row_passes, Filter, FilterOperator, FilterValue, LogicalOperator};
pub use regional::{
    apply_regional_weighting, district_multiplier, route_efficiency, seasonal_factor,
    RegionalMetrics, RegionalSettings,
};
pub use row::Row;
pub use value::FieldValue;
