//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Evaluates arithmetic ASTs produced by the parser crate.
//! CONTEXT: Calculated fields substitute row values into their formula text,
//! parse it, and hand the tree to this module. Only +, -, *, / and unary
//! signs exist, so evaluation is a stack-driven post-order walk over f64.

use parser::{BinaryOperator, Expression, UnaryOperator};
use std::fmt;

/// Reasons an arithmetic evaluation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    DivisionByZero,
    /// The result (or an intermediate) overflowed to infinity or became NaN.
    NonFinite,
    /// An operator was left without its operands.
    Malformed,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::NonFinite => write!(f, "non-finite result"),
            EvalError::Malformed => write!(f, "malformed expression"),
        }
    }
}

impl std::error::Error for EvalError {}

pub type EvalResult = Result<f64, EvalError>;

/// Pending work for the evaluation loop.
enum Step<'a> {
    Visit(&'a Expression),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

/// Evaluates an expression tree to a finite number.
/// Walks the tree with an explicit stack, so tree depth never touches the call stack.
pub fn evaluate(expr: &Expression) -> EvalResult {
    let mut steps = vec![Step::Visit(expr)];
    let mut values: Vec<f64> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(Expression::Number(n)) => values.push(finite(*n)?),
            Step::Visit(Expression::UnaryOp { op, operand }) => {
                steps.push(Step::Unary(*op));
                steps.push(Step::Visit(operand));
            }
            Step::Visit(Expression::BinaryOp { left, op, right }) => {
                // left is popped (and evaluated) first
                steps.push(Step::Binary(*op));
                steps.push(Step::Visit(right));
                steps.push(Step::Visit(left));
            }
            Step::Unary(op) => {
                let v = values.pop().ok_or(EvalError::Malformed)?;
                values.push(match op {
                    UnaryOperator::Negate => -v,
                    UnaryOperator::Plus => v,
                });
            }
            Step::Binary(op) => {
                let r = values.pop().ok_or(EvalError::Malformed)?;
                let l = values.pop().ok_or(EvalError::Malformed)?;
                values.push(finite(apply(op, l, r)?)?);
            }
        }
    }

    match (values.pop(), values.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(EvalError::Malformed),
    }
}

fn apply(op: BinaryOperator, l: f64, r: f64) -> EvalResult {
    Ok(match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l / r
        }
    })
}

fn finite(value: f64) -> EvalResult {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}
