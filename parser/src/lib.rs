//! FILENAME: parser/src/lib.rs
//! PURPOSE: Library root for the calculated-field formula parser.
//! CONTEXT: Calculated fields are restricted to plain arithmetic. This crate
//! turns an already-substituted formula string into an expression tree that
//! the engine evaluates to a number.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /
//! - Unary sign: -5, +5
//! - Numeric literals: 42, 3.14, .5
//! - Parentheses for grouping
//!
//! Anything else (identifiers, strings, comparisons, function calls) is
//! rejected with a ParseError.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser, MAX_DEPTH};
pub use token::Token;
