//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that can be evaluated.
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("-" | "+") unary | primary
//!   primary        --> NUMBER | "(" expression ")"
//!
//! Input comes from substituted row values, so its size is not under our
//! control. Both the tree depth and the parenthesis/sign nesting are capped at
//! `MAX_DEPTH`; deeper input is a parse error instead of a stack overflow.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest expression tree, and deepest bracket or sign nesting, accepted.
pub const MAX_DEPTH: usize = 256;

/// A parsed subtree together with its depth.
type Node = (Expression, usize);

fn too_deep() -> ParseError {
    ParseError::new(format!("Expression nested deeper than {} levels", MAX_DEPTH))
}

fn node(expr: Expression, depth: usize) -> ParseResult<Node> {
    if depth > MAX_DEPTH {
        return Err(too_deep());
    }
    Ok((expr, depth))
}

fn binary(left: Node, op: BinaryOperator, right: Node) -> ParseResult<Node> {
    let depth = 1 + left.1.max(right.1);
    node(
        Expression::BinaryOp {
            left: Box::new(left.0),
            op,
            right: Box::new(right.0),
        },
        depth,
    )
}

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            nesting: 0,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let (expr, _) = self.parse_expression()?;

        // Trailing tokens mean juxtaposed operands like "2 3" or "(1)(2)"
        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {:?}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Checks if the current token matches the expected token.
    /// If it matches, advances and returns Ok. Otherwise returns an error.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {:?}, found {:?}",
                expected, self.current_token
            )))
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Node> {
        self.parse_additive()
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = binary(left, op, right)?;
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Node> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = binary(left, op, right)?;
        }

        Ok(left)
    }

    /// Parses unary sign prefixes.
    fn parse_unary(&mut self) -> ParseResult<Node> {
        let op = match &self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        self.advance();
        self.enter()?;
        let (operand, depth) = self.parse_unary()?;
        self.leave();
        node(
            Expression::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            depth + 1,
        )
    }

    /// Parses numeric literals and parenthesized groups.
    fn parse_primary(&mut self) -> ParseResult<Node> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok((Expression::Number(n), 1))
            }

            Token::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_expression()?;
                self.leave();
                self.expect(Token::RParen)?;
                Ok(inner)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression")),

            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),

            token => Err(ParseError::new(format!("Unexpected token: {:?}", token))),
        }
    }
}

/// Convenience function to parse a formula string directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input);
    parser.parse()
}
