//! scenario-core: expression tree and reader for scenario scripts.
//!
//! Scenario commands are written as s-expressions. The reader turns text
//! into [`Expression`] trees; it assigns no meaning to atoms. Interpretation
//! belongs to the evaluator in `scenario-eval`.
//!
//! # Public API
//!
//! - [`Expression`] -- atom or ordered list
//! - [`parse_expression()`] -- read exactly one expression
//! - [`parse_command()`] -- read one scenario line, grouping bare items
//! - [`parse_script()`] -- read one command per line
//! - [`ParseError`] -- reader error with line number

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::Expression;
pub use error::ParseError;
pub use parser::{parse_command, parse_expression, parse_script};
