//! PL0 source code parser
//!
//! This module transforms PL0 source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, error recovery and the [`parse`](parse::parse) entry point
//! - [`declarations`], [`statements`], [`expressions`]: the grammar, split by construct
//! - [`ast`]: AST node definitions
//!
//! # Language
//!
//! - Types: `int`, `float`, and one-dimensional arrays of either
//! - Programs: one or more `fun` definitions, or a single bare statement
//! - Statements: assignment, `if`/`else`, `while`, `break`, `skip`, `return`,
//!   `begin ... end` blocks, calls, `read`, `write`, `print`
//! - Conditions: relational comparisons combined with `and`, `or`, `not`
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with panic-mode error recovery, so a
//! single run reports every independent syntax error.
//! No external parser generator dependencies.

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;

pub use parse::{parse, ParseOutcome, Parser, SyntaxError};
