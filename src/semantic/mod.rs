//! Semantic analysis
//!
//! This module checks a parsed program before lowering:
//! - [`symtab`]: Lexically nested scopes with per-scope loop tracking
//! - [`checker`]: Scoping, typing and context checks over the AST
//! - [`types`]: Value types and the per-node type table
//! - [`errors`]: Semantic error types
//!
//! A program is accepted when [`check`] reports no errors. The resulting
//! [`TypeTable`] is what the IR generator consumes.

pub mod checker;
pub mod errors;
pub mod symtab;
pub mod types;

pub use checker::{check, Analysis};
pub use errors::{SemanticError, SemanticErrorKind};
pub use symtab::SymbolTable;
pub use types::{TypeTable, ValueType};
