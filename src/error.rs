//! Pipeline-level error type
//!
//! [`CompileError`] names the pass that rejected the program and carries all
//! of that pass's diagnostics.

use crate::ir::InternalError;
use crate::parser::lexer::LexError;
use crate::parser::SyntaxError;
use crate::semantic::SemanticError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{}", one_per_line(.0))]
    Syntax(Vec<SyntaxError>),

    #[error("{}", one_per_line(.0))]
    Semantic(Vec<SemanticError>),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CompileError {
    /// Number of diagnostics carried
    pub fn count(&self) -> usize {
        match self {
            CompileError::Syntax(errors) => errors.len(),
            CompileError::Semantic(errors) => errors.len(),
            CompileError::Lex(_) | CompileError::Internal(_) => 1,
        }
    }

    /// True for compiler defects rather than problems in the source
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

/// One diagnostic per line
fn one_per_line<T: fmt::Display>(diagnostics: &[T]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
