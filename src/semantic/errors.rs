//! Semantic error types for the PL0 checker
//!
//! This module defines [`SemanticError`], which represents every problem the
//! checker can find in a syntactically valid program. Checking never stops at
//! the first error: all of them are collected and reported together.

use crate::parser::ast::SourceLocation;
use crate::semantic::types::ValueType;
use std::fmt;
use thiserror::Error;

/// What kind of name a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Parameter,
    Local,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Parameter => write!(f, "parameter"),
            SymbolKind::Local => write!(f, "variable"),
        }
    }
}

/// How a name was misused as a storage location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUsage {
    /// `x[i]` where `x` is a scalar
    IndexedScalar,
    /// `a` where `a` is an array and an element was required
    UnindexedArray,
    /// `f` where `f` is a function
    FunctionAsValue,
}

impl fmt::Display for LocationUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationUsage::IndexedScalar => write!(f, "scalar cannot be indexed"),
            LocationUsage::UnindexedArray => write!(f, "array used without an index"),
            LocationUsage::FunctionAsValue => write!(f, "function used as a value"),
        }
    }
}

/// Semantic errors found while checking a program
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// A name declared twice in the same scope
    #[error(
        "line {}: duplicate {kind} '{name}' (first declared on line {})",
        .location.line,
        .previous.line
    )]
    DuplicateSymbol {
        name: String,
        kind: SymbolKind,
        previous: SourceLocation,
        location: SourceLocation,
    },

    /// A name that resolves to nothing suitable
    #[error("line {}: undefined {kind} '{name}'", .location.line)]
    UndefinedSymbol {
        name: String,
        kind: SymbolKind,
        location: SourceLocation,
    },

    /// Call with the wrong number of arguments
    #[error(
        "line {}: function '{name}' expects {expected} argument(s), got {got}",
        .location.line
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Incompatible types
    #[error("line {}: type mismatch in {context}: expected {expected}, found {found}", .location.line)]
    TypeMismatch {
        context: String,
        expected: ValueType,
        found: ValueType,
        location: SourceLocation,
    },

    /// `break` outside any loop
    #[error("line {}: 'break' outside of a loop", .location.line)]
    InvalidBreakContext { location: SourceLocation },

    /// A location used against its declared kind
    #[error("line {}: invalid use of '{name}': {usage}", .location.line)]
    InvalidLocationKind {
        name: String,
        usage: LocationUsage,
        location: SourceLocation,
    },

    /// No `main` function. Reported at the last function header.
    #[error("line {}: program has no 'main' function", .location.line)]
    MissingMain { location: SourceLocation },
}

/// Fieldless discriminant of [`SemanticError`], for matching in tests and tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    DuplicateSymbol,
    UndefinedSymbol,
    ArityMismatch,
    TypeMismatch,
    InvalidBreakContext,
    InvalidLocationKind,
    MissingMain,
}

impl SemanticError {
    pub fn kind(&self) -> SemanticErrorKind {
        match self {
            SemanticError::DuplicateSymbol { .. } => SemanticErrorKind::DuplicateSymbol,
            SemanticError::UndefinedSymbol { .. } => SemanticErrorKind::UndefinedSymbol,
            SemanticError::ArityMismatch { .. } => SemanticErrorKind::ArityMismatch,
            SemanticError::TypeMismatch { .. } => SemanticErrorKind::TypeMismatch,
            SemanticError::InvalidBreakContext { .. } => SemanticErrorKind::InvalidBreakContext,
            SemanticError::InvalidLocationKind { .. } => SemanticErrorKind::InvalidLocationKind,
            SemanticError::MissingMain { .. } => SemanticErrorKind::MissingMain,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            SemanticError::DuplicateSymbol { location, .. }
            | SemanticError::UndefinedSymbol { location, .. }
            | SemanticError::ArityMismatch { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::InvalidBreakContext { location }
            | SemanticError::InvalidLocationKind { location, .. }
            | SemanticError::MissingMain { location } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line_numbers() {
        let err = SemanticError::ArityMismatch {
            name: "f".to_string(),
            expected: 1,
            got: 2,
            location: SourceLocation::new(4, 9),
        };

        assert_eq!(
            err.to_string(),
            "line 4: function 'f' expects 1 argument(s), got 2"
        );
        assert_eq!(err.kind(), SemanticErrorKind::ArityMismatch);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = SemanticError::TypeMismatch {
            context: "assignment".to_string(),
            expected: ValueType::INT,
            found: ValueType::FLOAT,
            location: SourceLocation::new(2, 1),
        };

        assert_eq!(
            err.to_string(),
            "line 2: type mismatch in assignment: expected int, found float"
        );
    }

    #[test]
    fn test_missing_main_message() {
        let err = SemanticError::MissingMain {
            location: SourceLocation::new(7, 1),
        };

        assert_eq!(err.to_string(), "line 7: program has no 'main' function");
        assert_eq!(err.location().line, 7);
    }
}
