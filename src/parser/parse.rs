//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the syntax error type, helper methods, error recovery and the
//! main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, recovery and coordination
//! - `declarations`: program, function, parameter, local and type parsing
//! - `statements`: statement lists and every statement form
//! - `expressions`: arithmetic expressions and conditions
//!
//! # Error Recovery
//!
//! Parse methods return `Result<_, SyntaxError>` and bubble the first error up
//! to the nearest statement list (or the function list). There the error is
//! recorded, the offending token is skipped, and parsing resumes. Follow-on
//! errors are suppressed until a statement or function parses cleanly, so one
//! mistake yields one diagnostic while independent mistakes each get their own.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Syntax error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    /// A token that does not fit the grammar at this point
    #[error("line {}: unexpected {found}, expected {expected}", .location.line)]
    UnexpectedToken {
        found: String,
        expected: String,
        location: SourceLocation,
    },

    /// Input ended inside an unterminated construct
    #[error("line {}: unexpected end of input, expected {expected}", .location.line)]
    UnexpectedEof {
        expected: String,
        location: SourceLocation,
    },
}

impl SyntaxError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            SyntaxError::UnexpectedToken { location, .. } => location,
            SyntaxError::UnexpectedEof { location, .. } => location,
        }
    }
}

pub(crate) type ParseResult<T> = Result<T, SyntaxError>;

/// Result of a parse: the (possibly partial) program and every syntax error
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub program: Program,
    pub errors: Vec<SyntaxError>,
}

impl ParseOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The program if no syntax errors were recorded
    pub fn into_result(self) -> Result<Program, Vec<SyntaxError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

/// Parse a token stream into a program.
pub fn parse(tokens: Vec<Token>) -> ParseOutcome {
    Parser::new(tokens).parse_program()
}

/// Recursive descent parser for PL0
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) next_id: NodeId,
    pub(crate) errors: Vec<SyntaxError>,
    pub(crate) recovering: bool,
}

impl Parser {
    /// Create a parser over a token stream. A missing trailing
    /// [`TokenKind::Eof`] is appended.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, location));
        }

        Self {
            tokens,
            position: 0,
            next_id: 0,
            errors: Vec::new(),
            recovering: false,
        }
    }

    /// Tokenize `source` and create a parser over the result.
    pub fn from_source(source: &str) -> Result<Self, LexError> {
        let mut lexer = Lexer::new(source);
        Ok(Self::new(lexer.tokenize()?))
    }

    /// Parse the entire program, collecting every syntax error
    pub fn parse_program(mut self) -> ParseOutcome {
        let program = self.parse_program_body();

        debug!(
            functions = program.functions().len(),
            errors = self.errors.len(),
            "parsed program"
        );

        ParseOutcome {
            program,
            errors: self.errors,
        }
    }

    // ===== Error recovery =====

    /// Record a syntax error unless a previous one is still being recovered from.
    /// End-of-input is always recorded, but only once.
    pub(crate) fn report(&mut self, error: SyntaxError) {
        if let SyntaxError::UnexpectedEof { .. } = error {
            if self
                .errors
                .iter()
                .any(|e| matches!(e, SyntaxError::UnexpectedEof { .. }))
            {
                return;
            }
        } else if self.recovering {
            return;
        }

        debug!(%error, "syntax error");
        self.errors.push(error);
        self.recovering = true;
    }

    /// A construct parsed cleanly; resume reporting errors.
    pub(crate) fn recovered(&mut self) {
        self.recovering = false;
    }

    /// Skip the offending token (never the end-of-input marker).
    pub(crate) fn skip_token(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
    }

    /// Run `parse` and roll the parser back if it fails.
    pub(crate) fn speculate<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> Option<T> {
        let saved_pos = self.position;
        let saved_id = self.next_id;

        match parse(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.position = saved_pos;
                self.next_id = saved_id;
                None
            }
        }
    }

    /// Build the error for the current token given what was expected.
    pub(crate) fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                location: token.location,
            },
            ref kind => SyntaxError::UnexpectedToken {
                found: kind.to_string(),
                expected: expected.to_string(),
                location: token.location,
            },
        }
    }

    // ===== Helper methods =====

    pub(crate) fn mint_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + n).map(|t| &t.kind)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Consume a token of the given kind or fail, returning its location.
    pub(crate) fn expect_token(
        &mut self,
        kind: &TokenKind,
        expected: &str,
    ) -> ParseResult<SourceLocation> {
        if self.check(kind) {
            Ok(self.advance().location)
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_identifier(
        &mut self,
        expected: &str,
    ) -> ParseResult<(String, SourceLocation)> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            let name = name.clone();
            let location = self.advance().location;
            Ok((name, location))
        } else {
            Err(self.unexpected(expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> ParseOutcome {
        Parser::from_source(source)
            .expect("lexing failed")
            .parse_program()
    }

    #[test]
    fn test_parse_simple_function() {
        let outcome = parse_source("fun main() begin write(1 + 2) end");
        let program = outcome.into_result().unwrap();

        let functions = program.functions();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "main");
        assert!(functions[0].params.is_empty());
        assert!(functions[0].locals.is_empty());
        assert_eq!(functions[0].body.len(), 1);
        assert!(matches!(functions[0].body[0], Stmt::Write { .. }));
    }

    #[test]
    fn test_missing_eof_is_appended() {
        let tokens = vec![Token::new(TokenKind::Skip, SourceLocation::new(1, 1))];
        let program = parse(tokens).into_result().unwrap();

        assert!(matches!(program, Program::Statement(Stmt::Skip { .. })));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let outcome = parse(Vec::new());

        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            SyntaxError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_multiple_errors_are_reported() {
        let source = "fun main()\n\
                      begin\n\
                        x := ;\n\
                        y := 1;\n\
                        z := )\n\
                      end";
        let outcome = parse_source(source);

        assert_eq!(outcome.errors.len(), 2, "{:?}", outcome.errors);
        assert_eq!(outcome.errors[0].location().line, 3);
        assert_eq!(outcome.errors[1].location().line, 5);
    }

    #[test]
    fn test_error_names_lexeme_and_expectation() {
        let outcome = parse_source("fun main() begin x := * end");

        assert_eq!(outcome.errors.len(), 1);
        match &outcome.errors[0] {
            SyntaxError::UnexpectedToken {
                found, expected, ..
            } => {
                assert_eq!(found, "'*'");
                assert_eq!(expected, "expression");
            }
            other => panic!("Expected unexpected-token error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_function_reports_end_of_input() {
        let outcome = parse_source("fun main() begin write(1)");

        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            SyntaxError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_recovery_continues_with_next_function() {
        let source = "fun f(a int) begin skip end\n\
                      fun main() begin x := end";
        let outcome = parse_source(source);

        // the bad header and the bad assignment are reported separately
        assert_eq!(outcome.errors.len(), 2, "{:?}", outcome.errors);
        assert_eq!(outcome.errors[0].location().line, 1);
        assert_eq!(outcome.errors[1].location().line, 2);
        assert_eq!(outcome.program.functions().len(), 1);
        assert_eq!(outcome.program.functions()[0].name, "main");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "fun f(a: int) begin return a * 2 end\n\
                      fun main() x: int begin x := f(3); write(x) end";

        let first = parse_source(source).into_result().unwrap();
        let second = parse_source(source).into_result().unwrap();

        assert_eq!(first, second);
    }
}
