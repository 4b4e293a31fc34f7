//! Statement parsing implementation
//!
//! This module handles parsing of all PL0 statement forms:
//!
//! - Assignments: `x := e`, `a[i] := e`
//! - Control flow: `if`, `if-else`, `while`, `break`
//! - Compound statements: `begin ... end`
//! - I/O: `read`, `write`, `print`
//! - Calls, `return` and `skip`
//!
//! # Grammar
//!
//! ```text
//! stmts     ::= statement (";" statement)* [";"]
//! statement ::= location ":=" expr | IDENT "(" [args] ")"
//!             | "if" cond "then" statement ["else" statement]
//!             | "while" cond "do" statement
//!             | "begin" stmts "end"
//!             | "break" | "skip" | "return" expr
//!             | "read" "(" location ")" | "write" "(" expr ")"
//!             | "print" "(" STRING ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};

impl Parser {
    /// Parse a `;`-separated statement list up to (not including) `end`.
    ///
    /// This is the statement-level recovery point: a failed statement is
    /// reported, its offending token skipped, and the list continues. A `;`
    /// resumes error reporting. The list also stops in front of `fun`, which
    /// belongs to the function list.
    pub(crate) fn parse_statement_list(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        loop {
            match self.parse_statement() {
                Ok(statement) => {
                    statements.push(statement);
                    self.recovered();
                }
                Err(err) => {
                    self.report(err);
                    if !self.at_list_end() {
                        self.skip_token();
                    }
                }
            }

            if self.match_token(&TokenKind::Semicolon) {
                self.recovered();
                if self.at_list_end() {
                    break;
                }
            } else if self.at_list_end() {
                break;
            } else {
                let err = self.unexpected("';' or 'end'");
                self.report(err);
            }
        }

        statements
    }

    /// `end`, `fun` or end of input: nothing more for a statement list
    fn at_list_end(&self) -> bool {
        self.check(&TokenKind::End) || self.check(&TokenKind::Fun) || self.is_at_end()
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let location = self.current_location();

        if self.match_token(&TokenKind::If) {
            return self.parse_if_statement(location);
        }

        if self.match_token(&TokenKind::While) {
            return self.parse_while_statement(location);
        }

        if self.match_token(&TokenKind::Begin) {
            let statements = self.parse_statement_list();
            self.expect_token(&TokenKind::End, "'end' to close block")?;
            return Ok(Stmt::Block {
                statements,
                location,
            });
        }

        if self.match_token(&TokenKind::Break) {
            return Ok(Stmt::Break { location });
        }

        if self.match_token(&TokenKind::Skip) {
            return Ok(Stmt::Skip { location });
        }

        if self.match_token(&TokenKind::Return) {
            let value = self.parse_expression()?;
            return Ok(Stmt::Return { value, location });
        }

        if self.match_token(&TokenKind::Read) {
            self.expect_token(&TokenKind::LParen, "'(' after 'read'")?;
            let target = self.parse_location()?;
            self.expect_token(&TokenKind::RParen, "')' after read target")?;
            return Ok(Stmt::Read { target, location });
        }

        if self.match_token(&TokenKind::Write) {
            self.expect_token(&TokenKind::LParen, "'(' after 'write'")?;
            let value = self.parse_expression()?;
            self.expect_token(&TokenKind::RParen, "')' after write argument")?;
            return Ok(Stmt::Write { value, location });
        }

        if self.match_token(&TokenKind::Print) {
            return self.parse_print_statement(location);
        }

        if let TokenKind::Ident(_) = self.peek_kind() {
            if let Some(TokenKind::LParen) = self.peek_ahead(1) {
                let (name, _) = self.expect_identifier("function name")?;
                let args = self.parse_call_arguments()?;
                return Ok(Stmt::Call {
                    name,
                    args,
                    location,
                });
            }

            let target = self.parse_location()?;
            self.expect_token(&TokenKind::Assign, "':=' in assignment")?;
            let value = self.parse_expression()?;
            return Ok(Stmt::Assignment {
                target,
                value,
                location,
            });
        }

        Err(self.unexpected("statement"))
    }

    /// Parse if statement (after 'if'). A trailing `else` binds to the
    /// nearest unmatched `if`.
    fn parse_if_statement(&mut self, location: SourceLocation) -> ParseResult<Stmt> {
        let condition = self.parse_condition()?;
        self.expect_token(&TokenKind::Then, "'then' after condition")?;
        let then_branch = Box::new(self.parse_statement()?);

        if self.match_token(&TokenKind::Else) {
            let else_branch = Box::new(self.parse_statement()?);
            return Ok(Stmt::IfElse {
                condition,
                then_branch,
                else_branch,
                location,
            });
        }

        Ok(Stmt::If {
            condition,
            then_branch,
            location,
        })
    }

    /// Parse while statement (after 'while')
    fn parse_while_statement(&mut self, location: SourceLocation) -> ParseResult<Stmt> {
        let condition = self.parse_condition()?;
        self.expect_token(&TokenKind::Do, "'do' after condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    /// Parse print statement (after 'print'): print("text")
    fn parse_print_statement(&mut self, location: SourceLocation) -> ParseResult<Stmt> {
        self.expect_token(&TokenKind::LParen, "'(' after 'print'")?;

        let text = match self.peek_kind() {
            TokenKind::StringLiteral(text) => text.clone(),
            _ => return Err(self.unexpected("string literal")),
        };
        self.advance();

        self.expect_token(&TokenKind::RParen, "')' after string")?;

        Ok(Stmt::Print { text, location })
    }
}
