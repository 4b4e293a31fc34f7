//! Declaration parsing implementation
//!
//! This module handles parsing of the top level of PL0 programs:
//!
//! - Programs: a list of functions, or one bare statement
//! - Function definitions: `fun name(params) locals begin body end`
//! - Parameters and local declarations: `name: type`
//! - Type names: `int`, `float`, `int[10]`, `float[n + 1]`
//!
//! # Grammar
//!
//! ```text
//! program  ::= function+ | statement
//! function ::= "fun" IDENT "(" [param ("," param)*] ")" [decls] "begin" stmts "end"
//! decls    ::= vardecl (";" vardecl)* [";"]
//! vardecl  ::= IDENT ":" typename
//! typename ::= ("int" | "float") ["[" (INTEGER | expr) "]"]
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};

impl Parser {
    /// Parse a whole program, recovering from errors at the function level
    pub(crate) fn parse_program_body(&mut self) -> Program {
        if self.is_at_end() {
            let err = self.unexpected("'fun' or a statement");
            self.report(err);
            return Program::Functions(Vec::new());
        }

        if !self.check(&TokenKind::Fun) {
            return self.parse_statement_program();
        }

        let mut functions = Vec::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::Fun) {
                // a new function header is a synchronization point
                self.recovered();
                match self.parse_function_definition() {
                    Ok(function) => functions.push(function),
                    Err(err) => {
                        self.report(err);
                        // the header's own `fun` was consumed, so a `fun`
                        // here starts the next function
                        if !self.check(&TokenKind::Fun) {
                            self.skip_token();
                        }
                    }
                }
            } else {
                let err = self.unexpected("'fun'");
                self.report(err);
                self.skip_token();
            }
        }

        Program::Functions(functions)
    }

    /// Parse the alternate program form: a single statement
    fn parse_statement_program(&mut self) -> Program {
        let statement = match self.parse_statement() {
            Ok(statement) => Some(statement),
            Err(err) => {
                self.report(err);
                self.skip_token();
                None
            }
        };

        self.match_token(&TokenKind::Semicolon);
        if !self.is_at_end() {
            let err = self.unexpected("end of input");
            self.report(err);
            while !self.is_at_end() {
                self.advance();
            }
        }

        match statement {
            Some(statement) => Program::Statement(statement),
            None => Program::Functions(Vec::new()),
        }
    }

    /// Parse function definition: fun name(params) locals begin body end
    pub(crate) fn parse_function_definition(&mut self) -> ParseResult<FunctionDef> {
        self.expect_token(&TokenKind::Fun, "'fun'")?;
        let (name, location) = self.expect_identifier("function name")?;

        self.expect_token(&TokenKind::LParen, "'(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_token(&TokenKind::RParen, "')' after parameters")?;

        let locals = self.parse_local_declarations()?;

        self.expect_token(&TokenKind::Begin, "'begin' before function body")?;
        let body = self.parse_statement_list();
        self.expect_token(&TokenKind::End, "'end' after function body")?;

        Ok(FunctionDef {
            name,
            params,
            locals,
            body,
            location,
        })
    }

    /// Parse parameter list: name: type, name: type, ...
    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            params.push(self.parse_var_decl("parameter name")?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse the optional local declarations between the header and `begin`.
    /// A trailing `;` before `begin` is optional.
    fn parse_local_declarations(&mut self) -> ParseResult<Vec<VarDecl>> {
        let mut locals = Vec::new();

        while let TokenKind::Ident(_) = self.peek_kind() {
            locals.push(self.parse_var_decl("variable name")?);

            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
        }

        Ok(locals)
    }

    /// Parse `name: type`
    fn parse_var_decl(&mut self, expected: &str) -> ParseResult<VarDecl> {
        let (name, location) = self.expect_identifier(expected)?;
        self.expect_token(&TokenKind::Colon, "':' after name")?;
        let type_name = self.parse_type_name()?;

        Ok(VarDecl {
            name,
            type_name,
            location,
        })
    }

    /// Parse type: (int | float) [ '[' size ']' ]
    pub(crate) fn parse_type_name(&mut self) -> ParseResult<TypeName> {
        let base = if self.match_token(&TokenKind::Int) {
            BaseType::Int
        } else if self.match_token(&TokenKind::Float) {
            BaseType::Float
        } else {
            return Err(self.unexpected("type name ('int' or 'float')"));
        };

        if !self.match_token(&TokenKind::LBracket) {
            return Ok(TypeName::scalar(base));
        }

        // A lone integer literal is a fixed size; anything else is evaluated
        let fixed = match (self.peek_kind(), self.peek_ahead(1)) {
            (TokenKind::IntLiteral(n), Some(TokenKind::RBracket)) if *n >= 0 => Some(*n as u64),
            _ => None,
        };
        let size = match fixed {
            Some(n) => {
                self.advance();
                ArraySize::Fixed(n)
            }
            None => ArraySize::Dynamic(Box::new(self.parse_expression()?)),
        };

        self.expect_token(&TokenKind::RBracket, "']' after array size")?;

        Ok(TypeName::array(base, size))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse_ok(source: &str) -> Program {
        let outcome = Parser::from_source(source).unwrap().parse_program();
        assert!(outcome.is_ok(), "{:?}", outcome.errors);
        outcome.program
    }

    #[test]
    fn test_parse_parameters_and_locals() {
        let program = parse_ok(
            "fun f(a: int, b: float[10]) x: int; buf: float[a * 2]; begin skip end",
        );
        let f = &program.functions()[0];

        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].name, "a");
        assert_eq!(f.params[0].type_name, TypeName::scalar(BaseType::Int));
        assert_eq!(f.params[1].type_name.base, BaseType::Float);
        assert!(matches!(
            f.params[1].type_name.array_size,
            Some(ArraySize::Fixed(10))
        ));

        assert_eq!(f.locals.len(), 2);
        assert_eq!(f.locals[0].name, "x");
        assert!(matches!(
            f.locals[1].type_name.array_size,
            Some(ArraySize::Dynamic(_))
        ));
    }

    #[test]
    fn test_trailing_semicolons_are_optional() {
        let with = parse_ok("fun main() x: int; begin x := 1; end");
        let without = parse_ok("fun main() x: int begin x := 1 end");

        assert_eq!(with.functions()[0].locals, without.functions()[0].locals);
        assert_eq!(with.functions()[0].body.len(), 1);
        assert_eq!(without.functions()[0].body.len(), 1);
    }

    #[test]
    fn test_functions_keep_source_order() {
        let program = parse_ok(
            "fun c() begin skip end fun a() begin skip end fun main() begin skip end",
        );
        let names: Vec<&str> = program
            .functions()
            .iter()
            .map(|f| f.name.as_str())
            .collect();

        assert_eq!(names, vec!["c", "a", "main"]);
    }

    #[test]
    fn test_bare_statement_program() {
        let program = parse_ok("write(1 + 2)");

        assert!(matches!(program, Program::Statement(Stmt::Write { .. })));
    }

    #[test]
    fn test_missing_type_name() {
        let outcome = Parser::from_source("fun f(a: bool) begin skip end")
            .unwrap()
            .parse_program();

        assert!(!outcome.is_ok());
        assert!(outcome.errors[0].to_string().contains("type name"));
    }
}
