//! Expression parsing implementation
//!
//! This module handles parsing of arithmetic expressions and conditions with
//! proper precedence.
//!
//! # Operator Precedence (lowest to highest)
//!
//! 1. Logical OR: `or`
//! 2. Logical AND: `and`
//! 3. Logical NOT: `not` (right-associative)
//! 4. Relational: `<`, `<=`, `>`, `>=`, `==`, `!=`, `<>` (non-associative)
//! 5. Additive: `+`, `-`
//! 6. Multiplicative: `*`, `/`
//! 7. Unary: `-`, `+`
//! 8. Primary: literals, locations, calls, casts, parenthesized expressions
//!
//! Conditions and arithmetic expressions are separate syntactic categories, so
//! `(` at the start of a condition is ambiguous. It is first tried as a
//! parenthesized condition and falls back to an arithmetic operand.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};

impl Parser {
    // ===== Conditions =====

    /// Parse a condition (entry point for `if` and `while` guards)
    pub(crate) fn parse_condition(&mut self) -> ParseResult<Condition> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> ParseResult<Condition> {
        let mut left = self.parse_logical_and()?;

        while self.match_token(&TokenKind::Or) {
            let right = self.parse_logical_and()?;
            let location = *left.location();
            left = Condition::Logical {
                op: LogicOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Condition> {
        let mut left = self.parse_logical_not()?;

        while self.match_token(&TokenKind::And) {
            let right = self.parse_logical_not()?;
            let location = *left.location();
            left = Condition::Logical {
                op: LogicOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_logical_not(&mut self) -> ParseResult<Condition> {
        let location = self.current_location();

        if self.match_token(&TokenKind::Not) {
            let operand = self.parse_logical_not()?;
            return Ok(Condition::Not {
                operand: Box::new(operand),
                location,
            });
        }

        self.parse_condition_primary()
    }

    fn parse_condition_primary(&mut self) -> ParseResult<Condition> {
        if self.check(&TokenKind::LParen) {
            let grouped = self.speculate(|p| {
                p.advance();
                let condition = p.parse_condition()?;
                p.expect_token(&TokenKind::RParen, "')' after condition")?;
                // `(a < b) + 1` is not a condition group
                if p.at_arithmetic_operator() || p.at_relational_operator() {
                    return Err(p.unexpected("'then', 'do', 'and' or 'or'"));
                }
                Ok(condition)
            });

            if let Some(condition) = grouped {
                return Ok(condition);
            }
        }

        self.parse_relation()
    }

    /// Parse `expr relop expr`
    fn parse_relation(&mut self) -> ParseResult<Condition> {
        let location = self.current_location();
        let left = self.parse_expression()?;

        let op = match self.relational_operator() {
            Some(op) => op,
            None => return Err(self.unexpected("relational operator")),
        };
        self.advance();

        let right = self.parse_expression()?;

        if self.at_relational_operator() {
            return Err(self.unexpected("'then', 'do', 'and' or 'or'"));
        }

        Ok(Condition::Relational {
            op,
            left,
            right,
            location,
        })
    }

    fn relational_operator(&self) -> Option<RelOp> {
        match self.peek_kind() {
            TokenKind::Lt => Some(RelOp::Lt),
            TokenKind::Le => Some(RelOp::Le),
            TokenKind::Gt => Some(RelOp::Gt),
            TokenKind::Ge => Some(RelOp::Ge),
            TokenKind::EqEq => Some(RelOp::Eq),
            TokenKind::NotEq | TokenKind::LtGt => Some(RelOp::Ne),
            _ => None,
        }
    }

    fn at_relational_operator(&self) -> bool {
        self.relational_operator().is_some()
    }

    fn at_arithmetic_operator(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash
        )
    }

    // ===== Arithmetic expressions =====

    /// Parse an arithmetic expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();

            let right = self.parse_term()?;
            left = self.make_binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                _ => break,
            };
            self.advance();

            let right = self.parse_factor()?;
            left = self.make_binary(op, left, right);
        }

        Ok(left)
    }

    fn make_binary(&mut self, op: ArithOp, left: Expr, right: Expr) -> Expr {
        let location = left.location;
        Expr {
            id: self.mint_id(),
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        }
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let location = self.current_location();

        let op = if self.match_token(&TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.match_token(&TokenKind::Plus) {
            UnaryOp::Plus
        } else {
            return self.parse_primary();
        };

        let operand = self.parse_factor()?;
        Ok(Expr {
            id: self.mint_id(),
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            location,
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let location = self.current_location();

        let kind = match self.peek_kind() {
            TokenKind::IntLiteral(n) => {
                let n = *n;
                self.advance();
                ExprKind::IntegerLiteral(n)
            }
            TokenKind::FloatLiteral(x) => {
                let x = *x;
                self.advance();
                ExprKind::FloatLiteral(x)
            }
            TokenKind::Ident(_) => {
                if let Some(TokenKind::LParen) = self.peek_ahead(1) {
                    let (name, _) = self.expect_identifier("function name")?;
                    let args = self.parse_call_arguments()?;
                    ExprKind::Call { name, args }
                } else {
                    ExprKind::Location(self.parse_location()?)
                }
            }
            TokenKind::Int | TokenKind::Float => {
                let target = if self.match_token(&TokenKind::Int) {
                    BaseType::Int
                } else {
                    self.advance();
                    BaseType::Float
                };
                let expr = self.parse_cast_operand()?;
                ExprKind::Cast {
                    target,
                    expr: Box::new(expr),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_token(&TokenKind::RParen, "')' after expression")?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(Expr {
            id: self.mint_id(),
            kind,
            location,
        })
    }

    /// Parse the operand of a cast: `(expr)` or `[expr]`
    fn parse_cast_operand(&mut self) -> ParseResult<Expr> {
        if self.match_token(&TokenKind::LParen) {
            let expr = self.parse_expression()?;
            self.expect_token(&TokenKind::RParen, "')' after cast operand")?;
            Ok(expr)
        } else if self.match_token(&TokenKind::LBracket) {
            let expr = self.parse_expression()?;
            self.expect_token(&TokenKind::RBracket, "']' after cast operand")?;
            Ok(expr)
        } else {
            Err(self.unexpected("'(' or '[' after type name"))
        }
    }

    /// Parse a storage location: `name` or `name[index]`
    pub(crate) fn parse_location(&mut self) -> ParseResult<Location> {
        let (name, location) = self.expect_identifier("variable name")?;

        let index = if self.match_token(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect_token(&TokenKind::RBracket, "']' after index")?;
            Some(Box::new(index))
        } else {
            None
        };

        Ok(Location {
            id: self.mint_id(),
            name,
            index,
            location,
        })
    }

    /// Parse call arguments including the parentheses: `(a, b + 1)`
    pub(crate) fn parse_call_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect_token(&TokenKind::LParen, "'(' before arguments")?;

        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(&TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::from_source(source).unwrap();
        let expr = parser.parse_expression().unwrap();
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        expr
    }

    fn parse_cond(source: &str) -> Condition {
        let mut parser = Parser::from_source(source).unwrap();
        let condition = parser.parse_condition().unwrap();
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        condition
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let expr = parse_expr("1 + 2 * 3");

        match expr.kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(op, ArithOp::Add);
                assert_eq!(left.kind, ExprKind::IntegerLiteral(1));
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: ArithOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let expr = parse_expr("a - b - c");

        match expr.kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(op, ArithOp::Sub);
                assert!(matches!(
                    left.kind,
                    ExprKind::Binary {
                        op: ArithOp::Sub,
                        ..
                    }
                ));
                assert!(matches!(right.kind, ExprKind::Location(_)));
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_expr("(1 + 2) * 3");

        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: ArithOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_and_casts() {
        let expr = parse_expr("-float(x) + int[a[i]]");

        match expr.kind {
            ExprKind::Binary { left, right, .. } => {
                match left.kind {
                    ExprKind::Unary { op, operand } => {
                        assert_eq!(op, UnaryOp::Neg);
                        assert!(matches!(
                            operand.kind,
                            ExprKind::Cast {
                                target: BaseType::Float,
                                ..
                            }
                        ));
                    }
                    other => panic!("Expected negation, got {:?}", other),
                }
                assert!(matches!(
                    right.kind,
                    ExprKind::Cast {
                        target: BaseType::Int,
                        ..
                    }
                ));
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_call_expression_keeps_argument_order() {
        let expr = parse_expr("f(3, x, 1.5)");

        match expr.kind {
            ExprKind::Call { name, args } => {
                assert_eq!(name, "f");
                assert_eq!(args[0].kind, ExprKind::IntegerLiteral(3));
                assert!(matches!(args[1].kind, ExprKind::Location(_)));
                assert_eq!(args[2].kind, ExprKind::FloatLiteral(1.5));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_node_ids_are_unique() {
        let expr = parse_expr("a[1] + f(b, 2) * -c");
        let mut ids = Vec::new();

        fn collect(expr: &Expr, ids: &mut Vec<NodeId>) {
            ids.push(expr.id);
            match &expr.kind {
                ExprKind::Location(loc) => {
                    ids.push(loc.id);
                    if let Some(index) = &loc.index {
                        collect(index, ids);
                    }
                }
                ExprKind::Binary { left, right, .. } => {
                    collect(left, ids);
                    collect(right, ids);
                }
                ExprKind::Unary { operand, .. } => collect(operand, ids),
                ExprKind::Call { args, .. } => args.iter().for_each(|a| collect(a, ids)),
                ExprKind::Cast { expr, .. } => collect(expr, ids),
                ExprKind::IntegerLiteral(_) | ExprKind::FloatLiteral(_) => {}
            }
        }

        collect(&expr, &mut ids);
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_logical_precedence() {
        let cond = parse_cond("a < 1 or b < 2 and not c < 3");

        match cond {
            Condition::Logical { op, right, .. } => {
                assert_eq!(op, LogicOp::Or);
                match *right {
                    Condition::Logical { op, right, .. } => {
                        assert_eq!(op, LogicOp::And);
                        assert!(matches!(*right, Condition::Not { .. }));
                    }
                    other => panic!("Expected and, got {:?}", other),
                }
            }
            other => panic!("Expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_both_not_equal_spellings() {
        for source in ["x != 1", "x <> 1"] {
            match parse_cond(source) {
                Condition::Relational { op, .. } => assert_eq!(op, RelOp::Ne),
                other => panic!("Expected relation, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parenthesized_condition() {
        let cond = parse_cond("(a < b or c < d) and e == f");

        match cond {
            Condition::Logical { op, left, .. } => {
                assert_eq!(op, LogicOp::And);
                assert!(matches!(
                    *left,
                    Condition::Logical {
                        op: LogicOp::Or,
                        ..
                    }
                ));
            }
            other => panic!("Expected and, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_arithmetic_operand() {
        let cond = parse_cond("(a + 1) * 2 < b");

        match cond {
            Condition::Relational { op, left, .. } => {
                assert_eq!(op, RelOp::Lt);
                assert!(matches!(
                    left.kind,
                    ExprKind::Binary {
                        op: ArithOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected relation, got {:?}", other),
        }
    }

    #[test]
    fn test_relations_do_not_chain() {
        let mut parser = Parser::from_source("a < b < c").unwrap();

        assert!(parser.parse_condition().is_err());
    }

    #[test]
    fn test_missing_relational_operator() {
        let mut parser = Parser::from_source("a + 1").unwrap();
        let err = parser.parse_condition().unwrap_err();

        assert!(err.to_string().contains("relational operator"));
    }
}
