//! Semantic checker
//!
//! Walks a parsed [`Program`] and reports every scoping, typing and context
//! error it finds. Checking runs in two phases:
//!
//! 1. Every function signature is registered in the global scope, so calls
//!    may refer to functions defined later in the file (including mutual
//!    recursion).
//! 2. Each function body is checked in source order inside its own scope,
//!    parameters first, then locals.
//!
//! The type of every expression and location is recorded in a [`TypeTable`]
//! keyed by node id. The IR generator reads it instead of re-deriving types.
//!
//! # Typing Rules
//!
//! - Literals have their natural type; a cast has its target type
//! - Binary and relational operands must have identical types
//! - Every function returns `int`
//! - Array indices and array sizes must be `int`
//! - A whole array may only appear as an argument for an array parameter

use crate::constants::ENTRY_POINT;
use crate::parser::ast::*;
use crate::semantic::errors::{LocationUsage, SemanticError, SymbolKind};
use crate::semantic::symtab::{ScopeKind, Symbol, SymbolTable, VarRole};
use crate::semantic::types::{TypeTable, ValueType};
use tracing::debug;

/// Everything the checker learned about a program
#[derive(Debug, Clone)]
pub struct Analysis {
    pub errors: Vec<SemanticError>,
    pub types: TypeTable,
    pub symbols: SymbolTable,
}

impl Analysis {
    /// True if no semantic errors were found
    pub fn is_accepted(&self) -> bool {
        self.errors.is_empty()
    }

    /// The type table if the program was accepted
    pub fn into_result(self) -> Result<TypeTable, Vec<SemanticError>> {
        if self.errors.is_empty() {
            Ok(self.types)
        } else {
            Err(self.errors)
        }
    }
}

/// Check a program, collecting every semantic error
pub fn check(program: &Program) -> Analysis {
    Checker::new().run(program)
}

struct Checker {
    symbols: SymbolTable,
    types: TypeTable,
    errors: Vec<SemanticError>,
}

impl Checker {
    fn new() -> Self {
        Checker {
            symbols: SymbolTable::new(),
            types: TypeTable::default(),
            errors: Vec::new(),
        }
    }

    fn run(mut self, program: &Program) -> Analysis {
        match program {
            Program::Functions(functions) => {
                for function in functions {
                    self.register_function(function);
                }

                if self.symbols.resolve_local(ENTRY_POINT).is_none() {
                    let location = functions
                        .last()
                        .map(|f| f.location)
                        .unwrap_or_else(|| SourceLocation::new(1, 1));
                    self.errors.push(SemanticError::MissingMain { location });
                }

                for function in functions {
                    self.check_function(function);
                }
            }
            Program::Statement(statement) => {
                // a bare statement is the body of an implicit `main()`
                let location = *statement.location();
                let main = Symbol::Function {
                    params: Vec::new(),
                    location,
                };
                if self.symbols.define(ENTRY_POINT, main).is_ok() {
                    self.symbols
                        .push_scope(ScopeKind::Function(ENTRY_POINT.to_string()));
                    self.check_stmt(statement);
                    self.symbols.pop_scope();
                }
            }
        }

        debug!(
            errors = self.errors.len(),
            typed_nodes = self.types.len(),
            "checked program"
        );

        Analysis {
            errors: self.errors,
            types: self.types,
            symbols: self.symbols,
        }
    }

    // ===== Declarations =====

    fn register_function(&mut self, function: &FunctionDef) {
        let params = function
            .params
            .iter()
            .map(|p| ValueType::from(&p.type_name))
            .collect();

        let symbol = Symbol::Function {
            params,
            location: function.location,
        };

        if let Err(dup) = self.symbols.define(&function.name, symbol) {
            self.errors.push(SemanticError::DuplicateSymbol {
                name: function.name.clone(),
                kind: SymbolKind::Function,
                previous: dup.previous,
                location: function.location,
            });
        }
    }

    fn check_function(&mut self, function: &FunctionDef) {
        self.symbols
            .push_scope(ScopeKind::Function(function.name.clone()));

        for param in &function.params {
            self.check_declaration(param, VarRole::Param);
        }
        for local in &function.locals {
            self.check_declaration(local, VarRole::Local);
        }
        for statement in &function.body {
            self.check_stmt(statement);
        }

        self.symbols.pop_scope();
    }

    fn check_declaration(&mut self, decl: &VarDecl, role: VarRole) {
        // the size is checked before the name is bound
        if let Some(ArraySize::Dynamic(size)) = &decl.type_name.array_size {
            if let Some(ty) = self.check_expr(size) {
                if ty != ValueType::INT {
                    self.errors.push(SemanticError::TypeMismatch {
                        context: format!("size of array '{}'", decl.name),
                        expected: ValueType::INT,
                        found: ty,
                        location: size.location,
                    });
                }
            }
        }

        let symbol = Symbol::Variable {
            ty: ValueType::from(&decl.type_name),
            role,
            location: decl.location,
        };

        if let Err(dup) = self.symbols.define(&decl.name, symbol) {
            let kind = match role {
                VarRole::Param => SymbolKind::Parameter,
                VarRole::Local => SymbolKind::Local,
            };
            self.errors.push(SemanticError::DuplicateSymbol {
                name: decl.name.clone(),
                kind,
                previous: dup.previous,
                location: decl.location,
            });
        }
    }

    // ===== Statements =====

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assignment {
                target,
                value,
                location,
            } => {
                let target_ty = self.check_location(target, false);
                let value_ty = self.check_expr(value);

                if let (Some(expected), Some(found)) = (target_ty, value_ty) {
                    if expected != found {
                        self.errors.push(SemanticError::TypeMismatch {
                            context: "assignment".to_string(),
                            expected,
                            found,
                            location: *location,
                        });
                    }
                }
            }

            Stmt::If {
                condition,
                then_branch,
                ..
            } => {
                self.check_condition(condition);
                self.check_stmt(then_branch);
            }

            Stmt::IfElse {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition);
                self.check_stmt(then_branch);
                self.check_stmt(else_branch);
            }

            Stmt::While {
                condition,
                body,
                location,
            } => {
                self.check_condition(condition);
                self.symbols.enter_loop(*location);
                self.check_stmt(body);
                self.symbols.exit_loop();
            }

            Stmt::Block { statements, .. } => {
                for statement in statements {
                    self.check_stmt(statement);
                }
            }

            Stmt::Break { location } => {
                if !self.symbols.in_loop() {
                    self.errors.push(SemanticError::InvalidBreakContext {
                        location: *location,
                    });
                }
            }

            Stmt::Skip { .. } | Stmt::Print { .. } => {}

            Stmt::Return { value, location } => {
                if let Some(found) = self.check_expr(value) {
                    if found != ValueType::INT {
                        self.errors.push(SemanticError::TypeMismatch {
                            context: "return value".to_string(),
                            expected: ValueType::INT,
                            found,
                            location: *location,
                        });
                    }
                }
            }

            Stmt::Read { target, .. } => {
                self.check_location(target, false);
            }

            Stmt::Write { value, .. } => {
                self.check_expr(value);
            }

            Stmt::Call {
                name,
                args,
                location,
            } => {
                self.check_call(name, args, *location);
            }
        }
    }

    fn check_condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Relational {
                op,
                left,
                right,
                location,
            } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);

                if let (Some(expected), Some(found)) = (left_ty, right_ty) {
                    if expected != found {
                        self.errors.push(SemanticError::TypeMismatch {
                            context: format!("operands of '{}'", op.symbol()),
                            expected,
                            found,
                            location: *location,
                        });
                    }
                }
            }
            Condition::Logical { left, right, .. } => {
                self.check_condition(left);
                self.check_condition(right);
            }
            Condition::Not { operand, .. } => self.check_condition(operand),
        }
    }

    // ===== Expressions =====

    /// Check an expression and record its type. `None` means an error was
    /// already reported somewhere inside it.
    fn check_expr(&mut self, expr: &Expr) -> Option<ValueType> {
        self.check_expr_in(expr, false)
    }

    fn check_expr_in(&mut self, expr: &Expr, allow_array: bool) -> Option<ValueType> {
        let ty = match &expr.kind {
            ExprKind::IntegerLiteral(_) => Some(ValueType::INT),
            ExprKind::FloatLiteral(_) => Some(ValueType::FLOAT),

            ExprKind::Location(location) => self.check_location(location, allow_array),

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);

                match (left_ty, right_ty) {
                    (Some(expected), Some(found)) if expected != found => {
                        self.errors.push(SemanticError::TypeMismatch {
                            context: format!("operands of '{}'", op.symbol()),
                            expected,
                            found,
                            location: expr.location,
                        });
                        None
                    }
                    (Some(ty), Some(_)) => Some(ty),
                    _ => None,
                }
            }

            ExprKind::Unary { operand, .. } => self.check_expr(operand),

            ExprKind::Call { name, args } => self.check_call(name, args, expr.location),

            ExprKind::Cast { target, expr: inner } => {
                self.check_expr(inner);
                Some(ValueType::scalar(*target))
            }
        };

        if let Some(ty) = ty {
            self.types.insert(expr.id, ty);
        }
        ty
    }

    /// Check a storage location. Without `allow_array`, an array must be
    /// indexed; with it, a bare array name is a value of array type.
    fn check_location(&mut self, location: &Location, allow_array: bool) -> Option<ValueType> {
        let resolved = self.symbols.resolve(&location.name).cloned();

        let ty = match resolved {
            None => {
                self.errors.push(SemanticError::UndefinedSymbol {
                    name: location.name.clone(),
                    kind: SymbolKind::Local,
                    location: location.location,
                });
                None
            }

            Some(Symbol::Function { .. }) => {
                self.invalid_location(location, LocationUsage::FunctionAsValue);
                None
            }

            Some(Symbol::Variable { ty, .. }) => match (ty.is_array, &location.index) {
                (false, None) => Some(ty),
                (false, Some(_)) => {
                    self.invalid_location(location, LocationUsage::IndexedScalar);
                    None
                }
                (true, None) if allow_array => Some(ty),
                (true, None) => {
                    self.invalid_location(location, LocationUsage::UnindexedArray);
                    None
                }
                (true, Some(index)) => {
                    if let Some(found) = self.check_expr(index) {
                        if found != ValueType::INT {
                            self.errors.push(SemanticError::TypeMismatch {
                                context: format!("index of '{}'", location.name),
                                expected: ValueType::INT,
                                found,
                                location: index.location,
                            });
                        }
                    }
                    Some(ty.element())
                }
            },
        };

        // errors inside an index are still worth reporting
        if ty.is_none() {
            if let Some(index) = &location.index {
                self.check_expr(index);
            }
        }

        if let Some(ty) = ty {
            self.types.insert(location.id, ty);
        }
        ty
    }

    fn invalid_location(&mut self, location: &Location, usage: LocationUsage) {
        self.errors.push(SemanticError::InvalidLocationKind {
            name: location.name.clone(),
            usage,
            location: location.location,
        });
    }

    /// Check a call's callee and arguments. Every function returns `int`.
    fn check_call(
        &mut self,
        name: &str,
        args: &[Expr],
        location: SourceLocation,
    ) -> Option<ValueType> {
        let callee = self.symbols.resolve(name).cloned();
        let params = match callee {
            Some(Symbol::Function { params, .. }) => params,
            _ => {
                self.errors.push(SemanticError::UndefinedSymbol {
                    name: name.to_string(),
                    kind: SymbolKind::Function,
                    location,
                });
                for arg in args {
                    self.check_expr_in(arg, true);
                }
                return None;
            }
        };

        if params.len() != args.len() {
            self.errors.push(SemanticError::ArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                got: args.len(),
                location,
            });
            for arg in args {
                self.check_expr_in(arg, true);
            }
            return Some(ValueType::INT);
        }

        for (position, (arg, expected)) in args.iter().zip(params).enumerate() {
            let Some(found) = self.check_expr_in(arg, expected.is_array) else {
                continue;
            };

            if found != expected {
                self.errors.push(SemanticError::TypeMismatch {
                    context: format!("argument {} of '{}'", position + 1, name),
                    expected,
                    found,
                    location: arg.location,
                });
            }
        }

        Some(ValueType::INT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;
    use crate::semantic::errors::SemanticErrorKind;

    fn analyze(source: &str) -> Analysis {
        let program = Parser::from_source(source)
            .expect("lexing failed")
            .parse_program()
            .into_result()
            .expect("parsing failed");
        check(&program)
    }

    fn error_kinds(source: &str) -> Vec<SemanticErrorKind> {
        analyze(source).errors.iter().map(|e| e.kind()).collect()
    }

    #[test]
    fn test_accepts_valid_program() {
        let analysis = analyze(
            "fun f(a: int, v: float[10]) x: float begin x := v[a]; return a end\n\
             fun main() arr: float[10] begin write(f(1, arr)) end",
        );

        assert!(analysis.is_accepted(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_forward_and_mutual_recursion() {
        let analysis = analyze(
            "fun even(n: int) begin if n == 0 then return 1 else return odd(n - 1) end\n\
             fun odd(n: int) begin if n == 0 then return 0 else return even(n - 1) end\n\
             fun main() begin write(even(4)) end",
        );

        assert!(analysis.is_accepted(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            error_kinds("fun main() begin x := 1 end"),
            vec![SemanticErrorKind::UndefinedSymbol]
        );
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(
            error_kinds("fun f() begin skip end"),
            vec![SemanticErrorKind::MissingMain]
        );
    }

    #[test]
    fn test_missing_main_points_at_last_function() {
        let analysis = analyze(
            "fun f() begin skip end\n\
             fun g() begin skip end",
        );

        assert_eq!(analysis.errors.len(), 1);
        assert_eq!(
            analysis.errors[0].to_string(),
            "line 2: program has no 'main' function"
        );
    }

    #[test]
    fn test_duplicate_function_keeps_checking_both_bodies() {
        let analysis = analyze(
            "fun main() begin skip end\n\
             fun main() begin y := 1 end",
        );
        let kinds: Vec<_> = analysis.errors.iter().map(|e| e.kind()).collect();

        assert_eq!(
            kinds,
            vec![
                SemanticErrorKind::DuplicateSymbol,
                SemanticErrorKind::UndefinedSymbol
            ]
        );
        match &analysis.errors[0] {
            SemanticError::DuplicateSymbol {
                previous, location, ..
            } => {
                assert_eq!(previous.line, 1);
                assert_eq!(location.line, 2);
            }
            other => panic!("Expected duplicate symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_parameter_and_local() {
        let analysis = analyze("fun main() x: int; x: float begin skip end");

        match analysis.errors.as_slice() {
            [SemanticError::DuplicateSymbol { name, kind, .. }] => {
                assert_eq!(name, "x");
                assert_eq!(*kind, SymbolKind::Local);
            }
            other => panic!("Expected one duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_mismatch_is_reported_once() {
        let analysis = analyze(
            "fun f(a: int) begin return a end\n\
             fun main() begin write(f(1, 2)) end",
        );

        match analysis.errors.as_slice() {
            [SemanticError::ArityMismatch {
                name,
                expected,
                got,
                location,
            }] => {
                assert_eq!(name, "f");
                assert_eq!(*expected, 1);
                assert_eq!(*got, 2);
                assert_eq!(location.line, 2);
            }
            other => panic!("Expected one arity mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_arguments_checked_despite_arity_mismatch() {
        assert_eq!(
            error_kinds(
                "fun f(a: int) begin return a end\n\
                 fun main() begin f(y, 2) end"
            ),
            vec![
                SemanticErrorKind::ArityMismatch,
                SemanticErrorKind::UndefinedSymbol
            ]
        );
    }

    #[test]
    fn test_calling_a_variable() {
        let analysis = analyze("fun main() x: int begin x(1) end");

        match analysis.errors.as_slice() {
            [SemanticError::UndefinedSymbol { kind, .. }] => {
                assert_eq!(*kind, SymbolKind::Function)
            }
            other => panic!("Expected undefined function, got {:?}", other),
        }
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            error_kinds("fun main() begin break end"),
            vec![SemanticErrorKind::InvalidBreakContext]
        );
    }

    #[test]
    fn test_break_inside_nested_loops() {
        let analysis = analyze(
            "fun main() i: int begin\n\
               while i < 10 do begin\n\
                 while i < 5 do break;\n\
                 break\n\
               end\n\
             end",
        );

        assert!(analysis.is_accepted(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_break_after_loop_ends() {
        assert_eq!(
            error_kinds("fun main() i: int begin while i < 1 do skip; break end"),
            vec![SemanticErrorKind::InvalidBreakContext]
        );
    }

    #[test]
    fn test_mixed_operand_types() {
        let analysis = analyze("fun main() x: int; y: float begin x := x + y end");

        // the assignment is not reported again once the operands failed
        assert_eq!(analysis.errors.len(), 1);
        assert_eq!(analysis.errors[0].kind(), SemanticErrorKind::TypeMismatch);
    }

    #[test]
    fn test_cast_fixes_operand_types() {
        let analysis = analyze("fun main() x: int; y: float begin x := x + int(y) end");

        assert!(analysis.is_accepted(), "{:?}", analysis.errors);
    }

    #[test]
    fn test_relational_operands_must_match() {
        assert_eq!(
            error_kinds("fun main() x: int begin if x < 1.0 then skip end"),
            vec![SemanticErrorKind::TypeMismatch]
        );
    }

    #[test]
    fn test_return_must_be_int() {
        assert_eq!(
            error_kinds("fun main() begin return 1.5 end"),
            vec![SemanticErrorKind::TypeMismatch]
        );
    }

    #[test]
    fn test_location_kinds() {
        let analysis = analyze(
            "fun f() begin return 0 end\n\
             fun main() x: int; a: int[4] begin\n\
               x := x[1];\n\
               x := a;\n\
               x := f;\n\
               write(a[1.0])\n\
             end",
        );
        let errors: Vec<_> = analysis
            .errors
            .iter()
            .map(|e| match e {
                SemanticError::InvalidLocationKind { usage, .. } => format!("{:?}", usage),
                other => format!("{:?}", other.kind()),
            })
            .collect();

        assert_eq!(
            errors,
            vec![
                "IndexedScalar",
                "UnindexedArray",
                "FunctionAsValue",
                "TypeMismatch"
            ]
        );
    }

    #[test]
    fn test_array_arguments() {
        let kinds = error_kinds(
            "fun sum(v: int[3]) begin return v[0] end\n\
             fun one(n: int) begin return n end\n\
             fun main() a: int[3]; x: int begin\n\
               x := sum(a);\n\
               x := one(a);\n\
               x := sum(x)\n\
             end",
        );

        assert_eq!(
            kinds,
            vec![
                SemanticErrorKind::InvalidLocationKind,
                SemanticErrorKind::TypeMismatch
            ]
        );
    }

    #[test]
    fn test_dynamic_array_size_must_be_int() {
        let analysis = analyze("fun f(n: int) a: int[n * 2]; b: float[1.5] begin skip end\n\
                                fun main() begin skip end");

        match analysis.errors.as_slice() {
            [SemanticError::TypeMismatch { context, .. }] => {
                assert_eq!(context, "size of array 'b'")
            }
            other => panic!("Expected one size error, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_statement_is_implicit_main() {
        let analysis = analyze("write(1 + 2)");

        assert!(analysis.is_accepted(), "{:?}", analysis.errors);
        assert!(analysis.symbols.scope(0).unwrap().get("main").is_some());
    }

    #[test]
    fn test_types_are_recorded_per_node() {
        let program = Parser::from_source("fun main() x: float begin x := 1.5 * x end")
            .unwrap()
            .parse_program()
            .into_result()
            .unwrap();
        let analysis = check(&program);

        match &program.functions()[0].body[0] {
            Stmt::Assignment { target, value, .. } => {
                assert_eq!(analysis.types.get(&target.id), Some(&ValueType::FLOAT));
                assert_eq!(analysis.types.get(&value.id), Some(&ValueType::FLOAT));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_are_deterministic() {
        let source = "fun main() x: int begin y := 1; x := 1.0; break end";

        assert_eq!(analyze(source).errors, analyze(source).errors);
    }
}
