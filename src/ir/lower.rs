//! AST to IR lowering
//!
//! Lowers a checked program to a flat instruction list. Expressions are
//! evaluated left to right; every intermediate result gets a fresh virtual
//! register from a counter that is never reset, so register names are unique
//! across the whole program. Control flow uses labels derived from a second
//! counter: each `if` or `while` takes the next id and builds its labels from
//! it (`IF3_THEN`, `WHILE4_EXIT`, ...).
//!
//! # Control Flow Shapes
//!
//! ```text
//! while c do s          if c then s1 else s2
//!
//! WHILEn_START:             <c> -> Rc
//!     <c> -> Rc             IF Rc GOTO IFn_THEN
//!     IF Rc GOTO BODY       GOTO IFn_ELSE
//!     GOTO WHILEn_EXIT      IFn_THEN:
//! WHILEn_BODY:              <s1>
//!     <s>                   GOTO IFn_END
//!     GOTO WHILEn_START     IFn_ELSE:
//! WHILEn_EXIT:              <s2>
//!                           IFn_END:
//! ```
//!
//! Lowering trusts the checker. The only failures are internal ones, a
//! `break` with no loop around it or an expression the checker never typed.

use crate::constants::{ENTRY_POINT, IF_LABEL_STEM, WHILE_LABEL_STEM};
use crate::ir::instr::{Instr, IrProgram, Label, Operand, Place, Register};
use crate::parser::ast::*;
use crate::semantic::types::{TypeTable, ValueType};
use thiserror::Error;
use tracing::debug;

/// Fatal errors of the IR generator. Reaching one is a compiler bug.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InternalError {
    #[error("internal error: line {}: 'break' reached lowering outside of a loop", .location.line)]
    BreakOutsideLoop { location: SourceLocation },

    #[error("internal error: line {}: no type recorded for node {id}", .location.line)]
    MissingType { id: NodeId, location: SourceLocation },
}

/// Lower a checked program to IR
pub fn lower(program: &Program, types: &TypeTable) -> Result<IrProgram, InternalError> {
    let mut lowerer = Lowerer::new(types);

    match program {
        Program::Functions(functions) => {
            for function in functions {
                lowerer.lower_function(function)?;
            }
        }
        Program::Statement(statement) => {
            lowerer.emit(Instr::FuncBegin {
                name: ENTRY_POINT.to_string(),
                params: Vec::new(),
            });
            lowerer.lower_stmt(statement)?;
            lowerer.emit(Instr::FuncEnd {
                name: ENTRY_POINT.to_string(),
            });
        }
    }

    debug!(
        instructions = lowerer.instrs.len(),
        registers = lowerer.next_register,
        "lowered program"
    );

    Ok(IrProgram {
        instructions: lowerer.instrs,
    })
}

struct Lowerer<'a> {
    types: &'a TypeTable,
    instrs: Vec<Instr>,
    next_register: usize,
    next_label: usize,
    /// Exit labels of the enclosing loops, innermost last
    loop_exits: Vec<Label>,
}

impl<'a> Lowerer<'a> {
    fn new(types: &'a TypeTable) -> Self {
        Lowerer {
            types,
            instrs: Vec::new(),
            next_register: 0,
            next_label: 0,
            loop_exits: Vec::new(),
        }
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    fn fresh_register(&mut self) -> Register {
        let reg = Register(self.next_register);
        self.next_register += 1;
        reg
    }

    fn fresh_label_id(&mut self) -> usize {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn label(stem: &str, id: usize, part: &str) -> Label {
        Label(format!("{}{}_{}", stem, id, part))
    }

    fn type_of(&self, id: NodeId, location: SourceLocation) -> Result<ValueType, InternalError> {
        self.types
            .get(&id)
            .copied()
            .ok_or(InternalError::MissingType { id, location })
    }

    // ===== Functions =====

    fn lower_function(&mut self, function: &FunctionDef) -> Result<(), InternalError> {
        self.emit(Instr::FuncBegin {
            name: function.name.clone(),
            params: function.params.iter().map(|p| p.name.clone()).collect(),
        });

        for local in &function.locals {
            let size = match &local.type_name.array_size {
                None => continue,
                Some(ArraySize::Fixed(n)) => Operand::Int(*n as i64),
                Some(ArraySize::Dynamic(expr)) => self.lower_expr(expr)?,
            };
            self.emit(Instr::Alloc {
                ty: local.type_name.base,
                array: local.name.clone(),
                size,
            });
        }

        for statement in &function.body {
            self.lower_stmt(statement)?;
        }

        self.emit(Instr::FuncEnd {
            name: function.name.clone(),
        });
        Ok(())
    }

    // ===== Statements =====

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), InternalError> {
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                let (dest, ty) = self.lower_place(target)?;
                let src = self.lower_expr(value)?;
                self.emit(Instr::Move { ty, src, dest });
            }

            Stmt::If {
                condition,
                then_branch,
                ..
            } => {
                let id = self.fresh_label_id();
                let then_label = Self::label(IF_LABEL_STEM, id, "THEN");
                let end_label = Self::label(IF_LABEL_STEM, id, "END");

                let cond = self.lower_condition(condition)?;
                self.emit(Instr::CondJump {
                    cond,
                    target: then_label.clone(),
                });
                self.emit(Instr::Jump(end_label.clone()));
                self.emit(Instr::Label(then_label));
                self.lower_stmt(then_branch)?;
                self.emit(Instr::Label(end_label));
            }

            Stmt::IfElse {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let id = self.fresh_label_id();
                let then_label = Self::label(IF_LABEL_STEM, id, "THEN");
                let else_label = Self::label(IF_LABEL_STEM, id, "ELSE");
                let end_label = Self::label(IF_LABEL_STEM, id, "END");

                let cond = self.lower_condition(condition)?;
                self.emit(Instr::CondJump {
                    cond,
                    target: then_label.clone(),
                });
                self.emit(Instr::Jump(else_label.clone()));
                self.emit(Instr::Label(then_label));
                self.lower_stmt(then_branch)?;
                self.emit(Instr::Jump(end_label.clone()));
                self.emit(Instr::Label(else_label));
                self.lower_stmt(else_branch)?;
                self.emit(Instr::Label(end_label));
            }

            Stmt::While {
                condition, body, ..
            } => {
                let id = self.fresh_label_id();
                let start_label = Self::label(WHILE_LABEL_STEM, id, "START");
                let body_label = Self::label(WHILE_LABEL_STEM, id, "BODY");
                let exit_label = Self::label(WHILE_LABEL_STEM, id, "EXIT");

                self.emit(Instr::Label(start_label.clone()));
                let cond = self.lower_condition(condition)?;
                self.emit(Instr::CondJump {
                    cond,
                    target: body_label.clone(),
                });
                self.emit(Instr::Jump(exit_label.clone()));
                self.emit(Instr::Label(body_label));

                self.loop_exits.push(exit_label.clone());
                let lowered = self.lower_stmt(body);
                self.loop_exits.pop();
                lowered?;

                self.emit(Instr::Jump(start_label));
                self.emit(Instr::Label(exit_label));
            }

            Stmt::Block { statements, .. } => {
                for statement in statements {
                    self.lower_stmt(statement)?;
                }
            }

            Stmt::Break { location } => {
                let exit = self
                    .loop_exits
                    .last()
                    .cloned()
                    .ok_or(InternalError::BreakOutsideLoop {
                        location: *location,
                    })?;
                self.emit(Instr::Jump(exit));
            }

            Stmt::Skip { .. } => {}

            Stmt::Return { value, .. } => {
                let value = self.lower_expr(value)?;
                self.emit(Instr::Return(value));
            }

            Stmt::Read { target, .. } => {
                let (place, _) = self.lower_place(target)?;
                self.emit(Instr::Read(place));
            }

            Stmt::Write { value, .. } => {
                let value = self.lower_expr(value)?;
                self.emit(Instr::Write(value));
            }

            Stmt::Print { text, .. } => self.emit(Instr::Print(text.clone())),

            Stmt::Call { name, args, .. } => {
                let args = self.lower_args(args)?;
                self.emit(Instr::Call {
                    name: name.clone(),
                    args,
                    dest: None,
                });
            }
        }

        Ok(())
    }

    /// Lower a condition to a register holding its truth value. Both sides of
    /// `and` and `or` are always evaluated.
    fn lower_condition(&mut self, condition: &Condition) -> Result<Register, InternalError> {
        match condition {
            Condition::Relational {
                op, left, right, ..
            } => {
                let ty = self.type_of(left.id, left.location)?;
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                let dest = self.fresh_register();
                self.emit(Instr::Compare {
                    op: *op,
                    ty: ty.base,
                    left,
                    right,
                    dest,
                });
                Ok(dest)
            }
            Condition::Logical {
                op, left, right, ..
            } => {
                let left = self.lower_condition(left)?;
                let right = self.lower_condition(right)?;
                let dest = self.fresh_register();
                self.emit(Instr::Logical {
                    op: *op,
                    left,
                    right,
                    dest,
                });
                Ok(dest)
            }
            Condition::Not { operand, .. } => {
                let src = self.lower_condition(operand)?;
                let dest = self.fresh_register();
                self.emit(Instr::Not { src, dest });
                Ok(dest)
            }
        }
    }

    // ===== Expressions =====

    fn lower_expr(&mut self, expr: &Expr) -> Result<Operand, InternalError> {
        match &expr.kind {
            ExprKind::IntegerLiteral(n) => Ok(Operand::Int(*n)),
            ExprKind::FloatLiteral(x) => Ok(Operand::Float(*x)),

            ExprKind::Location(location) => match &location.index {
                // a bare name, or a whole array passed as an argument
                None => Ok(Operand::Var(location.name.clone())),
                Some(index) => {
                    let ty = self.type_of(expr.id, expr.location)?;
                    let index = self.lower_expr(index)?;
                    let dest = self.fresh_register();
                    self.emit(Instr::Load {
                        ty: ty.base,
                        array: location.name.clone(),
                        index,
                        dest,
                    });
                    Ok(dest.into())
                }
            },

            ExprKind::Binary { op, left, right } => {
                let ty = self.type_of(expr.id, expr.location)?;
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                let dest = self.fresh_register();
                self.emit(Instr::Binary {
                    op: *op,
                    ty: ty.base,
                    left,
                    right,
                    dest,
                });
                Ok(dest.into())
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.type_of(expr.id, expr.location)?;
                let src = self.lower_expr(operand)?;
                match op {
                    UnaryOp::Plus => Ok(src),
                    UnaryOp::Neg => {
                        let dest = self.fresh_register();
                        self.emit(Instr::Neg {
                            ty: ty.base,
                            src,
                            dest,
                        });
                        Ok(dest.into())
                    }
                }
            }

            ExprKind::Call { name, args } => {
                let args = self.lower_args(args)?;
                let dest = self.fresh_register();
                self.emit(Instr::Call {
                    name: name.clone(),
                    args,
                    dest: Some(dest),
                });
                Ok(dest.into())
            }

            ExprKind::Cast { target, expr: inner } => {
                let from = self.type_of(inner.id, inner.location)?;
                let src = self.lower_expr(inner)?;
                if from.base == *target {
                    return Ok(src);
                }
                let dest = self.fresh_register();
                self.emit(Instr::Convert {
                    to: *target,
                    src,
                    dest,
                });
                Ok(dest.into())
            }
        }
    }

    fn lower_args(&mut self, args: &[Expr]) -> Result<Vec<Operand>, InternalError> {
        args.iter().map(|arg| self.lower_expr(arg)).collect()
    }

    /// Lower an assignment or `read` target, evaluating its index first
    fn lower_place(&mut self, location: &Location) -> Result<(Place, BaseType), InternalError> {
        let ty = self.type_of(location.id, location.location)?;

        let place = match &location.index {
            None => Place::Var(location.name.clone()),
            Some(index) => Place::Element {
                array: location.name.clone(),
                index: self.lower_expr(index)?,
            },
        };

        Ok((place, ty.base))
    }
}
