//! Intermediate representation
//!
//! - [`instr`]: Instruction set, operands and the textual IR format
//! - [`lower`]: Lowering of a checked AST into a flat instruction list

pub mod instr;
pub mod lower;

pub use instr::{Instr, IrProgram, Label, Operand, Place, Register};
pub use lower::{lower, InternalError};
