//! # Introduction
//!
//! pl0c is the front end of a compiler for PL0, a small teaching language
//! with `int` and `float` scalars, one-dimensional arrays, functions, and
//! structured control flow. It turns source text into a linear three-address
//! intermediate representation with virtual registers and labels.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Checker → Lowering → IR
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST, recovering from
//!    syntax errors so that one run reports all of them.
//! 2. [`semantic`]: resolves names through nested scopes, checks types,
//!    arity and `break` placement, and records the type of every expression.
//! 3. [`ir`]: lowers the checked AST to IR.
//! 4. [`cli`]: argument parsing for the `pl0c` binary.
//!
//! Each pass runs only if the previous one reported nothing. [`compile`]
//! drives the whole pipeline.

pub mod cli;
pub mod constants;
pub mod error;
pub mod ir;
pub mod parser;
pub mod semantic;

pub use error::CompileError;

use ir::IrProgram;
use parser::Parser;

/// Compile PL0 source text to IR
pub fn compile(source: &str) -> Result<IrProgram, CompileError> {
    let program = Parser::from_source(source)?
        .parse_program()
        .into_result()
        .map_err(CompileError::Syntax)?;

    let types = semantic::check(&program)
        .into_result()
        .map_err(CompileError::Semantic)?;

    Ok(ir::lower(&program, &types)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple_program() {
        let ir = compile("fun main() begin write(1 + 2) end").unwrap();

        assert_eq!(ir.lines()[1], "ADDI 1, 2 -> R0");
    }

    #[test]
    fn test_syntax_errors_stop_the_pipeline() {
        let err = compile("fun main() begin x := end").unwrap_err();

        assert!(matches!(err, CompileError::Syntax(_)));
    }

    #[test]
    fn test_semantic_errors_stop_the_pipeline() {
        let err = compile("fun main() begin x := 1 end").unwrap_err();

        assert!(matches!(err, CompileError::Semantic(_)));
    }

    #[test]
    fn test_lex_errors_stop_the_pipeline() {
        let err = compile("fun main() begin x := 1 # end").unwrap_err();

        assert!(matches!(err, CompileError::Lex(_)));
    }
}
