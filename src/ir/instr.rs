//! Three-address IR instructions and their textual form
//!
//! Every instruction prints as `OPCODE op1, op2, ... -> result`. Typed opcodes
//! carry an `I` or `F` suffix (`ADDI`, `MOVF`, ...).

use crate::constants::REGISTER_PREFIX;
use crate::parser::ast::{ArithOp, BaseType, LogicOp, RelOp};
use std::fmt;

/// Virtual register holding an intermediate result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(pub usize);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", REGISTER_PREFIX, self.0)
    }
}

/// Instruction operand: a constant, a named variable or a register
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Var(String),
    Reg(Register),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{}", n),
            // Debug keeps the decimal point on whole floats (`2.0`)
            Operand::Float(x) => write!(f, "{:?}", x),
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Reg(reg) => write!(f, "{}", reg),
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Reg(reg)
    }
}

/// Destination of a store: a variable or an array element
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Var(String),
    Element { array: String, index: Operand },
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(name) => write!(f, "{}", name),
            Place::Element { array, index } => write!(f, "{}[{}]", array, index),
        }
    }
}

/// Jump target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    FuncBegin {
        name: String,
        params: Vec<String>,
    },
    FuncEnd {
        name: String,
    },
    Alloc {
        ty: BaseType,
        array: String,
        size: Operand,
    },
    Binary {
        op: ArithOp,
        ty: BaseType,
        left: Operand,
        right: Operand,
        dest: Register,
    },
    Neg {
        ty: BaseType,
        src: Operand,
        dest: Register,
    },
    /// Numeric conversion to `to` from the other base type
    Convert {
        to: BaseType,
        src: Operand,
        dest: Register,
    },
    Load {
        ty: BaseType,
        array: String,
        index: Operand,
        dest: Register,
    },
    Compare {
        op: RelOp,
        ty: BaseType,
        left: Operand,
        right: Operand,
        dest: Register,
    },
    Logical {
        op: LogicOp,
        left: Register,
        right: Register,
        dest: Register,
    },
    Not {
        src: Register,
        dest: Register,
    },
    Move {
        ty: BaseType,
        src: Operand,
        dest: Place,
    },
    Label(Label),
    Jump(Label),
    CondJump {
        cond: Register,
        target: Label,
    },
    Call {
        name: String,
        args: Vec<Operand>,
        dest: Option<Register>,
    },
    Return(Operand),
    Read(Place),
    Write(Operand),
    Print(String),
}

fn suffix(ty: BaseType) -> char {
    match ty {
        BaseType::Int => 'I',
        BaseType::Float => 'F',
    }
}

fn arith_opcode(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "ADD",
        ArithOp::Sub => "SUB",
        ArithOp::Mul => "MUL",
        ArithOp::Div => "DIV",
    }
}

fn compare_opcode(op: RelOp) -> &'static str {
    match op {
        RelOp::Lt => "LT",
        RelOp::Le => "LE",
        RelOp::Gt => "GT",
        RelOp::Ge => "GE",
        RelOp::Eq => "EQ",
        RelOp::Ne => "NE",
    }
}

impl Instr {
    /// Labels and function delimiters print flush left
    pub fn is_flush_left(&self) -> bool {
        matches!(
            self,
            Instr::Label(_) | Instr::FuncBegin { .. } | Instr::FuncEnd { .. }
        )
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::FuncBegin { name, params } => write!(f, "FUNC {}({})", name, params.join(", ")),
            Instr::FuncEnd { name } => write!(f, "ENDFUNC {}", name),
            Instr::Alloc { ty, array, size } => {
                write!(f, "ALLOC{} {}, {}", suffix(*ty), array, size)
            }
            Instr::Binary {
                op,
                ty,
                left,
                right,
                dest,
            } => write!(
                f,
                "{}{} {}, {} -> {}",
                arith_opcode(*op),
                suffix(*ty),
                left,
                right,
                dest
            ),
            Instr::Neg { ty, src, dest } => write!(f, "NEG{} {} -> {}", suffix(*ty), src, dest),
            Instr::Convert { to, src, dest } => {
                let opcode = match to {
                    BaseType::Float => "ITOF",
                    BaseType::Int => "FTOI",
                };
                write!(f, "{} {} -> {}", opcode, src, dest)
            }
            Instr::Load {
                ty,
                array,
                index,
                dest,
            } => write!(f, "LOAD{} {}, {} -> {}", suffix(*ty), array, index, dest),
            Instr::Compare {
                op,
                ty,
                left,
                right,
                dest,
            } => write!(
                f,
                "{}{} {}, {} -> {}",
                compare_opcode(*op),
                suffix(*ty),
                left,
                right,
                dest
            ),
            Instr::Logical {
                op,
                left,
                right,
                dest,
            } => {
                let opcode = match op {
                    LogicOp::And => "AND",
                    LogicOp::Or => "OR",
                };
                write!(f, "{} {}, {} -> {}", opcode, left, right, dest)
            }
            Instr::Not { src, dest } => write!(f, "NOT {} -> {}", src, dest),
            Instr::Move { ty, src, dest } => write!(f, "MOV{} {} -> {}", suffix(*ty), src, dest),
            Instr::Label(label) => write!(f, "{}:", label),
            Instr::Jump(label) => write!(f, "GOTO {}", label),
            Instr::CondJump { cond, target } => write!(f, "IF {} GOTO {}", cond, target),
            Instr::Call { name, args, dest } => {
                write!(f, "CALL {}", name)?;
                for arg in args {
                    write!(f, ", {}", arg)?;
                }
                if let Some(dest) = dest {
                    write!(f, " -> {}", dest)?;
                }
                Ok(())
            }
            Instr::Return(value) => write!(f, "RETURN {}", value),
            Instr::Read(place) => write!(f, "READ {}", place),
            Instr::Write(value) => write!(f, "WRITE {}", value),
            Instr::Print(text) => write!(f, "PRINT {:?}", text),
        }
    }
}

/// A lowered program: every function's instructions, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrProgram {
    pub instructions: Vec<Instr>,
}

impl IrProgram {
    /// Instruction text without indentation, one entry per instruction
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(|i| i.to_string()).collect()
    }
}

impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            if instr.is_flush_left() {
                writeln!(f, "{}", instr)?;
            } else {
                writeln!(f, "    {}", instr)?;
            }
        }
        Ok(())
    }
}
