// AST (Abstract Syntax Tree) definitions for PL0 programs

use std::fmt;

/// Unique identifier for expression and location nodes.
///
/// Ids are minted sequentially by the parser, so the same source always
/// produces the same ids. Later passes key their annotations by id instead of
/// mutating the tree.
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Scalar base types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Float,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Int => write!(f, "int"),
            BaseType::Float => write!(f, "float"),
        }
    }
}

/// Declared size of an array type
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySize {
    /// `int[10]`
    Fixed(u64),
    /// `int[n + 1]`, evaluated when the function is entered
    Dynamic(Box<Expr>),
}

/// A declared type: a base type, optionally an array of it
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub base: BaseType,
    pub array_size: Option<ArraySize>,
}

impl TypeName {
    pub fn scalar(base: BaseType) -> Self {
        TypeName {
            base,
            array_size: None,
        }
    }

    pub fn array(base: BaseType, size: ArraySize) -> Self {
        TypeName {
            base,
            array_size: Some(size),
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }
}

/// Parameter or local variable declaration: `name: type`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub type_name: TypeName,
    pub location: SourceLocation,
}

/// Parameters share the declaration shape of locals
pub type Param = VarDecl;

/// Function definition: `fun name(params) locals begin body end`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub locals: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Unary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,  // -x
    Plus, // +x
}

/// Relational operators (`!=` and `<>` both map to `Ne`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
        }
    }
}

/// Logical connectives between conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Storage reference: `x` or `a[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: NodeId,
    pub name: String,
    pub index: Option<Box<Expr>>,
    pub location: SourceLocation,
}

/// Arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    Location(Location),
    Binary {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Cast {
        target: BaseType,
        expr: Box<Expr>,
    },
}

/// Boolean guard of `if` and `while`
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Relational {
        op: RelOp,
        left: Expr,
        right: Expr,
        location: SourceLocation,
    },
    Logical {
        op: LogicOp,
        left: Box<Condition>,
        right: Box<Condition>,
        location: SourceLocation,
    },
    Not {
        operand: Box<Condition>,
        location: SourceLocation,
    },
}

impl Condition {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Condition::Relational { location, .. } => location,
            Condition::Logical { location, .. } => location,
            Condition::Not { location, .. } => location,
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        target: Location,
        value: Expr,
        location: SourceLocation,
    },
    If {
        condition: Condition,
        then_branch: Box<Stmt>,
        location: SourceLocation,
    },
    IfElse {
        condition: Condition,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
        location: SourceLocation,
    },
    While {
        condition: Condition,
        body: Box<Stmt>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<Stmt>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Skip {
        location: SourceLocation,
    },
    Return {
        value: Expr,
        location: SourceLocation,
    },
    Read {
        target: Location,
        location: SourceLocation,
    },
    Write {
        value: Expr,
        location: SourceLocation,
    },
    Print {
        text: String,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this statement
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::Assignment { location, .. } => location,
            Stmt::If { location, .. } => location,
            Stmt::IfElse { location, .. } => location,
            Stmt::While { location, .. } => location,
            Stmt::Block { location, .. } => location,
            Stmt::Break { location } => location,
            Stmt::Skip { location } => location,
            Stmt::Return { location, .. } => location,
            Stmt::Read { location, .. } => location,
            Stmt::Write { location, .. } => location,
            Stmt::Print { location, .. } => location,
            Stmt::Call { location, .. } => location,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    /// One or more function definitions, in source order
    Functions(Vec<FunctionDef>),
    /// A single bare statement, treated as the body of an implicit `main`
    Statement(Stmt),
}

impl Program {
    /// Function definitions of the program (empty for the bare-statement form)
    pub fn functions(&self) -> &[FunctionDef] {
        match self {
            Program::Functions(functions) => functions,
            Program::Statement(_) => &[],
        }
    }
}
