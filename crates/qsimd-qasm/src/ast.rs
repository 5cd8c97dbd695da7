//! Abstract Syntax Tree for the supported `OpenQASM` subset.

/// A parsed program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Declared version (e.g. "3.0"), if the header is present.
    pub version: Option<String>,
    pub statements: Vec<Located<Statement>>,
}

/// A node tagged with the line it starts on.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub line: usize,
    pub node: T,
}

/// A statement in a program.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `include "stdgates.inc";`
    Include(String),

    /// `qubit[n] name;`, `qubit name;` or `qreg name[n];`
    QubitDecl { name: String, size: Option<u64> },

    /// `bit[n] name;`, `bit name;` or `creg name[n];`
    BitDecl { name: String, size: Option<u64> },

    /// Gate application.
    Gate(GateCall),

    /// `measure q -> c;` or `c = measure q;`
    Measure {
        qubits: Vec<OperandRef>,
        bits: Vec<OperandRef>,
    },

    /// `reset q;`
    Reset { qubits: Vec<OperandRef> },

    /// `barrier q;` or `barrier;`
    Barrier { qubits: Vec<OperandRef> },
}

/// A gate call.
#[derive(Debug, Clone)]
pub struct GateCall {
    pub name: String,
    pub params: Vec<Expression>,
    pub qubits: Vec<OperandRef>,
}

/// Reference to a register, one of its elements or an inclusive slice.
/// Used for both qubit and bit operands.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandRef {
    /// `q`
    Register(String),
    /// `q[i]`
    Index { register: String, index: u64 },
    /// `q[a:b]`, both ends included.
    Range { register: String, start: u64, end: u64 },
}

impl OperandRef {
    pub fn register_name(&self) -> &str {
        match self {
            OperandRef::Register(register)
            | OperandRef::Index { register, .. }
            | OperandRef::Range { register, .. } => register,
        }
    }
}

/// A parameter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Int(u64),
    Float(f64),
    Identifier(String),
    Pi,
    Tau,
    Euler,
    Neg(Box<Expression>),
    Binary {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
}

/// Arithmetic operators allowed in parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 3,
        }
    }

    /// Exponentiation groups to the right (`2 ** 3 ** 2 == 2 ** 9`).
    pub fn is_right_associative(self) -> bool {
        matches!(self, BinOp::Pow)
    }
}
