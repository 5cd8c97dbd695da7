//! Error types for the QASM front end.
//!
//! Every message is a single line naming the offending construct, so it can
//! be handed back to a client verbatim.

use thiserror::Error;

/// Errors that can occur during parsing and lowering.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("line {line}: invalid token '{fragment}'")]
    LexerError { line: usize, fragment: String },

    /// Unexpected token.
    #[error("line {line}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// Version header other than 2.x or 3.x.
    #[error("unsupported OPENQASM version {0}")]
    InvalidVersion(String),

    /// Reference to an undeclared register or parameter.
    #[error("line {line}: undefined identifier '{name}'")]
    UndefinedIdentifier { line: usize, name: String },

    /// Register declared twice.
    #[error("line {line}: '{name}' is already declared")]
    RedefinedIdentifier { line: usize, name: String },

    /// Gate name outside the supported gate set.
    #[error("line {line}: unknown gate '{name}'")]
    UnknownGate { line: usize, name: String },

    /// Wrong number of qubit operands.
    #[error("line {line}: gate '{gate}' expects {expected} qubits, got {got}")]
    WrongQubitCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of parameters.
    #[error("line {line}: gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        line: usize,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Index out of bounds.
    #[error("line {line}: index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        line: usize,
        register: String,
        index: u64,
        size: u32,
    },

    /// Broadcast over registers of different sizes.
    #[error("line {line}: register operands of '{operation}' have different sizes")]
    RegisterSizeMismatch { line: usize, operation: String },

    /// Declared qubits or bits exceed the configured limit.
    #[error("{kind} count {declared} exceeds the limit of {limit}")]
    RegisterTooLarge {
        kind: &'static str,
        declared: u64,
        limit: u32,
    },

    /// Parameter expression that cannot be evaluated.
    #[error("line {line}: {message}")]
    InvalidExpression { line: usize, message: String },

    /// Valid QASM that the service does not execute.
    #[error("line {line}: {construct} is not supported")]
    Unsupported { line: usize, construct: String },

    /// IR error during circuit construction.
    #[error("circuit error: {0}")]
    CircuitError(#[from] qsimd_ir::IrError),
}

impl ParseError {
    /// Source line the error refers to, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::LexerError { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::UndefinedIdentifier { line, .. }
            | ParseError::RedefinedIdentifier { line, .. }
            | ParseError::UnknownGate { line, .. }
            | ParseError::WrongQubitCount { line, .. }
            | ParseError::WrongParameterCount { line, .. }
            | ParseError::IndexOutOfBounds { line, .. }
            | ParseError::RegisterSizeMismatch { line, .. }
            | ParseError::InvalidExpression { line, .. }
            | ParseError::Unsupported { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
