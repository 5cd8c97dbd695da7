//! Parser for `OpenQASM` 2 and 3.

mod expression;
mod lowering;
mod statement;

use qsimd_ir::Circuit;

use crate::ast::{Located, Program};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Caps applied while lowering, before any register is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Total qubits across all declared registers.
    pub max_qubits: u32,
    /// Total classical bits across all declared registers.
    pub max_clbits: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_qubits: 1024,
            max_clbits: 1024,
        }
    }
}

/// Parse a QASM source string into a Circuit with default [`Limits`].
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_with_limits(source, Limits::default())
}

/// Parse a QASM source string into a Circuit, rejecting programs that
/// declare more qubits or bits than `limits` allows.
pub fn parse_with_limits(source: &str, limits: Limits) -> ParseResult<Circuit> {
    let mut parser = Parser::new(source)?;
    let program = parser.parse_program()?;
    lowering::lower_to_circuit(&program, limits)
}

/// Deepest parenthesis/unary nesting accepted in an expression.
const MAX_EXPRESSION_DEPTH: usize = 64;

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    pub(super) depth: usize,
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, or of the last token at end of input.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    pub(super) fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        if let Token::Unsupported(construct) = found {
            return ParseError::Unsupported {
                line: self.line(),
                construct: (*construct).to_string(),
            };
        }
        ParseError::UnexpectedToken {
            line: self.line(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        match self.peek().cloned() {
            None => Err(ParseError::UnexpectedEof(format!("'{expected}'"))),
            Some(found) if std::mem::discriminant(&found) != std::mem::discriminant(&expected) => {
                Err(self.unexpected(&format!("'{expected}'"), &found))
            }
            Some(_) => {
                self.pos += 1;
                Ok(())
            }
        }
    }

    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        let version = if self.consume(&Token::OpenQasm) {
            let version = self.parse_version()?;
            self.expect(Token::Semicolon)?;
            Some(version)
        } else {
            None
        };

        let mut statements = Vec::new();
        while !self.is_eof() {
            let line = self.line();
            let node = self.parse_statement()?;
            statements.push(Located { line, node });
        }

        Ok(Program {
            version,
            statements,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn parse_version(&mut self) -> ParseResult<String> {
        let (major, text) = match self.advance() {
            Some(Token::FloatLiteral(v)) => (v.trunc(), format!("{v:.1}")),
            Some(Token::IntLiteral(v)) => (v as f64, format!("{v}.0")),
            Some(other) => return Err(ParseError::InvalidVersion(other.to_string())),
            None => return Err(ParseError::UnexpectedEof("version number".into())),
        };
        if major == 2.0 || major == 3.0 {
            Ok(text)
        } else {
            Err(ParseError::InvalidVersion(text))
        }
    }

    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(Token::Identifier(s)) => {
                self.pos += 1;
                Ok(s)
            }
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    pub(super) fn parse_int_literal(&mut self) -> ParseResult<u64> {
        match self.peek().cloned() {
            Some(Token::IntLiteral(v)) => {
                self.pos += 1;
                Ok(v)
            }
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }

    /// Track nesting for recursive expression rules.
    pub(super) fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(ParseError::InvalidExpression {
                line: self.line(),
                message: format!("expression nested deeper than {MAX_EXPRESSION_DEPTH} levels"),
            });
        }
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
