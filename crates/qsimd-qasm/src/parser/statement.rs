//! Statement parsing.

use super::Parser;
use crate::ast::{GateCall, OperandRef, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Include => self.parse_include(),
            Token::Qubit => self.parse_v3_decl(Token::Qubit),
            Token::Bit => self.parse_v3_decl(Token::Bit),
            Token::QReg => self.parse_v2_decl(Token::QReg),
            Token::CReg => self.parse_v2_decl(Token::CReg),
            Token::Measure => self.parse_measure(),
            Token::Reset => self.parse_reset(),
            Token::Barrier => self.parse_barrier(),
            Token::Identifier(_) => self.parse_identifier_statement(),
            other => Err(self.unexpected("statement", &other)),
        }
    }

    /// `include "file";` for the standard libraries only; their gates are built in.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let line = self.line();
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    line,
                    expected: "string literal".into(),
                    found: other.to_string(),
                });
            }
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        if !matches!(path.as_str(), "stdgates.inc" | "qelib1.inc") {
            return Err(ParseError::Unsupported {
                line,
                construct: format!("include of \"{path}\""),
            });
        }
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// `qubit[n] name;` / `bit name;`
    #[allow(clippy::needless_pass_by_value)]
    fn parse_v3_decl(&mut self, keyword: Token) -> ParseResult<Statement> {
        let is_qubit = keyword == Token::Qubit;
        self.expect(keyword)?;

        let size = if self.consume(&Token::LBracket) {
            let size = self.parse_int_literal()?;
            self.expect(Token::RBracket)?;
            Some(size)
        } else {
            None
        };

        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;

        Ok(if is_qubit {
            Statement::QubitDecl { name, size }
        } else {
            Statement::BitDecl { name, size }
        })
    }

    /// `qreg name[n];` / `creg name[n];`
    #[allow(clippy::needless_pass_by_value)]
    fn parse_v2_decl(&mut self, keyword: Token) -> ParseResult<Statement> {
        let is_qubit = keyword == Token::QReg;
        self.expect(keyword)?;

        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = Some(self.parse_int_literal()?);
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;

        Ok(if is_qubit {
            Statement::QubitDecl { name, size }
        } else {
            Statement::BitDecl { name, size }
        })
    }

    /// `measure q -> c;`
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;
        let qubits = self.parse_operands()?;
        self.expect(Token::Arrow)?;
        let bits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubits, bits })
    }

    fn parse_reset(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Reset)?;
        let qubits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Reset { qubits })
    }

    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Barrier)?;
        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_operands()?
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier { qubits })
    }

    /// Statement starting with an identifier: a gate call, or `c = measure q;`.
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let is_assignment = matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.token),
            Some(Token::Eq | Token::LBracket)
        );
        if is_assignment {
            return self.parse_measure_assignment();
        }

        let name = self.parse_identifier()?;
        self.parse_gate_call(name)
    }

    fn parse_measure_assignment(&mut self) -> ParseResult<Statement> {
        let target = self.parse_operand()?;
        self.expect(Token::Eq)?;

        if !self.consume(&Token::Measure) {
            return Err(ParseError::Unsupported {
                line: self.line(),
                construct: "classical assignment".into(),
            });
        }

        let qubits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure {
            qubits,
            bits: vec![target],
        })
    }

    fn parse_gate_call(&mut self, name: String) -> ParseResult<Statement> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Gate(GateCall {
            name,
            params,
            qubits,
        }))
    }

    /// Comma-separated operand list.
    fn parse_operands(&mut self) -> ParseResult<Vec<OperandRef>> {
        let mut refs = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_operand()?);
        }
        Ok(refs)
    }

    /// `q`, `q[i]` or `q[a:b]`.
    fn parse_operand(&mut self) -> ParseResult<OperandRef> {
        let register = self.parse_identifier()?;

        if !self.consume(&Token::LBracket) {
            return Ok(OperandRef::Register(register));
        }

        let start = self.parse_int_literal()?;
        let operand = if self.consume(&Token::Colon) {
            let end = self.parse_int_literal()?;
            OperandRef::Range {
                register,
                start,
                end,
            }
        } else {
            OperandRef::Index {
                register,
                index: start,
            }
        };
        self.expect(Token::RBracket)?;
        Ok(operand)
    }
}
