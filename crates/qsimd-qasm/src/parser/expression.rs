//! Expression parsing by precedence climbing.

use super::Parser;
use crate::ast::{BinOp, Expression};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Comma-separated expressions, as in a gate's parameter list.
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }

        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek().and_then(binary_op) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;

            let next_min = if op.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            self.enter()?;
            let right = self.parse_binary(next_min);
            self.leave();
            let right = right?;
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            self.enter()?;
            let inner = self.parse_unary();
            self.leave();
            return Ok(Expression::Neg(Box::new(inner?)));
        }
        if self.consume(&Token::Plus) {
            self.enter()?;
            let inner = self.parse_unary();
            self.leave();
            return inner;
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        let expr = match token {
            Token::IntLiteral(v) => Expression::Int(v),
            Token::FloatLiteral(v) => Expression::Float(v),
            Token::Pi => Expression::Pi,
            Token::Tau => Expression::Tau,
            Token::Euler => Expression::Euler,
            Token::Identifier(name) => Expression::Identifier(name),
            Token::LParen => {
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_expression();
                self.leave();
                let inner = inner?;
                self.expect(Token::RParen)?;
                return Ok(inner);
            }
            other => return Err(self.unexpected("expression", &other)),
        };

        self.pos += 1;
        Ok(expr)
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::Power => Some(BinOp::Pow),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expression {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_expression().unwrap()
    }

    #[test]
    fn test_precedence() {
        let e = expr("1 + 2 * 3");
        let Expression::Binary { op, right, .. } = e else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(*right, Expression::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        // (5 - 2) - 1
        let e = expr("5 - 2 - 1");
        let Expression::Binary { left, op, .. } = e else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinOp::Sub);
        assert!(matches!(*left, Expression::Binary { op: BinOp::Sub, .. }));
    }

    #[test]
    fn test_power_is_right_associative() {
        let e = expr("2 ** 3 ** 2");
        let Expression::Binary { left, right, .. } = e else {
            panic!("expected binary expression");
        };
        assert_eq!(*left, Expression::Int(2));
        assert!(matches!(*right, Expression::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn test_unary_and_parens() {
        let e = expr("-(pi / 2)");
        assert!(matches!(e, Expression::Neg(_)));
    }

    #[test]
    fn test_empty_list() {
        let mut parser = Parser::new(")").unwrap();
        assert!(parser.parse_expression_list().unwrap().is_empty());
    }
}
