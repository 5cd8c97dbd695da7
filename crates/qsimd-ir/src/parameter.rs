//! Parameter expressions for gate angles.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A gate angle, either a plain number or a small arithmetic expression
/// over numbers and `pi`. Front ends resolve every identifier before an
/// expression is built, so evaluation only fails on arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Evaluate to a concrete value.
    ///
    /// Returns `None` for division by zero and any result that is not finite.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            ParameterExpression::Constant(v) => *v,
            ParameterExpression::Pi => PI,
            ParameterExpression::Neg(e) => -e.as_f64()?,
            ParameterExpression::Add(a, b) => a.as_f64()? + b.as_f64()?,
            ParameterExpression::Sub(a, b) => a.as_f64()? - b.as_f64()?,
            ParameterExpression::Mul(a, b) => a.as_f64()? * b.as_f64()?,
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                a.as_f64()? / divisor
            }
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert_eq!(p.as_f64(), Some(1.5));
        assert_eq!(p.to_string(), "1.5");
    }

    #[test]
    fn test_pi_arithmetic() {
        let half_pi = ParameterExpression::pi() / ParameterExpression::constant(2.0);
        assert!((half_pi.as_f64().unwrap() - PI / 2.0).abs() < 1e-12);

        let neg = -ParameterExpression::pi();
        assert!((neg.as_f64().unwrap() + PI).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_rejected() {
        let p = ParameterExpression::constant(1.0) / ParameterExpression::constant(0.0);
        assert_eq!(p.as_f64(), None);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let p = ParameterExpression::constant(f64::MAX) * ParameterExpression::constant(10.0);
        assert_eq!(p.as_f64(), None);
    }
}
