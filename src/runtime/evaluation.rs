use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::Error;
use crate::runtime::arithmetic;
use crate::types::Number;

/// Reduces a validated tree to a single number. Operands are evaluated
/// left before right, so the leftmost failure is the one reported.
pub fn eval(expr: &Expr) -> Result<Number, Error> {
    match expr {
        Expr::Number(Number::Float(f)) => arithmetic::finite(*f),
        Expr::Number(n) => Ok(*n),
        Expr::Unary(op, e) => {
            let v = eval(e)?;
            match op {
                UnaryOp::Plus => Ok(v),
                UnaryOp::Minus => arithmetic::neg(v),
            }
        }
        Expr::Binary(l, op, r) => {
            let a = eval(l)?;
            let b = eval(r)?;
            match op {
                BinaryOp::Add => arithmetic::add(a, b),
                BinaryOp::Sub => arithmetic::sub(a, b),
                BinaryOp::Mul => arithmetic::mul(a, b),
                BinaryOp::Div => arithmetic::div(a, b),
                BinaryOp::Mod => arithmetic::modulo(a, b),
                BinaryOp::Pow => arithmetic::pow(a, b),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn num(n: Number) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn left_failure_is_reported_first() {
        // (1/0) + (1e308 * 10): the division fails before the overflow is reached
        let expr = Expr::Binary(
            Box::new(Expr::Binary(num(Number::Int(1)), BinaryOp::Div, num(Number::Int(0)))),
            BinaryOp::Add,
            Box::new(Expr::Binary(num(Number::Float(1e308)), BinaryOp::Mul, num(Number::Int(10)))),
        );
        assert_eq!(eval(&expr).unwrap_err().kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn infinite_literal_is_out_of_range() {
        let expr = Expr::Number(Number::Float(f64::INFINITY));
        assert_eq!(eval(&expr).unwrap_err().kind, ErrorKind::NumericOverflow);
    }

    #[test]
    fn unary_plus_keeps_type() {
        let expr = Expr::Unary(UnaryOp::Plus, num(Number::Int(3)));
        assert_eq!(eval(&expr).unwrap(), Number::Int(3));
    }
}
