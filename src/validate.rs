//! Whitelist validation of the generic syntax tree.
//!
//! Only numeric literals, `+ - * / % **` and unary `+ -` are accepted. Every
//! other node kind fails the whole expression, whatever the parser made of it.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::Error;
use crate::syntax::{self, Constant, Node};
use crate::types::Number;

fn binary_op(op: syntax::BinOp) -> Option<BinaryOp> {
    match op {
        syntax::BinOp::Add => Some(BinaryOp::Add),
        syntax::BinOp::Sub => Some(BinaryOp::Sub),
        syntax::BinOp::Mul => Some(BinaryOp::Mul),
        syntax::BinOp::Div => Some(BinaryOp::Div),
        syntax::BinOp::Mod => Some(BinaryOp::Mod),
        syntax::BinOp::Pow => Some(BinaryOp::Pow),
        _ => None,
    }
}

fn unary_op(op: syntax::UnaryOp) -> Option<UnaryOp> {
    match op {
        syntax::UnaryOp::Plus => Some(UnaryOp::Plus),
        syntax::UnaryOp::Minus => Some(UnaryOp::Minus),
        _ => None,
    }
}

/// Converts an untrusted tree into an arithmetic [`Expr`], or fails with
/// `InvalidSyntax` naming the first disallowed construct.
pub fn validate(node: &Node) -> Result<Expr, Error> {
    match node {
        Node::Constant(Constant::Int(i)) => Ok(Expr::Number(Number::Int(*i))),
        Node::Constant(Constant::Float(f)) => Ok(Expr::Number(Number::Float(*f))),
        Node::Constant(_) => Err(Error::syntax("Only numeric constants are allowed", None)),
        Node::BinOp { left, op, right } => {
            let allowed = binary_op(*op)
                .ok_or_else(|| Error::syntax(format!("Operator {:?} not allowed", op), None))?;
            Ok(Expr::Binary(Box::new(validate(left)?), allowed, Box::new(validate(right)?)))
        }
        Node::UnaryOp { op, operand } => {
            let allowed = unary_op(*op)
                .ok_or_else(|| Error::syntax(format!("Unary operator {:?} not allowed", op), None))?;
            Ok(Expr::Unary(allowed, Box::new(validate(operand)?)))
        }
        other => Err(Error::syntax(format!("Unsupported expression: {}", other.describe()), None)),
    }
}
