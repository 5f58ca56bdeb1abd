use crate::types::Number;

/// A validated arithmetic tree. Only literals and the whitelisted operators
/// can be represented; everything else is rejected before one is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }

    /// Operator for a two-operand calculator selection.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "%" => Some(BinaryOp::Mod),
            "**" => Some(BinaryOp::Pow),
            _ => None,
        }
    }
}

impl Expr {
    /// Size of the tree: each literal counts one, each operation counts two
    /// (itself and its operator).
    pub fn size(&self) -> usize {
        match self {
            Expr::Number(_) => 1,
            Expr::Unary(_, operand) => 2 + operand.size(),
            Expr::Binary(left, _, right) => 2 + left.size() + right.size(),
        }
    }

    /// Complexity measure for the node budget: the tree size plus the
    /// enclosing expression root.
    pub fn node_count(&self) -> usize {
        1 + self.size()
    }
}
