//! Generic syntax tree for the full expression surface.
//!
//! Nothing in this tree is trusted. It is only ever consumed by
//! [`crate::validate`], which keeps numeric arithmetic and rejects the rest.

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Imaginary(f64),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(Constant),
    Name(String),
    BinOp { left: Box<Node>, op: BinOp, right: Box<Node> },
    UnaryOp { op: UnaryOp, operand: Box<Node> },
    BoolOp { op: BoolOp, values: Vec<Node> },
    Compare { left: Box<Node>, ops: Vec<CmpOp>, comparators: Vec<Node> },
    Call { func: Box<Node>, args: Vec<Node>, keywords: Vec<(String, Node)> },
    Attribute { value: Box<Node>, attr: String },
    Subscript { value: Box<Node>, index: Box<Node> },
    Slice { lower: Option<Box<Node>>, upper: Option<Box<Node>>, step: Option<Box<Node>> },
    List(Vec<Node>),
    Tuple(Vec<Node>),
    Set(Vec<Node>),
    Dict(Vec<(Node, Node)>),
    IfExp { test: Box<Node>, body: Box<Node>, orelse: Box<Node> },
    Lambda { params: Vec<String>, body: Box<Node> },
    NamedExpr { target: String, value: Box<Node> },
    Assign { target: Box<Node>, value: Box<Node> },
    Sequence(Vec<Node>),
}

impl Node {
    /// Short human name used in rejection messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Node::Constant(Constant::Int(_) | Constant::Float(_)) => "number",
            Node::Constant(Constant::Imaginary(_)) => "complex number",
            Node::Constant(Constant::Str(_)) => "string literal",
            Node::Constant(Constant::Bool(_)) => "boolean literal",
            Node::Constant(Constant::None) => "None",
            Node::Name(_) => "name reference",
            Node::BinOp { .. } => "binary operation",
            Node::UnaryOp { .. } => "unary operation",
            Node::BoolOp { .. } => "logical operator",
            Node::Compare { .. } => "comparison",
            Node::Call { .. } => "function call",
            Node::Attribute { .. } => "attribute access",
            Node::Subscript { .. } => "subscript",
            Node::Slice { .. } => "slice",
            Node::List(_) => "list",
            Node::Tuple(_) => "tuple",
            Node::Set(_) => "set",
            Node::Dict(_) => "dict",
            Node::IfExp { .. } => "conditional expression",
            Node::Lambda { .. } => "lambda",
            Node::NamedExpr { .. } => "assignment expression",
            Node::Assign { .. } => "assignment",
            Node::Sequence(_) => "multiple statements",
        }
    }

    /// Nodes this node adds to the complexity count, children excluded.
    ///
    /// Operators and load/store contexts count as nodes of their own, so
    /// arithmetic weighs the same here as in [`crate::ast::Expr::size`].
    pub fn weight(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Call { .. } | Node::Slice { .. } | Node::Set(_) | Node::Dict(_) => 1,
            Node::IfExp { .. } | Node::Assign { .. } | Node::NamedExpr { .. } => 1,
            Node::Name(_) | Node::Attribute { .. } | Node::Subscript { .. } => 2,
            Node::List(_) | Node::Tuple(_) => 2,
            Node::BinOp { .. } | Node::UnaryOp { .. } | Node::BoolOp { .. } => 2,
            Node::Compare { ops, .. } => 1 + ops.len(),
            Node::Lambda { params, .. } => 2 + params.len(),
            Node::Sequence(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_weights_match_validated_tree() {
        let one = || Box::new(Node::Constant(Constant::Int(1)));
        assert_eq!(Node::Constant(Constant::Int(1)).weight(), 1);
        assert_eq!(Node::BinOp { left: one(), op: BinOp::Add, right: one() }.weight(), 2);
        assert_eq!(Node::UnaryOp { op: UnaryOp::Minus, operand: one() }.weight(), 2);
        assert_eq!(Node::Sequence(vec![]).weight(), 0);
    }
}
