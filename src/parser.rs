use crate::config::Limits;
use crate::error::{Error, ErrorKind};
use crate::lexer::{Lexer, Token};
use crate::syntax::{BinOp, BoolOp, CmpOp, Constant, Node, UnaryOp};

// Binding powers, loosest first. Python's ladder: `**` binds tighter than a
// sign on its left, and `not` sits between `and` and comparisons.
const OR: u8 = 1;
const AND: u8 = 2;
const NOT: u8 = 3;
const COMPARE: u8 = 4;
const BIT_OR: u8 = 5;
const BIT_XOR: u8 = 6;
const BIT_AND: u8 = 7;
const SHIFT: u8 = 8;
const ADDITIVE: u8 = 9;
const MULTIPLICATIVE: u8 = 10;
const UNARY: u8 = 11;
const POWER: u8 = 12;

#[derive(Clone, Copy)]
enum Infix {
    Bool(BoolOp),
    Compare,
    Binary(BinOp),
}

fn infix_op(tok: &Token) -> Option<(u8, Infix)> {
    let entry = match tok {
        Token::Or => (OR, Infix::Bool(BoolOp::Or)),
        Token::And => (AND, Infix::Bool(BoolOp::And)),
        Token::EqEq
        | Token::NotEq
        | Token::Less
        | Token::Le
        | Token::Greater
        | Token::Ge
        | Token::In
        | Token::Is
        | Token::Not => (COMPARE, Infix::Compare),
        Token::Pipe => (BIT_OR, Infix::Binary(BinOp::BitOr)),
        Token::Caret => (BIT_XOR, Infix::Binary(BinOp::BitXor)),
        Token::Amp => (BIT_AND, Infix::Binary(BinOp::BitAnd)),
        Token::LShift => (SHIFT, Infix::Binary(BinOp::LShift)),
        Token::RShift => (SHIFT, Infix::Binary(BinOp::RShift)),
        Token::Plus => (ADDITIVE, Infix::Binary(BinOp::Add)),
        Token::Minus => (ADDITIVE, Infix::Binary(BinOp::Sub)),
        Token::Star => (MULTIPLICATIVE, Infix::Binary(BinOp::Mul)),
        Token::Slash => (MULTIPLICATIVE, Infix::Binary(BinOp::Div)),
        Token::DoubleSlash => (MULTIPLICATIVE, Infix::Binary(BinOp::FloorDiv)),
        Token::Percent => (MULTIPLICATIVE, Infix::Binary(BinOp::Mod)),
        Token::At => (MULTIPLICATIVE, Infix::Binary(BinOp::MatMul)),
        Token::DoubleStar => (POWER, Infix::Binary(BinOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

/// Recursive-descent parser for the general expression surface.
///
/// It accepts names, calls, collections, comparisons and the like so that
/// the whitelist sees the real structure of hostile input instead of a
/// confusing token error. Both complexity bounds are enforced while the tree
/// is being built: every recursive production goes through [`Parser::descend`]
/// and every finished node is charged against the node budget, so neither the
/// parser nor anything walking its output can recurse past the limits.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    look_pos: usize,
    depth: usize,
    max_depth: usize,
    nodes: usize,
    max_nodes: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, limits: &Limits) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input);
        let lookahead = lexer.next_token()?;
        let look_pos = lexer.last_start();
        Ok(Self {
            lexer,
            lookahead,
            look_pos,
            depth: 0,
            max_depth: limits.max_depth,
            // the enclosing expression root
            nodes: 1,
            max_nodes: limits.max_nodes,
        })
    }

    fn bump(&mut self) -> Result<(), Error> {
        self.lookahead = self.lexer.next_token()?;
        self.look_pos = self.lexer.last_start();
        Ok(())
    }

    fn expect(&mut self, tok: Token, msg: &str) -> Result<(), Error> {
        if self.lookahead == tok {
            self.bump()
        } else {
            self.err_here(msg)
        }
    }

    fn err_here<T>(&self, msg: &str) -> Result<T, Error> {
        Err(Error::syntax(msg, Some(self.look_pos)))
    }

    fn descend(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::with_detail(
                ErrorKind::ExpressionTooComplex,
                "nesting too deep",
                Some(self.look_pos),
            ));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Charges a finished node against the node budget.
    fn node(&mut self, node: Node) -> Result<Node, Error> {
        self.nodes += node.weight();
        if self.nodes > self.max_nodes {
            return Err(Error::with_detail(
                ErrorKind::ExpressionTooComplex,
                format!("more than {} nodes", self.max_nodes),
                Some(self.look_pos),
            ));
        }
        Ok(node)
    }

    /// Parses the whole input; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Node, Error> {
        let mut statements = vec![self.parse_statement()?];
        let mut separated = false;
        while let Token::Semicolon = self.lookahead {
            separated = true;
            self.bump()?;
            if self.lookahead == Token::Eof {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        if self.lookahead != Token::Eof {
            return Err(Error::syntax(
                format!("Unexpected token: {:?}", self.lookahead),
                Some(self.look_pos),
            ));
        }
        if separated {
            Ok(Node::Sequence(statements))
        } else {
            Ok(statements.remove(0))
        }
    }

    fn parse_statement(&mut self) -> Result<Node, Error> {
        let target = self.parse_expr()?;
        if let Token::Assign = self.lookahead {
            self.bump()?;
            let value = self.parse_expr()?;
            return self.node(Node::Assign { target: Box::new(target), value: Box::new(value) });
        }
        Ok(target)
    }

    fn parse_expr(&mut self) -> Result<Node, Error> {
        if let Token::Lambda = self.lookahead {
            return self.parse_lambda();
        }
        let node = self.parse_binary(0)?;
        match self.lookahead {
            Token::ColonEquals => {
                let target = match node {
                    Node::Name(name) => name,
                    _ => return self.err_here("cannot use assignment expression here"),
                };
                self.bump()?;
                self.descend()?;
                let value = self.parse_expr()?;
                self.ascend();
                self.node(Node::NamedExpr { target, value: Box::new(value) })
            }
            Token::If => {
                self.bump()?;
                let test = self.parse_binary(0)?;
                self.expect(Token::Else, "Expected 'else' in conditional expression")?;
                self.descend()?;
                let orelse = self.parse_expr()?;
                self.ascend();
                self.node(Node::IfExp { test: Box::new(test), body: Box::new(node), orelse: Box::new(orelse) })
            }
            _ => Ok(node),
        }
    }

    fn parse_lambda(&mut self) -> Result<Node, Error> {
        self.bump()?; // 'lambda'
        let mut params = Vec::new();
        while let Token::Identifier(name) = self.lookahead.clone() {
            self.bump()?;
            params.push(name);
            match self.lookahead {
                Token::Comma => self.bump()?,
                _ => break,
            }
        }
        self.expect(Token::Colon, "Expected ':' in lambda")?;
        self.descend()?;
        let body = self.parse_expr()?;
        self.ascend();
        self.node(Node::Lambda { params, body: Box::new(body) })
    }

    fn comparison_op(&mut self) -> Result<Option<CmpOp>, Error> {
        let op = match self.lookahead {
            Token::EqEq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::Less => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Greater => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            Token::In => CmpOp::In,
            Token::Is => {
                self.bump()?;
                if let Token::Not = self.lookahead {
                    self.bump()?;
                    return Ok(Some(CmpOp::IsNot));
                }
                return Ok(Some(CmpOp::Is));
            }
            Token::Not => {
                self.bump()?;
                if let Token::In = self.lookahead {
                    self.bump()?;
                    return Ok(Some(CmpOp::NotIn));
                }
                return self.err_here("Expected 'in' after 'not'");
            }
            _ => return Ok(None),
        };
        self.bump()?;
        Ok(Some(op))
    }

    /// Operators binding at least as tightly as `min_bp`.
    ///
    /// Left-associative levels loop instead of recursing, so a long flat
    /// sum costs one frame no matter how many terms it has.
    fn parse_binary(&mut self, min_bp: u8) -> Result<Node, Error> {
        let mut lhs = self.parse_prefix()?;
        while let Some((bp, infix)) = infix_op(&self.lookahead) {
            if bp < min_bp {
                break;
            }
            lhs = match infix {
                Infix::Binary(BinOp::Pow) => {
                    // right associative, and the exponent may carry a sign (2**-1)
                    self.bump()?;
                    self.descend()?;
                    let exponent = self.parse_binary(POWER)?;
                    self.ascend();
                    self.node(Node::BinOp { left: Box::new(lhs), op: BinOp::Pow, right: Box::new(exponent) })?
                }
                Infix::Binary(op) => {
                    self.bump()?;
                    let rhs = self.parse_binary(bp + 1)?;
                    self.node(Node::BinOp { left: Box::new(lhs), op, right: Box::new(rhs) })?
                }
                Infix::Bool(op) => {
                    let tok = self.lookahead.clone();
                    let mut values = vec![lhs];
                    while self.lookahead == tok {
                        self.bump()?;
                        values.push(self.parse_binary(bp + 1)?);
                    }
                    self.node(Node::BoolOp { op, values })?
                }
                Infix::Compare => {
                    let mut ops = Vec::new();
                    let mut comparators = Vec::new();
                    while let Some(op) = self.comparison_op()? {
                        ops.push(op);
                        comparators.push(self.parse_binary(COMPARE + 1)?);
                    }
                    self.node(Node::Compare { left: Box::new(lhs), ops, comparators })?
                }
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Node, Error> {
        let (op, bp) = match self.lookahead {
            Token::Not => (UnaryOp::Not, NOT),
            Token::Plus => (UnaryOp::Plus, UNARY),
            Token::Minus => (UnaryOp::Minus, UNARY),
            Token::Tilde => (UnaryOp::Invert, UNARY),
            _ => return self.parse_postfix(),
        };
        self.bump()?;
        self.descend()?;
        let operand = self.parse_binary(bp)?;
        self.ascend();
        self.node(Node::UnaryOp { op, operand: Box::new(operand) })
    }

    fn parse_postfix(&mut self) -> Result<Node, Error> {
        let mut node = self.parse_atom()?;
        loop {
            node = match self.lookahead {
                Token::LParen => {
                    self.bump()?;
                    self.descend()?;
                    let (args, keywords) = self.parse_call_args()?;
                    self.ascend();
                    self.node(Node::Call { func: Box::new(node), args, keywords })?
                }
                Token::Dot => {
                    self.bump()?;
                    let attr = match self.lookahead.clone() {
                        Token::Identifier(s) => s,
                        _ => return self.err_here("Expected attribute name after '.'"),
                    };
                    self.bump()?;
                    self.node(Node::Attribute { value: Box::new(node), attr })?
                }
                Token::LBracket => {
                    self.bump()?;
                    self.descend()?;
                    let index = self.parse_subscript()?;
                    self.ascend();
                    self.node(Node::Subscript { value: Box::new(node), index: Box::new(index) })?
                }
                _ => return Ok(node),
            };
        }
    }

    fn parse_call_args(&mut self) -> Result<(Vec<Node>, Vec<(String, Node)>), Error> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while self.lookahead != Token::RParen {
            let arg = self.parse_expr()?;
            if let Token::Assign = self.lookahead {
                let name = match arg {
                    Node::Name(name) => name,
                    _ => return self.err_here("Expression cannot be a keyword argument"),
                };
                self.bump()?;
                keywords.push((name, self.parse_expr()?));
            } else {
                args.push(arg);
            }
            match self.lookahead {
                Token::Comma => self.bump()?,
                Token::RParen => break,
                _ => return self.err_here("Expected ',' or ')' in argument list"),
            }
        }
        self.bump()?; // ')'
        Ok((args, keywords))
    }

    fn parse_slice_part(&mut self) -> Result<Option<Box<Node>>, Error> {
        match self.lookahead {
            Token::Colon | Token::RBracket | Token::Comma => Ok(None),
            _ => Ok(Some(Box::new(self.parse_expr()?))),
        }
    }

    fn parse_subscript(&mut self) -> Result<Node, Error> {
        if self.lookahead == Token::RBracket {
            return self.err_here("Empty subscript");
        }
        let mut items = Vec::new();
        loop {
            let lower = self.parse_slice_part()?;
            let item = if let Token::Colon = self.lookahead {
                self.bump()?;
                let upper = self.parse_slice_part()?;
                let mut step = None;
                if let Token::Colon = self.lookahead {
                    self.bump()?;
                    step = self.parse_slice_part()?;
                }
                self.node(Node::Slice { lower, upper, step })?
            } else {
                match lower {
                    Some(node) => *node,
                    None => return self.err_here("Expected expression in subscript"),
                }
            };
            items.push(item);
            match self.lookahead {
                Token::Comma => self.bump()?,
                Token::RBracket => break,
                _ => return self.err_here("Expected ',' or ']' in subscript"),
            }
            if self.lookahead == Token::RBracket {
                break;
            }
        }
        self.bump()?; // ']'
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            self.node(Node::Tuple(items))
        }
    }

    /// Comma separated expressions up to `close`, which is consumed.
    fn parse_items(&mut self, mut items: Vec<Node>, close: Token, what: &str) -> Result<Vec<Node>, Error> {
        while self.lookahead != close {
            items.push(self.parse_expr()?);
            if let Token::Comma = self.lookahead {
                self.bump()?;
            } else if self.lookahead != close {
                return self.err_here(what);
            }
        }
        self.bump()?; // close
        Ok(items)
    }

    fn parse_braces(&mut self) -> Result<Node, Error> {
        if let Token::RBrace = self.lookahead {
            self.bump()?;
            return self.node(Node::Dict(Vec::new()));
        }
        let first = self.parse_expr()?;
        if let Token::Colon = self.lookahead {
            self.bump()?;
            let mut pairs = vec![(first, self.parse_expr()?)];
            while let Token::Comma = self.lookahead {
                self.bump()?;
                if self.lookahead == Token::RBrace {
                    break;
                }
                let key = self.parse_expr()?;
                self.expect(Token::Colon, "Expected ':' in dict")?;
                pairs.push((key, self.parse_expr()?));
            }
            self.expect(Token::RBrace, "Expected '}' to close dict")?;
            return self.node(Node::Dict(pairs));
        }
        let items = match self.lookahead {
            Token::Comma => {
                self.bump()?;
                self.parse_items(vec![first], Token::RBrace, "Expected ',' or '}' in set")?
            }
            Token::RBrace => {
                self.bump()?;
                vec![first]
            }
            _ => return self.err_here("Expected ',' or '}' in set"),
        };
        self.node(Node::Set(items))
    }

    /// Parenthesised group or tuple. A plain group parses its expression
    /// directly, keeping the stack cost of each nesting level small.
    fn parse_group(&mut self) -> Result<Node, Error> {
        if let Token::RParen = self.lookahead {
            self.bump()?;
            return self.node(Node::Tuple(Vec::new()));
        }
        let first = self.parse_expr()?;
        match self.lookahead {
            Token::RParen => {
                self.bump()?;
                Ok(first)
            }
            Token::Comma => {
                self.bump()?;
                let items = self.parse_items(vec![first], Token::RParen, "Expected ')'")?;
                self.node(Node::Tuple(items))
            }
            _ => self.err_here("Expected ')'"),
        }
    }

    fn parse_atom(&mut self) -> Result<Node, Error> {
        let node = match self.lookahead.clone() {
            Token::Int(i) => Node::Constant(Constant::Int(i)),
            Token::Float(f) => Node::Constant(Constant::Float(f)),
            Token::Imaginary(f) => Node::Constant(Constant::Imaginary(f)),
            Token::String(s) => Node::Constant(Constant::Str(s)),
            Token::True => Node::Constant(Constant::Bool(true)),
            Token::False => Node::Constant(Constant::Bool(false)),
            Token::None => Node::Constant(Constant::None),
            Token::Identifier(name) => Node::Name(name),
            Token::LParen => {
                self.bump()?;
                self.descend()?;
                let node = self.parse_group()?;
                self.ascend();
                return Ok(node);
            }
            Token::LBracket => {
                self.bump()?;
                self.descend()?;
                let items = self.parse_items(Vec::new(), Token::RBracket, "Expected ',' or ']' in list")?;
                self.ascend();
                return self.node(Node::List(items));
            }
            Token::LBrace => {
                self.bump()?;
                self.descend()?;
                let node = self.parse_braces()?;
                self.ascend();
                return Ok(node);
            }
            Token::Eof => return self.err_here("Unexpected end of expression"),
            other => return Err(Error::syntax(format!("Unexpected token: {:?}", other), Some(self.look_pos))),
        };
        self.bump()?;
        self.node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Node, Error> {
        Parser::new(src, &Limits::default())?.parse()
    }

    fn int(i: i64) -> Box<Node> {
        Box::new(Node::Constant(Constant::Int(i)))
    }

    #[test]
    fn power_binds_tighter_than_left_sign() {
        assert_eq!(
            parse("-2**2").unwrap(),
            Node::UnaryOp {
                op: UnaryOp::Minus,
                operand: Box::new(Node::BinOp { left: int(2), op: BinOp::Pow, right: int(2) }),
            }
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse("2**3**2").unwrap(),
            Node::BinOp {
                left: int(2),
                op: BinOp::Pow,
                right: Box::new(Node::BinOp { left: int(3), op: BinOp::Pow, right: int(2) }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse("1-2-3").unwrap(),
            Node::BinOp {
                left: Box::new(Node::BinOp { left: int(1), op: BinOp::Sub, right: int(2) }),
                op: BinOp::Sub,
                right: int(3),
            }
        );
    }

    #[test]
    fn recognizes_non_arithmetic_structure() {
        assert!(matches!(parse("__import__('os')").unwrap(), Node::Call { .. }));
        assert!(matches!(parse("a.b").unwrap(), Node::Attribute { .. }));
        assert!(matches!(parse("[1,2,3]").unwrap(), Node::List(_)));
        assert!(matches!(parse("x[1:2]").unwrap(), Node::Subscript { .. }));
        assert!(matches!(parse("1; 2").unwrap(), Node::Sequence(_)));
        assert!(matches!(parse("1 < 2 < 3").unwrap(), Node::Compare { .. }));
        assert!(matches!(parse("1 if 2 else 3").unwrap(), Node::IfExp { .. }));
        assert!(matches!(parse("lambda x: x").unwrap(), Node::Lambda { .. }));
        assert!(matches!(parse("{1: 2}").unwrap(), Node::Dict(_)));
        assert!(matches!(parse("(1,)").unwrap(), Node::Tuple(_)));
    }

    #[test]
    fn rejects_trailing_and_missing_tokens() {
        assert!(parse("1 2").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse(")").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(5), ")".repeat(5));
        let limits = |max_depth| Limits { max_depth, ..Limits::default() };
        let err = Parser::new(&deep, &limits(4)).unwrap().parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpressionTooComplex);
        assert!(Parser::new(&deep, &limits(5)).unwrap().parse().is_ok());
    }

    #[test]
    fn recursive_productions_count_toward_depth() {
        let limits = Limits { max_depth: 3, ..Limits::default() };
        for src in [
            "a := b := c := d := 1",
            "1 if 2 else 3 if 4 else 5 if 6 else 7 if 8 else 9",
            "lambda: lambda: lambda: lambda: 1",
            "2**2**2**2**2",
            "not not not not 1",
        ] {
            let err = Parser::new(src, &limits).unwrap().parse().unwrap_err();
            assert_eq!(err.kind, ErrorKind::ExpressionTooComplex, "{src}");
        }
    }

    #[test]
    fn node_budget_is_enforced_while_parsing() {
        let limits = Limits { max_nodes: 200, ..Limits::default() };
        // root + 68 literals + 67 additions
        let err = Parser::new(&format!("{}1", "1+".repeat(67)), &limits).unwrap().parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpressionTooComplex);
        assert!(Parser::new(&format!("{}1", "1+".repeat(66)), &limits).unwrap().parse().is_ok());

        // fails long before the whole input is consumed
        let huge = format!("{}1", "1+".repeat(400_000));
        let err = Parser::new(&huge, &limits).unwrap().parse().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpressionTooComplex);
        assert!(err.position.is_some_and(|pos| pos < 1_000));
    }

    #[test]
    fn flat_operator_chains_are_parsed_iteratively() {
        let limits = Limits { max_depth: 2, ..Limits::default() };
        assert!(Parser::new("1+2*3-4/5%6", &limits).unwrap().parse().is_ok());
        assert!(matches!(
            Parser::new("1 or 2 or 3", &limits).unwrap().parse().unwrap(),
            Node::BoolOp { op: BoolOp::Or, ref values } if values.len() == 3
        ));
    }
}
