use crate::error::Error;

/// Tokens of the general expression surface. Far more is tokenized than is
/// ever evaluated; the whitelist in `validate` decides what survives.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Imaginary(f64),
    Identifier(String),
    String(String),
    True,
    False,
    None,
    And,
    Or,
    Not,
    If,
    Else,
    Lambda,
    In,
    Is,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    At,
    Amp,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,
    Less,
    Greater,
    Le,
    Ge,
    EqEq,
    NotEq,
    Assign,
    ColonEquals,
    Dot,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eof,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    last_start: usize,
}

fn is_dec(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_hex(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn is_oct(c: u8) -> bool {
    matches!(c, b'0'..=b'7')
}

fn is_bin(c: u8) -> bool {
    matches!(c, b'0' | b'1')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0, last_start: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
            self.pos += 1;
        }
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        // Token boundaries always fall on ASCII bytes.
        std::str::from_utf8(&self.input[start..end]).unwrap_or("")
    }

    /// Scans `digit (_? digit)*`; at least one digit is required.
    fn digits(&mut self, accept: fn(u8) -> bool, start: usize) -> Result<(), Error> {
        match self.peek() {
            Some(c) if accept(c) => self.pos += 1,
            _ => return Err(Error::syntax("invalid numeric literal", Some(start))),
        }
        loop {
            match self.peek() {
                Some(c) if accept(c) => self.pos += 1,
                Some(b'_') => match self.peek_at(1) {
                    Some(c) if accept(c) => self.pos += 2,
                    _ => return Err(Error::syntax("invalid numeric literal", Some(start))),
                },
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, Error> {
        self.pos = start;
        if self.peek() == Some(b'0') {
            let radix = match self.peek_at(1) {
                Some(b'x' | b'X') => Some((16, is_hex as fn(u8) -> bool)),
                Some(b'o' | b'O') => Some((8, is_oct as fn(u8) -> bool)),
                Some(b'b' | b'B') => Some((2, is_bin as fn(u8) -> bool)),
                _ => None,
            };
            if let Some((radix, accept)) = radix {
                self.pos += 2;
                self.eat(b'_');
                let digits_start = self.pos;
                self.digits(accept, start)?;
                return Ok(radix_literal(self.text(digits_start, self.pos), radix));
            }
        }

        let mut is_float = false;
        if self.peek() != Some(b'.') {
            self.digits(is_dec, start)?;
        }
        if self.eat(b'.') {
            is_float = true;
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                self.digits(is_dec, start)?;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.digits(is_dec, start)?;
            is_float = true;
        }
        let imaginary = matches!(self.peek(), Some(b'j' | b'J'));
        let end = self.pos;
        if imaginary {
            self.pos += 1;
        }

        let cleaned: String = self.text(start, end).chars().filter(|c| *c != '_').collect();
        if imaginary || is_float {
            let n: f64 = cleaned
                .parse()
                .map_err(|_| Error::syntax("invalid numeric literal", Some(start)))?;
            return Ok(if imaginary { Token::Imaginary(n) } else { Token::Float(n) });
        }
        if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.bytes().any(|b| b != b'0') {
            return Err(Error::syntax(
                "leading zeros in decimal integer literals are not permitted",
                Some(start),
            ));
        }
        match cleaned.parse::<i64>() {
            Ok(i) => Ok(Token::Int(i)),
            // Beyond i64 the value degrades to a float.
            Err(_) => cleaned
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| Error::syntax("invalid numeric literal", Some(start))),
        }
    }

    fn identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.pos += 1;
        }
        match self.text(start, self.pos) {
            "True" => Token::True,
            "False" => Token::False,
            "None" => Token::None,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "if" => Token::If,
            "else" => Token::Else,
            "lambda" => Token::Lambda,
            "in" => Token::In,
            "is" => Token::Is,
            s => Token::Identifier(s.to_string()),
        }
    }

    fn string(&mut self, quote: u8, start: usize) -> Result<Token, Error> {
        // consume until matching quote, support escapes; preserve UTF-8 bytes
        let mut buf: Vec<u8> = Vec::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return String::from_utf8(buf)
                    .map(Token::String)
                    .map_err(|_| Error::syntax("Invalid UTF-8 in string", Some(start)));
            }
            match c {
                b'\\' => match self.bump() {
                    Some(b'n') => buf.push(b'\n'),
                    Some(b't') => buf.push(b'\t'),
                    Some(x) => buf.push(x),
                    None => return Err(Error::syntax("Unterminated escape in string", Some(self.pos))),
                },
                b'\n' => break,
                _ => buf.push(c),
            }
        }
        Err(Error::syntax("Unterminated string literal", Some(start)))
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_ws();
        let start = self.pos;
        self.last_start = start;
        let ch = match self.bump() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let tok = match ch {
            b'0'..=b'9' => return self.number(start),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => return self.number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(start),
            b'"' | b'\'' => return self.string(ch, start),
            b'.' => Token::Dot,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => {
                if self.eat(b'*') {
                    Token::DoubleStar
                } else {
                    Token::Star
                }
            }
            b'/' => {
                if self.eat(b'/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            b'%' => Token::Percent,
            b'@' => Token::At,
            b'&' => Token::Amp,
            b'|' => Token::Pipe,
            b'^' => Token::Caret,
            b'~' => Token::Tilde,
            b'<' => {
                if self.eat(b'<') {
                    Token::LShift
                } else if self.eat(b'=') {
                    Token::Le
                } else {
                    Token::Less
                }
            }
            b'>' => {
                if self.eat(b'>') {
                    Token::RShift
                } else if self.eat(b'=') {
                    Token::Ge
                } else {
                    Token::Greater
                }
            }
            b'=' => {
                if self.eat(b'=') {
                    Token::EqEq
                } else {
                    Token::Assign
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    Token::NotEq
                } else {
                    return Err(Error::syntax("Unexpected '!'", Some(start)));
                }
            }
            b':' => {
                if self.eat(b'=') {
                    Token::ColonEquals
                } else {
                    Token::Colon
                }
            }
            b',' => Token::Comma,
            b';' => Token::Semicolon,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            _ => return Err(Error::syntax("Unexpected character", Some(start))),
        };
        Ok(tok)
    }

    pub fn last_start(&self) -> usize {
        self.last_start
    }
}

/// Value of a prefixed integer literal; falls back to a float past `i64`.
fn radix_literal(digits: &str, radix: u32) -> Token {
    let mut int: Option<i64> = Some(0);
    let mut float = 0.0f64;
    for d in digits.chars().filter_map(|c| c.to_digit(radix)) {
        float = float * radix as f64 + d as f64;
        int = int
            .and_then(|acc| acc.checked_mul(radix as i64))
            .and_then(|acc| acc.checked_add(d as i64));
    }
    match int {
        Some(i) => Token::Int(i),
        None => Token::Float(float),
    }
}
