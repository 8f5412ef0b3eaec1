use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
}

impl Token {
    /// Whether a following `-` starts a negative number rather than nothing valid
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Ident(_) | Token::Number(_) | Token::Str(_) | Token::RParen | Token::RBracket
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Cmp(op) => write!(f, "{}", op),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::In => f.write_str("in"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, String> {
        while let Some(&(pos, c)) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                ',' => self.single(Token::Comma),
                '&' => self.double('&', Token::And),
                '|' => self.double('|', Token::Or),
                '~' => self.single(Token::Not),
                '=' => {
                    self.chars.next();
                    if !self.eat('=') {
                        return Err(format!("unexpected '=' at position {}, use '=='", pos));
                    }
                    self.tokens.push(Token::Cmp(CmpOp::Eq));
                }
                '!' => {
                    self.chars.next();
                    if !self.eat('=') {
                        return Err(format!("unexpected '!' at position {}", pos));
                    }
                    self.tokens.push(Token::Cmp(CmpOp::Ne));
                }
                '<' => {
                    self.chars.next();
                    let op = if self.eat('=') { CmpOp::Le } else { CmpOp::Lt };
                    self.tokens.push(Token::Cmp(op));
                }
                '>' => {
                    self.chars.next();
                    let op = if self.eat('=') { CmpOp::Ge } else { CmpOp::Gt };
                    self.tokens.push(Token::Cmp(op));
                }
                '\'' | '"' => {
                    let s = self.string(c)?;
                    self.tokens.push(Token::Str(s));
                }
                '`' => {
                    let s = self.string('`')?;
                    self.tokens.push(Token::Ident(s));
                }
                '.' if !self.next_is_digit_after_dot() => self.single(Token::Dot),
                '-' if !self.tokens.last().is_some_and(Token::ends_operand) => {
                    let n = self.number()?;
                    self.tokens.push(Token::Number(n));
                }
                c if c.is_ascii_digit() || c == '.' => {
                    let n = self.number()?;
                    self.tokens.push(Token::Number(n));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.word();
                    self.tokens.push(match word.as_str() {
                        "and" => Token::And,
                        "or" => Token::Or,
                        "not" => Token::Not,
                        "in" => Token::In,
                        _ => Token::Ident(word),
                    });
                }
                other => {
                    return Err(format!(
                        "unexpected character '{}' at position {}",
                        other, pos
                    ))
                }
            }
        }
        Ok(self.tokens)
    }

    fn single(&mut self, token: Token) {
        self.chars.next();
        self.tokens.push(token);
    }

    /// `&` and `&&` (likewise `|` and `||`) are the same operator
    fn double(&mut self, c: char, token: Token) {
        self.chars.next();
        self.eat(c);
        self.tokens.push(token);
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn next_is_digit_after_dot(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.peek().is_some_and(|&(_, c)| c.is_ascii_digit())
            && !self.tokens.last().is_some_and(Token::ends_operand)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn word(&mut self) -> String {
        let start = self.offset();
        while self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c.is_alphanumeric() || c == '_')
        {
            self.chars.next();
        }
        let end = self.offset();
        self.input[start..end].to_string()
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.offset();
        self.eat('-');
        let mut prev = ' ';
        while let Some(&(_, c)) = self.chars.peek() {
            let exponent_sign = (c == '-' || c == '+') && (prev == 'e' || prev == 'E');
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                prev = c;
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.offset();
        let text = &self.input[start..end];
        text.parse::<f64>()
            .map_err(|_| format!("invalid number '{}' at position {}", text, start))
    }

    fn string(&mut self, quote: char) -> Result<String, String> {
        let (start, _) = self.chars.next().unwrap_or((self.input.len(), quote));
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(format!("unterminated string starting at position {}", start))
    }
}

/// Split a filter expression into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    Lexer::new(input).run()
}
