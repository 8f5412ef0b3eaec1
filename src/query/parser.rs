use crate::query::lexer::{CmpOp, Token};

/// Literal value written in a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String),
    Literal(Literal),
}

/// String predicates available through `<field>.str.<method>(...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrMethod {
    Contains,
    StartsWith,
    EndsWith,
}

impl StrMethod {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            _ => None,
        }
    }

    pub fn apply(&self, haystack: &str, pattern: &str) -> bool {
        match self {
            StrMethod::Contains => haystack.contains(pattern),
            StrMethod::StartsWith => haystack.starts_with(pattern),
            StrMethod::EndsWith => haystack.ends_with(pattern),
        }
    }
}

/// Boolean expression over station attributes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    InList {
        operand: Operand,
        values: Vec<Literal>,
        negated: bool,
    },
    Str {
        field: String,
        method: StrMethod,
        pattern: String,
    },
}

impl Expr {
    /// Names of every field referenced by the expression
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
            Expr::Compare { left, right, .. } => {
                push_field(left, out);
                push_field(right, out);
            }
            Expr::InList { operand, .. } => push_field(operand, out),
            Expr::Str { field, .. } => out.push(field.as_str()),
        }
    }
}

fn push_field<'a>(operand: &'a Operand, out: &mut Vec<&'a str>) {
    if let Operand::Field(name) = operand {
        out.push(name.as_str());
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.advance() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(format!("expected '{}', found '{}'", expected, token)),
            None => Err(format!("expected '{}', found end of expression", expected)),
        }
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut left = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::LParen) {
            self.advance();
            let inner = self.or()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }

        let left = match self.operand()? {
            Term::Predicate(expr) => return Ok(expr),
            Term::Value(operand) => operand,
        };

        match self.peek() {
            Some(Token::Cmp(_)) => self.comparison_chain(left),
            Some(Token::In) => {
                self.advance();
                Ok(Expr::InList {
                    operand: left,
                    values: self.list()?,
                    negated: false,
                })
            }
            Some(Token::Not) if self.peek_at(1) == Some(&Token::In) => {
                self.advance();
                self.advance();
                Ok(Expr::InList {
                    operand: left,
                    values: self.list()?,
                    negated: true,
                })
            }
            Some(token) => Err(format!("expected a comparison, found '{}'", token)),
            None => Err("expected a comparison, found end of expression".to_string()),
        }
    }

    /// `a < b <= c` reads as `a < b and b <= c`
    fn comparison_chain(&mut self, first: Operand) -> Result<Expr, String> {
        let mut left = first;
        let mut expr: Option<Expr> = None;
        while let Some(Token::Cmp(op)) = self.peek().cloned() {
            self.advance();
            let right = match self.operand()? {
                Term::Value(operand) => operand,
                Term::Predicate(_) => {
                    return Err("string methods cannot be compared".to_string())
                }
            };
            let cmp = Expr::Compare {
                left,
                op,
                right: right.clone(),
            };
            expr = Some(match expr {
                Some(prev) => Expr::And(Box::new(prev), Box::new(cmp)),
                None => cmp,
            });
            left = right;
        }
        expr.ok_or_else(|| "expected a comparison operator".to_string())
    }

    fn operand(&mut self) -> Result<Term, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Term::Value(Operand::Literal(Literal::Number(n)))),
            Some(Token::Str(s)) => Ok(Term::Value(Operand::Literal(Literal::Text(s)))),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::Dot) {
                    self.str_method(name).map(Term::Predicate)
                } else {
                    Ok(Term::Value(Operand::Field(name)))
                }
            }
            Some(token) => Err(format!("unexpected '{}'", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn str_method(&mut self, field: String) -> Result<Expr, String> {
        self.expect(Token::Dot)?;
        self.expect(Token::Ident("str".to_string()))?;
        self.expect(Token::Dot)?;
        let method = match self.advance() {
            Some(Token::Ident(name)) => StrMethod::from_name(&name)
                .ok_or_else(|| format!("unsupported string method '{}'", name))?,
            Some(token) => return Err(format!("expected a string method, found '{}'", token)),
            None => return Err("expected a string method".to_string()),
        };
        self.expect(Token::LParen)?;
        let pattern = match self.advance() {
            Some(Token::Str(s)) => s,
            Some(token) => return Err(format!("expected a quoted string, found '{}'", token)),
            None => return Err("expected a quoted string".to_string()),
        };
        self.expect(Token::RParen)?;
        Ok(Expr::Str {
            field,
            method,
            pattern,
        })
    }

    fn list(&mut self) -> Result<Vec<Literal>, String> {
        self.expect(Token::LBracket)?;
        let mut values = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.advance();
            return Ok(values);
        }
        loop {
            match self.advance() {
                Some(Token::Number(n)) => values.push(Literal::Number(n)),
                Some(Token::Str(s)) => values.push(Literal::Text(s)),
                Some(token) => return Err(format!("expected a list value, found '{}'", token)),
                None => return Err("unterminated list".to_string()),
            }
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RBracket) => return Ok(values),
                Some(token) => return Err(format!("expected ',' or ']', found '{}'", token)),
                None => return Err("unterminated list".to_string()),
            }
        }
    }
}

enum Term {
    Value(Operand),
    Predicate(Expr),
}

/// Parse a token stream into an expression tree
pub fn parse(tokens: Vec<Token>) -> Result<Expr, String> {
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected '{}' after end of expression", token)),
    }
}
