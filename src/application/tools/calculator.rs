//! # Calculator
//!
//! A small recursive-descent evaluator for arithmetic expressions. Only numbers, the math
//! constants and a fixed list of functions are accepted, so arbitrary code never runs.

use anyhow::Result;
use async_trait::async_trait;
use std::f64::consts;
use thiserror::Error;

use super::{Tool, ToolContext, clean_input};

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },
    #[error("math domain error")]
    Domain,
    #[error("empty expression")]
    Empty,
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Pow,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::DoubleSlash => "//".into(),
            Token::Percent => "%".into(),
            Token::Pow => "**".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                // exponent part, e.g. 1e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let ident = ident.strip_prefix("math.").unwrap_or(&ident).to_string();
                tokens.push(Token::Ident(ident));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

/// Nesting limit for parentheses, unary signs and exponents.
const MAX_DEPTH: usize = 200;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), CalcError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(CalcError::UnexpectedToken(token.text())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) | Some(Token::Slash) | Some(Token::DoubleSlash) | Some(Token::Percent) => {
                    self.next()
                }
                _ => return Ok(value),
            };
            let rhs = self.unary()?;
            value = match op {
                Some(Token::Star) => value * rhs,
                Some(Token::Slash) => {
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value / rhs
                }
                Some(Token::DoubleSlash) => {
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    (value / rhs).floor()
                }
                _ => {
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    // sign follows the divisor
                    value - rhs * (value / rhs).floor()
                }
            };
        }
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?   (right associative)
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            if base == 0.0 && exponent < 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            let value = base.powf(exponent);
            if value.is_nan() {
                return Err(CalcError::Domain);
            }
            return Ok(value);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(CalcError::UnexpectedToken(token.text())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>, CalcError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(CalcError::UnexpectedToken(token.text())),
                None => return Err(CalcError::UnexpectedEnd),
            }
        }
    }
}

fn constant(name: &str) -> Result<f64, CalcError> {
    match name {
        "pi" => Ok(consts::PI),
        "e" => Ok(consts::E),
        "tau" => Ok(consts::TAU),
        "inf" => Ok(f64::INFINITY),
        _ => Err(CalcError::UnknownName(name.to_string())),
    }
}

fn arity(name: &str, expected: &'static str, got: usize) -> CalcError {
    CalcError::Arity {
        name: name.to_string(),
        expected,
        got,
    }
}

fn checked(value: f64) -> Result<f64, CalcError> {
    if value.is_nan() { Err(CalcError::Domain) } else { Ok(value) }
}

fn call(name: &str, args: &[f64]) -> Result<f64, CalcError> {
    let one = |f: fn(f64) -> f64| -> Result<f64, CalcError> {
        match args {
            [x] => checked(f(*x)),
            _ => Err(arity(name, "1", args.len())),
        }
    };
    let two = |f: fn(f64, f64) -> f64| -> Result<f64, CalcError> {
        match args {
            [x, y] => checked(f(*x, *y)),
            _ => Err(arity(name, "2", args.len())),
        }
    };

    match name {
        "sqrt" => match args {
            [x] if *x < 0.0 => Err(CalcError::Domain),
            _ => one(f64::sqrt),
        },
        "sin" => one(f64::sin),
        "cos" => one(f64::cos),
        "tan" => one(f64::tan),
        "asin" => one(f64::asin),
        "acos" => one(f64::acos),
        "atan" => one(f64::atan),
        "atan2" => two(f64::atan2),
        "exp" => one(f64::exp),
        "log" => match args {
            [x] if *x <= 0.0 => Err(CalcError::Domain),
            [x] => Ok(x.ln()),
            [x, base] if *x <= 0.0 || *base <= 0.0 || *base == 1.0 => Err(CalcError::Domain),
            [x, base] => Ok(x.ln() / base.ln()),
            _ => Err(arity(name, "1 or 2", args.len())),
        },
        "log10" | "log2" => match args {
            [x] if *x <= 0.0 => Err(CalcError::Domain),
            [x] if name == "log10" => Ok(x.log10()),
            [x] => Ok(x.log2()),
            _ => Err(arity(name, "1", args.len())),
        },
        "floor" => one(f64::floor),
        "ceil" => one(f64::ceil),
        "fabs" | "abs" => one(f64::abs),
        "round" => match args {
            [x] => Ok(x.round_ties_even()),
            [x, digits] => {
                let factor = 10f64.powi(digits.clamp(-400.0, 400.0) as i32);
                let scaled = x * factor;
                if factor == 0.0 {
                    Ok(0.0 * x.signum())
                } else if !factor.is_finite() || !scaled.is_finite() {
                    Ok(*x)
                } else {
                    Ok(scaled.round_ties_even() / factor)
                }
            }
            _ => Err(arity(name, "1 or 2", args.len())),
        },
        "pow" => two(f64::powf),
        "hypot" => two(f64::hypot),
        "factorial" => match args {
            [x] if *x < 0.0 || x.fract() != 0.0 || *x > 170.0 => Err(CalcError::Domain),
            [x] => Ok((1..=(*x as u64)).map(|n| n as f64).product()),
            _ => Err(arity(name, "1", args.len())),
        },
        "degrees" => one(f64::to_degrees),
        "radians" => one(f64::to_radians),
        _ => Err(CalcError::UnknownName(name.to_string())),
    }
}

/// Evaluates an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(token) => Err(CalcError::UnexpectedToken(token.text())),
    }
}

/// Integral values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &'static str {
        "Calculator"
    }

    fn description(&self) -> &'static str {
        "Performs arithmetic calculations. Input: a math expression such as 2*(3+4) or sqrt(16)."
    }

    async fn call(&self, input: &str, _ctx: &ToolContext) -> Result<String> {
        let expression = clean_input(input);
        Ok(match evaluate(&expression) {
            Ok(value) => format_number(value),
            Err(e) => format!("Calc error: {}", e),
        })
    }
}
