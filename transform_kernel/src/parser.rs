//! Rule-script parser — recursive descent over the token stream.
//!
//! Grammar sketch:
//!   program   := stmt*
//!   stmt      := if_stmt | assign | expr
//!   if_stmt   := "if" expr block ("else" "if" expr block)* ("else" block)?
//!   assign    := (ident | ident "." ident) "=" expr
//!   expr      := or
//!   or        := and ("||" and)*
//!   and       := cmp ("&&" cmp)*
//!   cmp       := add (("=="|"!="|"<"|"<="|">"|">="|"in") add)*
//!   add       := mul (("+"|"-") mul)*
//!   mul       := unary (("*"|"/"|"%") unary)*
//!   unary     := ("!"|"-") unary | postfix
//!   postfix   := ident "." ident | ident "(" args ")" | primary
//!
//! Statements are newline-free: juxtaposition is never valid inside an
//! expression, so statement boundaries need no separator. Stray
//! semicolons are accepted and skipped.

use crate::ast::{BinaryOp, Expr, Stmt, Target, UnaryOp};
use crate::error::ScriptError;
use crate::lexer::Token;
use crate::value::FieldValue;

/// Parse a full script into a statement list.
pub fn parse(tokens: &[(Token, u32)]) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program(false)
}

fn parse_err(line: u32, message: impl Into<String>) -> ScriptError {
    ScriptError::Parse {
        line,
        message: message.into(),
    }
}

struct Parser<'a> {
    tokens: &'a [(Token, u32)],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos).map(|(t, _)| t);
        self.pos += 1;
        t
    }

    /// Line of the current token, or of the last token at end of input.
    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ScriptError> {
        let line = self.line();
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(parse_err(line, format!("expected {}, got {:?}", what, t))),
            None => Err(parse_err(line, format!("expected {}, got end of script", what))),
        }
    }

    /// Parse statements until end of input, or until `}` when inside a
    /// block (the brace is left for the caller).
    fn parse_program(&mut self, in_block: bool) -> Result<Vec<Stmt>, ScriptError> {
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(Token::RBrace) if in_block => break,
                Some(Token::Semi) => {
                    self.next();
                }
                Some(_) => stmts.push(self.parse_stmt()?),
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ScriptError> {
        if self.peek() == Some(&Token::If) {
            return self.parse_if();
        }
        if self.peek() == Some(&Token::Else) {
            return Err(parse_err(self.line(), "else without a preceding if"));
        }

        let line = self.line();
        let expr = self.parse_expr()?;
        if self.peek() == Some(&Token::Assign) {
            self.next();
            let target = match expr {
                Expr::Var(name) => Target::Local(name),
                Expr::Field { binding, field } => Target::Field { binding, field },
                _ => {
                    return Err(parse_err(
                        line,
                        "assignment target must be a variable or binding.field",
                    ))
                }
            };
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { target, value });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_if(&mut self) -> Result<Stmt, ScriptError> {
        self.expect(&Token::If, "if")?;
        let mut branches = Vec::new();
        let cond = self.parse_expr()?;
        branches.push((cond, self.parse_block()?));

        let mut else_body = Vec::new();
        while self.peek() == Some(&Token::Else) {
            self.next();
            if self.peek() == Some(&Token::If) {
                self.next();
                let cond = self.parse_expr()?;
                branches.push((cond, self.parse_block()?));
            } else {
                else_body = self.parse_block()?;
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            else_body,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(&Token::LBrace, "{")?;
        let body = self.parse_program(true)?;
        self.expect(&Token::RBrace, "}")?;
        Ok(body)
    }

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_cmp()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            let right = self.parse_cmp()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::In) => BinaryOp::In,
                _ => break,
            };
            self.next();
            let right = self.parse_add()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.parse_mul()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.next();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.next();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ScriptError> {
        let line = self.line();
        match self.next().cloned() {
            Some(Token::Int(n)) => Ok(Expr::Literal(FieldValue::Int(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(FieldValue::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(FieldValue::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(FieldValue::Bool(false))),
            Some(Token::Unset) => Ok(Expr::Literal(FieldValue::Unset)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, ")")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match self.peek() {
                Some(Token::Dot) => {
                    self.next();
                    let line = self.line();
                    match self.next().cloned() {
                        Some(Token::Ident(field)) => Ok(Expr::Field {
                            binding: name,
                            field,
                        }),
                        other => Err(parse_err(
                            line,
                            format!("expected field name after '.', got {:?}", other),
                        )),
                    }
                }
                Some(Token::LParen) => {
                    self.next();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            match self.peek() {
                                Some(Token::Comma) => {
                                    self.next();
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(&Token::RParen, ")")?;
                    Ok(Expr::Call { name, args })
                }
                _ => Ok(Expr::Var(name)),
            },
            Some(other) => Err(parse_err(
                line,
                format!("unexpected token {:?} in expression", other),
            )),
            None => Err(parse_err(line, "unexpected end of script in expression")),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
