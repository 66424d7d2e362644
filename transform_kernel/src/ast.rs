//! Rule-script AST — pure data, no evaluation logic.

use crate::value::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// Substring test: `needle in haystack`.
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(FieldValue),
    /// Invocation-local variable read.
    Var(String),
    /// Proxy field read: `binding.field`.
    Field { binding: String, field: String },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call { name: String, args: Vec<Expr> },
}

/// Assignment target: a local variable or a proxy field.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Local(String),
    Field { binding: String, field: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { target: Target, value: Expr },
    If {
        /// `if` plus any `else if` arms, in order.
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Vec<Stmt>,
    },
    Expr(Expr),
}
