//! The typed syntax tree the front-end consumes.
//!
//! This crate does not parse source text into this shape — that is the job
//! of the (external) syntax tree producer named in the scope notes. These
//! types are the contract: a single function declaration, annotated
//! parameters, and a body of assignments terminated by one return.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Assign { name: String, value: Expr, line: u32 },
    Return { value: Expr, line: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Constant(f64, u32),
    Name(String, u32),
    BinOp {
        left: Box<Expr>,
        op: BinOpKind,
        right: Box<Expr>,
        line: u32,
    },
}

impl Expr {
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Expr::Constant(_, line) | Expr::Name(_, line) => *line,
            Expr::BinOp { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOpKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
        }
    }
}
