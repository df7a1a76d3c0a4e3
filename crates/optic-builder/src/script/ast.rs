//! Script syntax tree

use optic_ir::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, expr: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalar literal, dates included
    Literal(Value),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    /// `target.method(args)`; `op.gt(..)` and `plan.where(..)` share this form
    Call {
        target: Box<Expr>,
        method: String,
        args: Args,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Args {
    Positional(Vec<Expr>),
    Named(Vec<(String, Expr)>),
}
