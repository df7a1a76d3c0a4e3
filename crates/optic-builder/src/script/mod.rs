//! Plan scripts
//!
//! A small expression language over the builder, used by the `optic` CLI:
//!
//! ```text
//! // comments run to the end of the line
//! let songs = op.fromView("main", "songs");
//! let hits  = op.fromLiterals({columnNames: ["id"], rowValues: [[1], [2]]});
//! songs.where(op.gt(songs.col("popularity"), 2))
//!      .joinInner(hits, op.on(songs.col("id"), hits.col("id")))
//!      .orderBy(op.desc("popularity"))
//! ```
//!
//! `ns.name(..)` calls a catalog function unless `ns` is a `let` binding, in
//! which case it is a method on that plan. `col` resolves a column against
//! the plan's source; every other method appends a stage.

mod ast;
mod eval;
mod parser;

pub use ast::{Args, Expr, Script, Statement};
pub use eval::Evaluator;
pub use parser::parse;

use crate::PlanError;
use optic_ir::{Plan, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid date literal: {0}")]
    InvalidDate(String),

    #[error("Unbound identifier: {0}")]
    Unbound(String),

    #[error("Cannot call .{method}() on {found}; only plans have methods")]
    NotAPlan { method: String, found: String },

    #[error("col() takes a single column name, got {0}")]
    ColumnName(String),

    #[error("Script has no result expression")]
    NoResult,

    #[error("Script evaluated to {0}, not a plan")]
    ResultNotAPlan(String),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Parse and evaluate `source`, returning the last expression's value.
pub fn evaluate(source: &str) -> Result<Value, ScriptError> {
    let script = parse(source)?;
    Evaluator::new().run(&script)
}

/// Like [`evaluate`], but the result must be a plan.
pub fn evaluate_plan(source: &str) -> Result<Plan, ScriptError> {
    match evaluate(source)? {
        Value::Plan(plan) => Ok(plan),
        other => Err(ScriptError::ResultNotAPlan(other.kind_name())),
    }
}
