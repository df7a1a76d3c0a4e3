//! `fn` namespace string functions

use crate::op::{positional, values};
use crate::PlanError;
use optic_ir::{Node, Value};

pub fn concat<V: Into<Value>>(parts: impl IntoIterator<Item = V>) -> Result<Node, PlanError> {
    positional("fn", "concat", values(parts))
}

pub fn upper_case(value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("fn", "upper-case", vec![value.into()])
}

pub fn lower_case(value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("fn", "lower-case", vec![value.into()])
}

pub fn string_length(value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("fn", "string-length", vec![value.into()])
}

pub fn contains(value: impl Into<Value>, search: impl Into<Value>) -> Result<Node, PlanError> {
    positional("fn", "contains", vec![value.into(), search.into()])
}

/// `length` may be null to take the rest of the string.
pub fn substring(
    value: impl Into<Value>,
    start: impl Into<Value>,
    length: impl Into<Value>,
) -> Result<Node, PlanError> {
    positional("fn", "substring", vec![value.into(), start.into(), length.into()])
}
