//! `cts` namespace: lexicon references and search queries

use crate::op::positional;
use crate::PlanError;
use optic_ir::{Node, Value};

pub fn element_reference(name: &str) -> Result<Node, PlanError> {
    positional("cts", "element-reference", vec![name.into()])
}

pub fn json_property_reference(name: &str) -> Result<Node, PlanError> {
    positional("cts", "json-property-reference", vec![name.into()])
}

/// `text` is one phrase or a list of alternatives.
pub fn word_query(text: impl Into<Value>) -> Result<Node, PlanError> {
    positional("cts", "word-query", vec![text.into()])
}
