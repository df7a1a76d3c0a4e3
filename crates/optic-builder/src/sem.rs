//! `sem` namespace

use crate::op::positional;
use crate::PlanError;
use optic_ir::Node;

pub fn iri(value: &str) -> Result<Node, PlanError> {
    positional("sem", "iri", vec![value.into()])
}
