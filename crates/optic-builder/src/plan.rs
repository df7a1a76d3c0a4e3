//! Fluent pipeline stages on [`Plan`]
//!
//! Each method returns a new plan; the receiver is never changed, so a base
//! plan can be shared and extended independently.

use crate::column::resolve_column;
use crate::PlanError;
use optic_export::WireDocument;
use optic_ir::{Node, Plan, Value};
use optic_registry::{CallArgs, FunctionCatalog, FunctionKind};

pub trait PlanExt {
    /// Append any stage or combinator by name.
    fn apply(&self, name: &str, args: CallArgs) -> Result<Plan, PlanError>;

    /// Column reference qualified by this plan's source accessor
    fn col(&self, column: &str) -> Result<Node, PlanError>;

    /// Serialize against the built-in ontology.
    fn export(&self) -> Result<WireDocument, PlanError>;

    /// The `where` stage
    fn filter(&self, condition: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("where", single(condition))
    }

    fn select(&self, columns: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("select", single(columns))
    }

    fn group_by(&self, keys: impl Into<Value>, aggregates: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("group-by", CallArgs::Positional(vec![keys.into(), aggregates.into()]))
    }

    fn order_by(&self, keys: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("order-by", single(keys))
    }

    fn offset(&self, start: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("offset", single(start))
    }

    fn limit(&self, length: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("limit", single(length))
    }

    fn offset_limit(&self, start: impl Into<Value>, length: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("offset-limit", CallArgs::Positional(vec![start.into(), length.into()]))
    }

    fn where_distinct(&self) -> Result<Plan, PlanError> {
        self.apply("where-distinct", CallArgs::none())
    }

    fn join_inner(&self, right: &Plan, keys: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("join-inner", CallArgs::Positional(vec![right.into(), keys.into()]))
    }

    fn join_left_outer(&self, right: &Plan, keys: impl Into<Value>) -> Result<Plan, PlanError> {
        self.apply("join-left-outer", CallArgs::Positional(vec![right.into(), keys.into()]))
    }

    fn join_cross_product(&self, right: &Plan) -> Result<Plan, PlanError> {
        self.apply("join-cross-product", single(right))
    }

    fn union(&self, right: &Plan) -> Result<Plan, PlanError> {
        self.apply("union", single(right))
    }

    fn intersect(&self, right: &Plan) -> Result<Plan, PlanError> {
        self.apply("intersect", single(right))
    }

    fn except(&self, right: &Plan) -> Result<Plan, PlanError> {
        self.apply("except", single(right))
    }
}

impl PlanExt for Plan {
    fn apply(&self, name: &str, args: CallArgs) -> Result<Plan, PlanError> {
        let catalog = FunctionCatalog::global();
        let decl = catalog.lookup("op", name)?;
        if !matches!(decl.kind, FunctionKind::Stage | FunctionKind::Combinator) {
            return Err(PlanError::NotAStage(decl.qualified_name()));
        }
        let node = catalog.invoke(decl, args)?;
        tracing::debug!(operation = node.operation(), stages = self.len() + 1, "appended stage");
        Ok(self.apply_stage(node))
    }

    fn col(&self, column: &str) -> Result<Node, PlanError> {
        resolve_column(self, column)
    }

    fn export(&self) -> Result<WireDocument, PlanError> {
        Ok(optic_export::export(self)?)
    }
}

fn single(value: impl Into<Value>) -> CallArgs {
    CallArgs::Single(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op;

    fn songs() -> Plan {
        op::from_view(None, "songs", None).unwrap()
    }

    #[test]
    fn test_stages_append_in_order() {
        let plan = songs()
            .filter(op::gt(op::col("popularity").unwrap(), 2).unwrap())
            .unwrap()
            .order_by(op::desc("popularity").unwrap())
            .unwrap()
            .limit(10)
            .unwrap();

        let ops: Vec<_> = plan.stages().into_iter().map(|s| s.operation()).collect();
        assert_eq!(ops, vec!["from-view", "where", "order-by", "limit"]);
    }

    #[test]
    fn test_base_plan_is_unchanged() {
        let base = songs();
        let a = base.limit(1).unwrap();
        let b = base.where_distinct().unwrap();

        assert_eq!(base.len(), 1);
        assert_eq!(a.last().operation(), "limit");
        assert_eq!(b.last().operation(), "where-distinct");
        assert!(a.extends(&base) && b.extends(&base));
    }

    #[test]
    fn test_apply_rejects_non_stages() {
        let err = songs().apply("col", CallArgs::Single("id".into())).unwrap_err();
        assert!(matches!(err, PlanError::NotAStage(name) if name == "op.col"));

        let err = songs().apply("fromView", CallArgs::Single("x".into())).unwrap_err();
        assert!(matches!(err, PlanError::NotAStage(_)));
    }

    #[test]
    fn test_join_requires_plan() {
        let err = songs()
            .apply("join-inner", CallArgs::Single("albums".into()))
            .unwrap_err();
        assert_eq!(err.argument_error().unwrap().parameter(), Some("right"));
    }

    #[test]
    fn test_row_counts_accept_bind_parameters() {
        let plan = songs()
            .offset_limit(op::param("start").unwrap(), op::param("length").unwrap())
            .unwrap()
            .limit(op::param("cap").unwrap())
            .unwrap();

        let doc = plan.export().unwrap();
        let limit = &doc.operators()["args"][2];
        assert_eq!(limit["operation"], "limit");
        assert_eq!(limit["args"][0]["operation"], "param");
        assert_eq!(limit["args"][0]["args"][0], "cap");

        let err = songs().limit(op::col("n").unwrap()).unwrap_err();
        assert!(err.argument_error().is_some());
    }

    #[test]
    fn test_offset_limit_skips_missing_start() {
        let plan = songs()
            .apply("offsetLimit", CallArgs::Positional(vec![Value::Null, Value::Int(20)]))
            .unwrap();
        assert_eq!(plan.last().args(), &[Value::Null, Value::Int(20)]);
    }
}
