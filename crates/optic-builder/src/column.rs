//! Column access relative to a plan's source accessor
//!
//! The same column name resolves to a different reference depending on
//! which accessor started the plan and whether it was given a qualifier:
//!
//! | source                                           | qualifier | reference                          |
//! |--------------------------------------------------|-----------|------------------------------------|
//! | `from-view`                                      | absent    | `schema-col(schema, view, column)` |
//! | `from-view`                                      | present   | `view-col(qualifier, column)`      |
//! | `from-lexicons`, `from-literals`, `from-triples` | present   | `view-col(qualifier, column)`      |
//! | anything else                                    |           | `col(column)`                      |

use crate::op;
use crate::PlanError;
use optic_ir::{Node, Plan, Value};
use optic_registry::FunctionCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnForm {
    /// `{schema, view, column}`
    Schema,
    /// `{qualifier, column}`
    Qualified,
    /// `{column}`
    Bare,
}

pub fn column_form(plan: &Plan) -> ColumnForm {
    let source = plan.source();
    match (source.operation(), qualifier(source).is_some()) {
        ("from-view", false) => ColumnForm::Schema,
        ("from-view", true) => ColumnForm::Qualified,
        ("from-lexicons" | "from-literals" | "from-triples", true) => ColumnForm::Qualified,
        _ => ColumnForm::Bare,
    }
}

/// Resolve `column` against the plan's source accessor.
pub fn resolve_column(plan: &Plan, column: &str) -> Result<Node, PlanError> {
    let source = plan.source();
    let node = match column_form(plan) {
        ColumnForm::Schema => op::schema_col(
            source.arg(0).and_then(Value::as_str),
            source.arg(1).and_then(Value::as_str).unwrap_or_default(),
            column,
        )?,
        ColumnForm::Qualified => op::view_col(
            qualifier(source).and_then(Value::as_str).unwrap_or_default(),
            column,
        )?,
        ColumnForm::Bare => op::col(column)?,
    };
    tracing::trace!(source = source.operation(), column, reference = node.operation(), "resolved column");
    Ok(node)
}

fn qualifier(source: &Node) -> Option<&Value> {
    let decl = FunctionCatalog::global()
        .lookup(source.namespace(), source.operation())
        .ok()?;
    let position = decl.signature.position_of("qualifier")?;
    source.arg(position).filter(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanExt;

    #[test]
    fn test_view_without_qualifier() {
        let plan = op::from_view(Some("main"), "songs", None).unwrap();
        assert_eq!(column_form(&plan), ColumnForm::Schema);

        let node = resolve_column(&plan, "id").unwrap();
        assert_eq!(node.operation(), "schema-col");
        assert_eq!(
            node.args(),
            &[Value::from("main"), Value::from("songs"), Value::from("id")]
        );
    }

    #[test]
    fn test_view_without_schema() {
        let plan = op::from_view(None, "songs", None).unwrap();
        let node = resolve_column(&plan, "id").unwrap();
        assert_eq!(node.args(), &[Value::Null, Value::from("songs"), Value::from("id")]);
    }

    #[test]
    fn test_view_with_qualifier() {
        let plan = op::from_view(Some("main"), "songs", Some("s")).unwrap();
        let node = resolve_column(&plan, "id").unwrap();
        assert_eq!(node.operation(), "view-col");
        assert_eq!(node.args(), &[Value::from("s"), Value::from("id")]);
    }

    #[test]
    fn test_literals_depend_on_qualifier() {
        let rows = op::literal_rows(&["id"], vec![vec![Value::Int(1)]]);
        let bare = op::from_literals(rows.clone(), None).unwrap();
        let qualified = op::from_literals(rows, Some("lit")).unwrap();

        assert_eq!(resolve_column(&bare, "id").unwrap().operation(), "col");
        assert_eq!(resolve_column(&qualified, "id").unwrap().operation(), "view-col");
    }

    #[test]
    fn test_sql_is_always_bare() {
        let plan = op::from_sql("SELECT * FROM songs", Some("q")).unwrap();
        assert_eq!(column_form(&plan), ColumnForm::Bare);
        assert_eq!(resolve_column(&plan, "id").unwrap().to_string(), r#"op.col("id")"#);
    }

    #[test]
    fn test_resolution_follows_source_after_stages() {
        let plan = op::from_view(None, "songs", Some("s"))
            .unwrap()
            .limit(5)
            .unwrap();
        assert_eq!(column_form(&plan), ColumnForm::Qualified);
    }
}
