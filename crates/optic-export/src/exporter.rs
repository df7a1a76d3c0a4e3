//! Plan → wire document exporter
//!
//! One recursive walk serializes both expressions and pipeline stages as
//! `{namespace, operation, args}`. A few operations need a different
//! treatment of their arguments; those are listed in [`STRATEGIES`].

use crate::document::WireDocument;
use chrono::SecondsFormat;
use optic_ir::{Node, Plan, Value, ValueMap};
use optic_registry::{OntologyError, TypeRegistry};
use serde_json::{Map, Number, Value as Json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("Malformed operator node: {0}")]
    MalformedNode(String),

    #[error("{operation}: row {row} has {values} values but only {columns} column names")]
    RowTooLong {
        operation: String,
        row: usize,
        values: usize,
        columns: usize,
    },

    #[error("{operation}: malformed literal rows: {reason}")]
    MalformedRows { operation: String, reason: String },

    #[error("{operation}: argument {position} must be a nested plan, got {found}")]
    ExpectedPlan {
        operation: String,
        position: usize,
        found: String,
    },

    #[error("Cannot export non-finite number {0}")]
    NonFiniteNumber(f64),

    #[error("{operation}: {source}")]
    UnregisteredType {
        operation: String,
        #[source]
        source: OntologyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// `{namespace, operation, args}` with recursively exported args
    Default,
    /// First argument is a row list or a `{columnNames, rowValues}` pair
    LiteralTable,
    /// First argument is a right-hand plan exported as its own operator list
    NestedPlan,
}

pub const STRATEGIES: &[(&str, ExportStrategy)] = &[
    ("from-literals", ExportStrategy::LiteralTable),
    ("join-inner", ExportStrategy::NestedPlan),
    ("join-left-outer", ExportStrategy::NestedPlan),
    ("join-cross-product", ExportStrategy::NestedPlan),
    ("union", ExportStrategy::NestedPlan),
    ("intersect", ExportStrategy::NestedPlan),
    ("except", ExportStrategy::NestedPlan),
];

// The server still spells the processing-instruction constructor this way.
const RENAMES: &[(&str, &str)] = &[("xml-pi", "xml-PI")];

pub fn strategy_for(operation: &str) -> ExportStrategy {
    STRATEGIES
        .iter()
        .find(|(name, _)| *name == operation)
        .map_or(ExportStrategy::Default, |(_, strategy)| *strategy)
}

/// Operation name as written on the wire
pub fn wire_operation(operation: &str) -> &str {
    RENAMES
        .iter()
        .find(|(name, _)| *name == operation)
        .map_or(operation, |(_, renamed)| renamed)
}

pub struct Exporter<'a> {
    types: &'a TypeRegistry,
}

impl<'a> Exporter<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self { types }
    }

    /// Export the full stage list under the document root
    pub fn export(&self, plan: &Plan) -> Result<WireDocument, ExportError> {
        let document = WireDocument::new(self.export_operators(plan)?);
        tracing::debug!(stages = plan.len(), fingerprint = %document.fingerprint(), "exported plan");
        Ok(document)
    }

    /// `{"namespace":"op","operation":"operators","args":[<stage>, ...]}`
    pub fn export_operators(&self, plan: &Plan) -> Result<Json, ExportError> {
        let stages = plan
            .stages()
            .into_iter()
            .map(|stage| self.export_node(stage))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(node_json("op", "operators", stages))
    }

    pub fn export_node(&self, node: &Node) -> Result<Json, ExportError> {
        if node.namespace().is_empty() || node.operation().is_empty() {
            return Err(ExportError::MalformedNode(format!(
                "missing namespace or operation in {}",
                node
            )));
        }
        self.types
            .descriptor(node.type_id())
            .map_err(|source| ExportError::UnregisteredType {
                operation: node.operation().to_string(),
                source,
            })?;

        let args = match strategy_for(node.operation()) {
            ExportStrategy::Default => self.export_args(node.args())?,
            ExportStrategy::LiteralTable => self.export_literal_table(node)?,
            ExportStrategy::NestedPlan => self.export_nested_plan(node)?,
        };
        Ok(node_json(node.namespace(), wire_operation(node.operation()), args))
    }

    /// Serialize an argument list.
    ///
    /// `[]` and `[null]` become `[]`; a single list argument is flattened
    /// into the argument list; anything else exports element-wise.
    pub fn export_args(&self, args: &[Value]) -> Result<Vec<Json>, ExportError> {
        match args {
            [] | [Value::Null] => Ok(Vec::new()),
            [Value::List(items)] => self.export_args(items),
            items => items.iter().map(|item| self.export_value(item)).collect(),
        }
    }

    pub fn export_value(&self, value: &Value) -> Result<Json, ExportError> {
        Ok(match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(x) => Json::Number(Number::from_f64(*x).ok_or(ExportError::NonFiniteNumber(*x))?),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(items) => match items.as_slice() {
                [single] if !single.is_null() => self.export_value(single)?,
                _ => Json::Array(self.export_args(items)?),
            },
            Value::Map(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, item) in map {
                    object.insert(key.clone(), self.export_value(item)?);
                }
                Json::Object(object)
            }
            Value::Node(node) => self.export_node(node)?,
            Value::Plan(plan) => self.export_operators(plan)?,
        })
    }

    fn export_literal_table(&self, node: &Node) -> Result<Vec<Json>, ExportError> {
        let operation = node.operation();
        let (first, rest) = node
            .args()
            .split_first()
            .ok_or_else(|| malformed_rows(operation, "missing rows argument"))?;

        let rows = match first {
            Value::List(rows) => {
                if let Some(bad) = rows.iter().find(|row| row.as_map().is_none()) {
                    return Err(malformed_rows(
                        operation,
                        &format!("expected a row object, got {}", bad.kind_name()),
                    ));
                }
                rows.clone()
            }
            Value::Map(pair) => zip_rows(operation, pair)?,
            other => {
                return Err(malformed_rows(
                    operation,
                    &format!("expected rows, got {}", other.kind_name()),
                ))
            }
        };

        let mut args = Vec::with_capacity(node.args().len());
        args.push(Value::List(rows));
        args.extend(rest.iter().cloned());
        self.export_args(&args)
    }

    fn export_nested_plan(&self, node: &Node) -> Result<Vec<Json>, ExportError> {
        match node.arg(0) {
            Some(Value::Plan(_)) => self.export_args(node.args()),
            other => Err(ExportError::ExpectedPlan {
                operation: node.operation().to_string(),
                position: 0,
                found: other.map_or_else(|| "nothing".to_string(), Value::kind_name),
            }),
        }
    }
}

/// Zip each `rowValues` entry against `columnNames`.
///
/// Short rows leave their missing columns out; long rows are an error.
fn zip_rows(operation: &str, pair: &ValueMap) -> Result<Vec<Value>, ExportError> {
    let names = pair
        .get("columnNames")
        .and_then(Value::as_list)
        .ok_or_else(|| malformed_rows(operation, "columnNames must be a list"))?
        .iter()
        .map(|name| {
            name.as_str()
                .ok_or_else(|| malformed_rows(operation, "column names must be strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let row_values = pair
        .get("rowValues")
        .and_then(Value::as_list)
        .ok_or_else(|| malformed_rows(operation, "rowValues must be a list"))?;

    let mut rows = Vec::with_capacity(row_values.len());
    for (row, values) in row_values.iter().enumerate() {
        let values = values
            .as_list()
            .ok_or_else(|| malformed_rows(operation, "each rowValues entry must be a list"))?;
        if values.len() > names.len() {
            return Err(ExportError::RowTooLong {
                operation: operation.to_string(),
                row,
                values: values.len(),
                columns: names.len(),
            });
        }
        let mapped: ValueMap = names
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        rows.push(Value::Map(mapped));
    }
    Ok(rows)
}

fn malformed_rows(operation: &str, reason: &str) -> ExportError {
    ExportError::MalformedRows {
        operation: operation.to_string(),
        reason: reason.to_string(),
    }
}

fn node_json(namespace: &str, operation: &str, args: Vec<Json>) -> Json {
    let mut object = Map::with_capacity(3);
    object.insert("namespace".to_string(), Json::String(namespace.to_string()));
    object.insert("operation".to_string(), Json::String(operation.to_string()));
    object.insert("args".to_string(), Json::Array(args));
    Json::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use optic_ir::TypeId;
    use serde_json::json;

    fn exporter() -> Exporter<'static> {
        Exporter::new(TypeRegistry::global())
    }

    fn ty(name: &str) -> TypeId {
        TypeRegistry::global().id(name).unwrap()
    }

    fn col(name: &str) -> Node {
        Node::new("op", "col", vec![Value::from(name)], ty("PlanColumn"))
    }

    fn row_pair(names: &[&str], rows: Vec<Vec<i64>>) -> Value {
        Value::Map(ValueMap::from([
            ("columnNames".to_string(), Value::from(names.to_vec())),
            (
                "rowValues".to_string(),
                Value::List(rows.into_iter().map(Value::from).collect()),
            ),
        ]))
    }

    #[test]
    fn test_empty_and_null_args() {
        let e = exporter();
        assert_eq!(e.export_args(&[]).unwrap(), Vec::<Json>::new());
        assert_eq!(e.export_args(&[Value::Null]).unwrap(), Vec::<Json>::new());
        assert_eq!(e.export_value(&Value::List(vec![])).unwrap(), json!([]));
        assert_eq!(e.export_value(&Value::List(vec![Value::Null])).unwrap(), json!([]));
    }

    #[test]
    fn test_singleton_unwrap() {
        let e = exporter();
        for x in [Value::Int(4), Value::from("a"), Value::from(col("id"))] {
            assert_eq!(
                e.export_args(&[Value::List(vec![x.clone()])]).unwrap(),
                e.export_args(&[x.clone()]).unwrap()
            );
            assert_eq!(
                e.export_value(&Value::List(vec![x.clone()])).unwrap(),
                e.export_value(&x).unwrap()
            );
        }
    }

    #[test]
    fn test_mapping_exports_as_object() {
        let value = Value::Map(ValueMap::from([
            ("separator".to_string(), Value::from(", ")),
            ("key".to_string(), Value::from(col("k"))),
        ]));
        assert_eq!(
            exporter().export_value(&value).unwrap(),
            json!({
                "separator": ", ",
                "key": {"namespace": "op", "operation": "col", "args": ["k"]}
            })
        );
    }

    #[test]
    fn test_row_zipping() {
        let node = Node::new(
            "op",
            "from-literals",
            vec![row_pair(&["a", "b"], vec![vec![1, 2], vec![3, 4]])],
            ty("PlanPlan"),
        );
        let exported = exporter().export_node(&node).unwrap();
        assert_eq!(exported["args"], json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]));
    }

    #[test]
    fn test_short_rows_omit_missing_columns() {
        let node = Node::new(
            "op",
            "from-literals",
            vec![row_pair(&["a", "b"], vec![vec![1], vec![3, 4]])],
            ty("PlanPlan"),
        );
        let exported = exporter().export_node(&node).unwrap();
        assert_eq!(exported["args"], json!([{"a": 1}, {"a": 3, "b": 4}]));
    }

    #[test]
    fn test_row_too_long() {
        let node = Node::new(
            "op",
            "from-literals",
            vec![row_pair(&["a", "b"], vec![vec![1, 2, 3]])],
            ty("PlanPlan"),
        );
        assert_eq!(
            exporter().export_node(&node).unwrap_err(),
            ExportError::RowTooLong {
                operation: "from-literals".to_string(),
                row: 0,
                values: 3,
                columns: 2,
            }
        );
    }

    #[test]
    fn test_literal_rows_with_qualifier() {
        let rows = Value::List(vec![
            Value::Map(ValueMap::from([("a".to_string(), Value::Int(1))])),
            Value::Map(ValueMap::from([("a".to_string(), Value::Int(2))])),
        ]);
        let node = Node::new("op", "from-literals", vec![rows, Value::from("t")], ty("PlanPlan"));
        let exported = exporter().export_node(&node).unwrap();
        assert_eq!(exported["args"], json!([[{"a": 1}, {"a": 2}], "t"]));
    }

    #[test]
    fn test_processing_instruction_rename() {
        let pi = Node::new(
            "op",
            "xml-pi",
            vec![Value::from("xml-stylesheet"), Value::from("href=\"a.css\"")],
            ty("processing-instruction-node"),
        );
        let exported = exporter().export_node(&pi).unwrap();
        assert_eq!(exported["operation"], "xml-PI");
        assert_eq!(wire_operation("xml-element"), "xml-element");
    }

    #[test]
    fn test_malformed_nodes_are_rejected() {
        let unnamed = Node::new("op", "", vec![], ty("PlanColumn"));
        assert!(matches!(
            exporter().export_node(&unnamed),
            Err(ExportError::MalformedNode(_))
        ));

        let stray = Node::new("op", "col", vec![], TypeId::new(10_000));
        assert!(matches!(
            exporter().export_node(&stray),
            Err(ExportError::UnregisteredType { .. })
        ));

        let join = Node::new("op", "join-inner", vec![Value::from("not a plan")], ty("PlanPlan"));
        assert!(matches!(
            exporter().export_node(&join),
            Err(ExportError::ExpectedPlan { position: 0, .. })
        ));
    }

    #[test]
    fn test_non_finite_float() {
        assert_eq!(
            exporter().export_value(&Value::Float(f64::NAN)).unwrap_err().to_string(),
            "Cannot export non-finite number NaN"
        );
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(strategy_for("from-literals"), ExportStrategy::LiteralTable);
        assert_eq!(strategy_for("union"), ExportStrategy::NestedPlan);
        assert_eq!(strategy_for("where"), ExportStrategy::Default);
    }
}
