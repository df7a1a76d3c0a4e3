//! Optic plan value model
//!
//! Immutable operator nodes, argument values and the persistent plan
//! accumulator. Scalar expressions and pipeline stages share the same
//! `{namespace, operation, args}` node shape so one recursive exporter can
//! serialize both.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;

mod plan;
mod types;

pub use plan::Plan;
pub use types::TypeId;

/// Object value; iteration follows insertion order.
pub type ValueMap = indexmap::IndexMap<String, Value>;

/// An argument value: a literal, an operator node or a nested plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Map(ValueMap),
    Node(Node),
    Plan(Plan),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive scalar (string, number, boolean, date)
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Date(_)
                | Value::DateTime(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_plan(&self) -> Option<&Plan> {
        match self {
            Value::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    /// Short description of the value's shape, used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Int(_) => "integer".to_string(),
            Value::Float(_) => "double".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Date(_) => "date".to_string(),
            Value::DateTime(_) => "dateTime".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "object".to_string(),
            Value::Node(node) => format!("{}.{} node", node.namespace(), node.operation()),
            Value::Plan(_) => "plan".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "@{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "@{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Node(node) => write!(f, "{}", node),
            Value::Plan(plan) => write!(f, "{}", plan),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        Value::Node(node.clone())
    }
}

impl From<Plan> for Value {
    fn from(plan: Plan) -> Self {
        Value::Plan(plan)
    }
}

impl From<&Plan> for Value {
    fn from(plan: &Plan) -> Self {
        Value::Plan(plan.clone())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Immutable `{namespace, operation, args}` record.
///
/// Cloning is cheap; clones share the same allocation.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeData>,
}

#[derive(Debug, PartialEq)]
struct NodeData {
    namespace: String,
    operation: String,
    args: Vec<Value>,
    type_id: TypeId,
}

impl Node {
    /// Build a node from already-normalized arguments.
    pub fn new(
        namespace: impl Into<String>,
        operation: impl Into<String>,
        args: Vec<Value>,
        type_id: TypeId,
    ) -> Self {
        Self {
            inner: Arc::new(NodeData {
                namespace: namespace.into(),
                operation: operation.into(),
                args,
                type_id,
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    pub fn args(&self) -> &[Value] {
        &self.inner.args
    }

    pub fn arg(&self, position: usize) -> Option<&Value> {
        self.inner.args.get(position)
    }

    /// Ontology type of the value this node produces
    pub fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// True when both handles point at the same allocation
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner == other.inner
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("namespace", &self.inner.namespace)
            .field("operation", &self.inner.operation)
            .field("args", &self.inner.args)
            .field("type_id", &self.inner.type_id)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.namespace(), self.operation())?;
        write_joined(f, self.args())?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Node {
        Node::new("op", "col", vec![Value::from(name)], TypeId::new(7))
    }

    #[test]
    fn test_node_accessors() {
        let node = Node::new(
            "op",
            "gt",
            vec![Value::from(col("popularity")), Value::Int(2)],
            TypeId::new(3),
        );

        assert_eq!(node.namespace(), "op");
        assert_eq!(node.operation(), "gt");
        assert_eq!(node.args().len(), 2);
        assert_eq!(node.type_id(), TypeId::new(3));
        assert_eq!(node.to_string(), "op.gt(op.col(\"popularity\"), 2)");
    }

    #[test]
    fn test_node_clone_shares_allocation() {
        let a = col("id");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, col("id"));
        assert!(!a.ptr_eq(&col("id")));
    }

    #[test]
    fn test_option_and_vec_conversions() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("q")), Value::String("q".to_string()));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_primitive_classification() {
        assert!(Value::from("x").is_primitive());
        assert!(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).is_primitive());
        assert!(!Value::Null.is_primitive());
        assert!(!Value::from(col("x")).is_primitive());
        assert!(!Value::Map(ValueMap::new()).is_primitive());
    }
}
