//! `op` namespace: source accessors, column references and the operator
//! expressions used inside pipeline stages.
//!
//! Every helper normalizes its arguments against the catalog signature, so a
//! wrong type or count fails here rather than on the server.

use crate::PlanError;
use optic_ir::{Node, Plan, Value, ValueMap};
use optic_registry::{CallArgs, FunctionCatalog, FunctionKind};

/// Build any expression node by namespace and name.
pub fn call(namespace: &str, name: &str, args: CallArgs) -> Result<Node, PlanError> {
    let catalog = FunctionCatalog::global();
    let decl = catalog.lookup(namespace, name)?;
    if decl.kind != FunctionKind::Expression {
        return Err(PlanError::NotAnExpression(decl.qualified_name()));
    }
    Ok(catalog.invoke(decl, args)?)
}

/// Start a plan with any `op` source accessor.
pub fn source(name: &str, args: CallArgs) -> Result<Plan, PlanError> {
    let catalog = FunctionCatalog::global();
    let decl = catalog.lookup("op", name)?;
    if decl.kind != FunctionKind::Source {
        return Err(PlanError::NotASource(decl.qualified_name()));
    }
    let node = catalog.invoke(decl, args)?;
    tracing::debug!(operation = node.operation(), "started plan");
    Ok(Plan::new(node))
}

pub(crate) fn positional(namespace: &str, name: &str, args: Vec<Value>) -> Result<Node, PlanError> {
    call(namespace, name, CallArgs::Positional(args))
}

pub(crate) fn values<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Vec<Value> {
    items.into_iter().map(Into::into).collect()
}

// Sources

pub fn from_view(schema: Option<&str>, view: &str, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-view",
        CallArgs::Positional(vec![schema.into(), view.into(), qualifier.into()]),
    )
}

/// `rows` is either a list of row objects or a [`literal_rows`] pair.
pub fn from_literals(rows: impl Into<Value>, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-literals",
        CallArgs::Positional(vec![rows.into(), qualifier.into()]),
    )
}

/// `indexes` maps output column names to lexicon references.
pub fn from_lexicons(indexes: ValueMap, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-lexicons",
        CallArgs::Positional(vec![Value::Map(indexes), qualifier.into()]),
    )
}

pub fn from_triples(patterns: impl Into<Value>, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-triples",
        CallArgs::Positional(vec![patterns.into(), qualifier.into()]),
    )
}

pub fn from_sparql(select: &str, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-sparql",
        CallArgs::Positional(vec![select.into(), qualifier.into()]),
    )
}

pub fn from_sql(select: &str, qualifier: Option<&str>) -> Result<Plan, PlanError> {
    source(
        "from-sql",
        CallArgs::Positional(vec![select.into(), qualifier.into()]),
    )
}

/// `{columnNames, rowValues}` pair for [`from_literals`]
pub fn literal_rows(column_names: &[&str], rows: Vec<Vec<Value>>) -> Value {
    let mut pair = ValueMap::new();
    pair.insert("columnNames".to_string(), Value::from(column_names.to_vec()));
    pair.insert(
        "rowValues".to_string(),
        Value::List(rows.into_iter().map(Value::List).collect()),
    );
    Value::Map(pair)
}

// Columns

pub fn col(column: &str) -> Result<Node, PlanError> {
    positional("op", "col", vec![column.into()])
}

pub fn view_col(view: &str, column: &str) -> Result<Node, PlanError> {
    positional("op", "view-col", vec![view.into(), column.into()])
}

pub fn schema_col(schema: Option<&str>, view: &str, column: &str) -> Result<Node, PlanError> {
    positional("op", "schema-col", vec![schema.into(), view.into(), column.into()])
}

pub fn fragment_id_col(column: &str) -> Result<Node, PlanError> {
    positional("op", "fragment-id-col", vec![column.into()])
}

/// Bind `expression` to a new column name.
pub fn as_(column: &str, expression: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "as", vec![column.into(), expression.into()])
}

pub fn param(name: &str) -> Result<Node, PlanError> {
    positional("op", "param", vec![name.into()])
}

macro_rules! binary {
    ($($name:ident => $operation:literal),* $(,)?) => {
        $(
            pub fn $name(left: impl Into<Value>, right: impl Into<Value>) -> Result<Node, PlanError> {
                positional("op", $operation, vec![left.into(), right.into()])
            }
        )*
    };
}

binary! {
    eq => "eq",
    ne => "ne",
    lt => "lt",
    le => "le",
    gt => "gt",
    ge => "ge",
    subtract => "subtract",
    divide => "divide",
    modulo => "modulo",
    on => "on",
}

pub fn and<V: Into<Value>>(conditions: impl IntoIterator<Item = V>) -> Result<Node, PlanError> {
    positional("op", "and", values(conditions))
}

pub fn or<V: Into<Value>>(conditions: impl IntoIterator<Item = V>) -> Result<Node, PlanError> {
    positional("op", "or", values(conditions))
}

pub fn not(condition: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "not", vec![condition.into()])
}

pub fn is_defined(column: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "is-defined", vec![column.into()])
}

pub fn add<V: Into<Value>>(operands: impl IntoIterator<Item = V>) -> Result<Node, PlanError> {
    positional("op", "add", values(operands))
}

pub fn multiply<V: Into<Value>>(operands: impl IntoIterator<Item = V>) -> Result<Node, PlanError> {
    positional("op", "multiply", values(operands))
}

pub fn asc(column: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "asc", vec![column.into()])
}

pub fn desc(column: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "desc", vec![column.into()])
}

// Aggregates

/// Row count when `column` is null, otherwise the count of its values.
pub fn count(name: &str, column: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "count", vec![name.into(), column.into()])
}

macro_rules! aggregate {
    ($($name:ident => $operation:literal),* $(,)?) => {
        $(
            pub fn $name(name: &str, column: impl Into<Value>) -> Result<Node, PlanError> {
                positional("op", $operation, vec![name.into(), column.into()])
            }
        )*
    };
}

aggregate! {
    sum => "sum",
    avg => "avg",
    min => "min",
    max => "max",
    array_aggregate => "array-aggregate",
}

pub fn group_concat(
    name: &str,
    column: impl Into<Value>,
    options: impl Into<Value>,
) -> Result<Node, PlanError> {
    positional("op", "group-concat", vec![name.into(), column.into(), options.into()])
}

pub fn pattern(
    subjects: impl Into<Value>,
    predicates: impl Into<Value>,
    objects: impl Into<Value>,
) -> Result<Node, PlanError> {
    positional(
        "op",
        "pattern",
        vec![subjects.into(), predicates.into(), objects.into()],
    )
}

// XML node constructors

pub fn xml_document(root: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "xml-document", vec![root.into()])
}

pub fn xml_element(
    name: &str,
    attributes: impl Into<Value>,
    content: impl Into<Value>,
) -> Result<Node, PlanError> {
    positional(
        "op",
        "xml-element",
        vec![name.into(), attributes.into(), content.into()],
    )
}

pub fn xml_attribute(name: &str, value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "xml-attribute", vec![name.into(), value.into()])
}

pub fn xml_text(value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "xml-text", vec![value.into()])
}

pub fn xml_comment(value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "xml-comment", vec![value.into()])
}

pub fn xml_pi(name: &str, value: impl Into<Value>) -> Result<Node, PlanError> {
    positional("op", "xml-pi", vec![name.into(), value.into()])
}
