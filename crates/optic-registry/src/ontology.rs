//! Type ontology registry
//!
//! Types are declared with their direct parents; each type's ancestor set is
//! the transitive closure over those parents, computed once when the type is
//! declared. Parents must already be declared, so the graph is acyclic by
//! construction and a type may still have several parents.

use optic_ir::{TypeId, Value};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Type given to nested plans passed as arguments
pub const PLAN_TYPE: &str = "PlanPlan";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    #[error("Type already declared: {0}")]
    DuplicateType(String),

    #[error("Type {name} declares unknown parent {parent}")]
    UnknownParent { name: String, parent: String },

    #[error("Unknown type name: {0}")]
    UnknownType(String),

    #[error("Type {0} has no ancestry in this ontology")]
    UnregisteredType(TypeId),
}

/// How values are checked against a parameter of this type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Accepts raw primitive literals as well as nodes of a descendant type
    Atomic,
    /// Accepts only node values whose ancestry contains this type
    Structured,
    /// Skips the ontology check; the value's shape is validated instead
    Opaque(Shape),
}

/// Shape rules for opaque structured option types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Literal rows: a list of row mappings, or `{columnNames, rowValues}`
    RowSet,
    /// Non-empty mapping from names to nodes of `value_type`
    ReferenceMap { value_type: TypeId },
    /// Mapping restricted to the given keys with primitive values
    OptionSet { keys: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub parents: Vec<TypeId>,
    pub kind: TypeKind,
    ancestors: HashSet<TypeId>,
}

impl TypeDescriptor {
    /// Every type this type satisfies, itself included
    pub fn ancestors(&self) -> &HashSet<TypeId> {
        &self.ancestors
    }

    pub fn accepts_literals(&self) -> bool {
        self.kind == TypeKind::Atomic
    }

    /// Multi-valued structural types take a list as one argument value
    pub fn accepts_list(&self) -> bool {
        matches!(self.kind, TypeKind::Opaque(Shape::RowSet))
    }

    /// Opaque types that take a mapping as one argument value
    pub fn accepts_map(&self) -> bool {
        matches!(self.kind, TypeKind::Opaque(_))
    }
}

/// Immutable catalog of named types
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
    plan_type: Option<TypeId>,
}

static GLOBAL: LazyLock<Arc<TypeRegistry>> = LazyLock::new(|| {
    Arc::new(TypeRegistry::builtin().expect("built-in ontology must be well formed"))
});

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Process-wide registry holding the built-in ontology
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    pub fn global_arc() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn id(&self, name: &str) -> Result<TypeId, OntologyError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| OntologyError::UnknownType(name.to_string()))
    }

    pub fn descriptor(&self, id: TypeId) -> Result<&TypeDescriptor, OntologyError> {
        self.types
            .get(id.index())
            .ok_or(OntologyError::UnregisteredType(id))
    }

    /// Type name for messages; unregistered ids render as their index
    pub fn name(&self, id: TypeId) -> String {
        self.descriptor(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| id.to_string())
    }

    pub fn ancestors(&self, id: TypeId) -> Result<&HashSet<TypeId>, OntologyError> {
        self.descriptor(id).map(TypeDescriptor::ancestors)
    }

    /// `ty` satisfies `target` when `target` is in its ancestor set
    pub fn is_subtype(&self, ty: TypeId, target: TypeId) -> Result<bool, OntologyError> {
        Ok(self.ancestors(ty)?.contains(&target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Can `value` be passed to a parameter declared as `param`?
    ///
    /// Nulls are never assignable here; optionality is an arity concern
    /// handled by the normalizer.
    pub fn is_assignable(&self, value: &Value, param: TypeId) -> Result<bool, OntologyError> {
        let target = self.descriptor(param)?;
        if let TypeKind::Opaque(shape) = &target.kind {
            return self.matches_shape(value, shape);
        }

        match value {
            Value::Null => Ok(false),
            Value::Node(node) => self.is_subtype(node.type_id(), param),
            Value::Plan(_) => match self.plan_type {
                Some(plan_type) => self.is_subtype(plan_type, param),
                None => Ok(false),
            },
            Value::List(items) => {
                for item in items {
                    if !self.is_assignable(item, param)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Map(_) => Ok(false),
            _ => Ok(target.accepts_literals()),
        }
    }

    fn matches_shape(&self, value: &Value, shape: &Shape) -> Result<bool, OntologyError> {
        match shape {
            Shape::RowSet => Ok(is_row_set(value)),
            Shape::ReferenceMap { value_type } => {
                let Some(map) = value.as_map() else {
                    return Ok(false);
                };
                if map.is_empty() {
                    return Ok(false);
                }
                for reference in map.values() {
                    match reference {
                        Value::Node(node) if self.is_subtype(node.type_id(), *value_type)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            Shape::OptionSet { keys } => Ok(value.as_map().is_some_and(|map| {
                map.iter()
                    .all(|(k, v)| keys.iter().any(|allowed| allowed == k) && is_scalar(v))
            })),
        }
    }

    /// The built-in ontology used by the built-in function catalog
    pub fn builtin() -> Result<Self, OntologyError> {
        let mut b = Self::builder();

        b.atomic("item", &[])?;
        b.atomic("xs.anyAtomicType", &["item"])?;
        b.atomic("xs.string", &["xs.anyAtomicType"])?;
        b.atomic("xs.numeric", &["xs.anyAtomicType"])?;
        b.atomic("xs.decimal", &["xs.numeric"])?;
        b.atomic("xs.integer", &["xs.decimal"])?;
        b.atomic("xs.long", &["xs.integer", "xs.decimal", "xs.numeric"])?;
        b.atomic("xs.int", &["xs.long"])?;
        b.atomic("xs.unsignedLong", &["xs.integer"])?;
        b.atomic("xs.double", &["xs.numeric"])?;
        b.atomic("xs.float", &["xs.numeric"])?;
        b.atomic("xs.date", &["xs.anyAtomicType"])?;
        b.atomic("xs.dateTime", &["xs.anyAtomicType"])?;
        b.atomic("xs.time", &["xs.anyAtomicType"])?;
        b.atomic("xs.anyURI", &["xs.anyAtomicType"])?;
        b.atomic("xs.QName", &["xs.anyAtomicType"])?;

        b.structured("PlanCondition", &[])?;
        b.atomic("xs.boolean", &["xs.anyAtomicType", "PlanCondition"])?;

        b.atomic("PlanExprColName", &[])?;
        b.atomic("PlanSortKeyName", &[])?;
        b.atomic("PlanTriplePosition", &[])?;
        b.atomic("PlanColumnName", &["PlanExprColName"])?;
        b.structured("PlanExprCol", &["PlanExprColName"])?;
        b.structured(
            "PlanColumn",
            &[
                "PlanExprCol",
                "PlanColumnName",
                "PlanSortKeyName",
                "PlanTriplePosition",
                "xs.anyAtomicType",
            ],
        )?;
        b.structured("PlanSystemColumn", &["PlanColumn"])?;
        b.structured("PlanAggregateCol", &["PlanExprCol"])?;
        b.structured("PlanSortKey", &["PlanSortKeyName"])?;
        b.structured("PlanJoinKey", &[])?;
        b.structured("PlanTriplePattern", &[])?;
        b.structured(PLAN_TYPE, &[])?;
        // a bind parameter stands in for a scalar, including row counts
        b.structured("PlanParam", &["xs.anyAtomicType", "xs.long"])?;

        b.atomic("sem.iri", &["xs.anyAtomicType", "PlanTriplePosition"])?;
        let cts_reference = b.structured("cts.reference", &[])?;
        b.structured("cts.query", &["item", "PlanCondition"])?;

        b.structured("node", &["item"])?;
        for kind in [
            "element-node",
            "attribute-node",
            "text-node",
            "comment-node",
            "processing-instruction-node",
            "document-node",
        ] {
            b.structured(kind, &["node"])?;
        }

        b.opaque("PlanRowSet", Shape::RowSet)?;
        b.opaque(
            "PlanLexiconMap",
            Shape::ReferenceMap {
                value_type: cts_reference,
            },
        )?;
        b.opaque("PlanTripleOptions", option_set(&["dedup"]))?;
        b.opaque("PlanSparqlOptions", option_set(&["dedup", "base"]))?;
        b.opaque("PlanGroupConcatOptions", option_set(&["separator", "values"]))?;

        Ok(b.build())
    }
}

fn option_set(keys: &[&str]) -> Shape {
    Shape::OptionSet {
        keys: keys.iter().map(|k| k.to_string()).collect(),
    }
}

fn is_scalar(value: &Value) -> bool {
    value.is_null() || value.is_primitive()
}

fn is_row_set(value: &Value) -> bool {
    match value {
        Value::List(rows) => rows
            .iter()
            .all(|row| row.as_map().is_some_and(|m| m.values().all(is_scalar))),
        Value::Map(map) => {
            if map.len() != 2 {
                return false;
            }
            let names_ok = map
                .get("columnNames")
                .and_then(Value::as_list)
                .is_some_and(|names| names.iter().all(|n| n.as_str().is_some()));
            let rows_ok = map
                .get("rowValues")
                .and_then(Value::as_list)
                .is_some_and(|rows| {
                    rows.iter()
                        .all(|row| row.as_list().is_some_and(|vals| vals.iter().all(is_scalar)))
                });
            names_ok && rows_ok
        }
        _ => false,
    }
}

/// Accumulates declarations; each declaration's ancestry is closed on entry.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
}

impl TypeRegistryBuilder {
    pub fn atomic(&mut self, name: &str, parents: &[&str]) -> Result<TypeId, OntologyError> {
        self.declare(name, parents, TypeKind::Atomic)
    }

    pub fn structured(&mut self, name: &str, parents: &[&str]) -> Result<TypeId, OntologyError> {
        self.declare(name, parents, TypeKind::Structured)
    }

    pub fn opaque(&mut self, name: &str, shape: Shape) -> Result<TypeId, OntologyError> {
        self.declare(name, &[], TypeKind::Opaque(shape))
    }

    pub fn declare(
        &mut self,
        name: &str,
        parents: &[&str],
        kind: TypeKind,
    ) -> Result<TypeId, OntologyError> {
        if self.by_name.contains_key(name) {
            return Err(OntologyError::DuplicateType(name.to_string()));
        }

        let id = TypeId::new(self.types.len() as u32);
        let mut parent_ids = Vec::with_capacity(parents.len());
        let mut ancestors = HashSet::from([id]);
        for parent in parents {
            let parent_id = self.by_name.get(*parent).copied().ok_or_else(|| {
                OntologyError::UnknownParent {
                    name: name.to_string(),
                    parent: parent.to_string(),
                }
            })?;
            parent_ids.push(parent_id);
            ancestors.extend(self.types[parent_id.index()].ancestors.iter().copied());
        }

        self.types.push(TypeDescriptor {
            id,
            name: name.to_string(),
            parents: parent_ids,
            kind,
            ancestors,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn build(self) -> TypeRegistry {
        let plan_type = self.by_name.get(PLAN_TYPE).copied();
        TypeRegistry {
            types: self.types,
            by_name: self.by_name,
            plan_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optic_ir::{Node, Plan};
    use optic_ir::ValueMap;

    fn registry() -> &'static TypeRegistry {
        TypeRegistry::global()
    }

    fn node_of(ty: &str) -> Value {
        let id = registry().id(ty).unwrap();
        Value::Node(Node::new("op", "test", vec![], id))
    }

    #[test]
    fn test_ancestry_is_transitively_closed() {
        let types = registry();
        for a in types.iter() {
            for b in a.ancestors() {
                for c in types.ancestors(*b).unwrap() {
                    assert!(
                        a.ancestors().contains(c),
                        "{} reaches {} but not {}",
                        a.name,
                        types.name(*b),
                        types.name(*c)
                    );
                }
            }
        }
    }

    #[test]
    fn test_long_has_multiple_ancestors() {
        let types = registry();
        let long = types.id("xs.long").unwrap();
        for ancestor in ["xs.long", "xs.integer", "xs.decimal", "xs.numeric", "xs.anyAtomicType", "item"] {
            assert!(types.is_subtype(long, types.id(ancestor).unwrap()).unwrap());
        }
        assert!(!types.is_subtype(long, types.id("xs.string").unwrap()).unwrap());
    }

    #[test]
    fn test_literal_assignability() {
        let types = registry();
        let string = types.id("xs.string").unwrap();
        let column = types.id("PlanColumn").unwrap();
        let expr_col_name = types.id("PlanExprColName").unwrap();

        // literals go anywhere that accepts literals, regardless of declared type
        assert!(types.is_assignable(&Value::Int(3), string).unwrap());
        assert!(types.is_assignable(&Value::from("a"), expr_col_name).unwrap());
        assert!(!types.is_assignable(&Value::from("a"), column).unwrap());
        assert!(!types.is_assignable(&Value::Null, string).unwrap());
    }

    #[test]
    fn test_node_assignability_follows_ancestry() {
        let types = registry();
        let col = node_of("PlanColumn");
        for target in ["PlanExprColName", "PlanSortKeyName", "xs.anyAtomicType", "PlanColumn"] {
            assert!(types.is_assignable(&col, types.id(target).unwrap()).unwrap(), "{}", target);
        }
        assert!(!types.is_assignable(&col, types.id("PlanJoinKey").unwrap()).unwrap());

        let boolean = node_of("xs.boolean");
        assert!(types.is_assignable(&boolean, types.id("PlanCondition").unwrap()).unwrap());

        let param = node_of("PlanParam");
        assert!(types.is_assignable(&param, types.id("xs.integer").unwrap()).unwrap());
        assert!(!types.is_assignable(&col, types.id("xs.integer").unwrap()).unwrap());
    }

    #[test]
    fn test_unregistered_node_type_is_fatal() {
        let types = registry();
        let stray = Value::Node(Node::new("op", "col", vec![], TypeId::new(9_999)));
        let err = types
            .is_assignable(&stray, types.id("PlanColumn").unwrap())
            .unwrap_err();
        assert_eq!(err, OntologyError::UnregisteredType(TypeId::new(9_999)));
    }

    #[test]
    fn test_plan_values_have_plan_type() {
        let types = registry();
        let plan = Value::Plan(Plan::new(Node::new("op", "from-sql", vec![], TypeId::new(0))));
        assert!(types.is_assignable(&plan, types.id(PLAN_TYPE).unwrap()).unwrap());
        assert!(!types.is_assignable(&plan, types.id("xs.string").unwrap()).unwrap());
    }

    #[test]
    fn test_opaque_shapes() {
        let types = registry();
        let rows = types.id("PlanRowSet").unwrap();
        let options = types.id("PlanTripleOptions").unwrap();
        let lexicons = types.id("PlanLexiconMap").unwrap();

        let row = Value::Map(ValueMap::from([("a".to_string(), Value::Int(1))]));
        assert!(types.is_assignable(&Value::List(vec![row.clone()]), rows).unwrap());

        let pair = Value::Map(ValueMap::from([
            ("columnNames".to_string(), Value::from(vec!["a", "b"])),
            ("rowValues".to_string(), Value::List(vec![Value::from(vec![1i64, 2])])),
        ]));
        assert!(types.is_assignable(&pair, rows).unwrap());
        assert!(!types.is_assignable(&Value::from("rows"), rows).unwrap());

        let dedup = Value::Map(ValueMap::from([("dedup".to_string(), Value::from("on"))]));
        assert!(types.is_assignable(&dedup, options).unwrap());
        let bogus = Value::Map(ValueMap::from([("limit".to_string(), Value::Int(1))]));
        assert!(!types.is_assignable(&bogus, options).unwrap());

        let refs = Value::Map(ValueMap::from([("uri".to_string(), node_of("cts.reference"))]));
        assert!(types.is_assignable(&refs, lexicons).unwrap());
        let not_refs = Value::Map(ValueMap::from([("uri".to_string(), Value::from("uri"))]));
        assert!(!types.is_assignable(&not_refs, lexicons).unwrap());
    }

    #[test]
    fn test_builder_rejects_bad_declarations() {
        let mut b = TypeRegistry::builder();
        b.atomic("a", &[]).unwrap();
        assert_eq!(
            b.atomic("a", &[]).unwrap_err(),
            OntologyError::DuplicateType("a".to_string())
        );
        assert_eq!(
            b.structured("b", &["missing"]).unwrap_err(),
            OntologyError::UnknownParent {
                name: "b".to_string(),
                parent: "missing".to_string()
            }
        );
    }
}
