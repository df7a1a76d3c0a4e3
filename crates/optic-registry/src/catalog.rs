//! Function catalog
//!
//! Declared signatures for every builder function. The catalog is plain data:
//! changing it changes which operations exist, never how arguments are
//! normalized or nodes exported.

use crate::normalize::{normalize, ArgumentError, CallArgs};
use crate::ontology::{OntologyError, TypeRegistry};
use crate::signature::{Param, Signature};
use optic_ir::{Node, TypeId};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Function not found: {namespace}.{name}")]
    FunctionNotFound { namespace: String, name: String },

    #[error("Function already declared: {0}")]
    DuplicateFunction(String),

    #[error("Invalid declaration of {function}: {source}")]
    Declaration {
        function: String,
        #[source]
        source: OntologyError,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// What a call produces and where it may appear in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// Scalar expression node
    Expression,
    /// Stage-0 accessor that starts a plan
    Source,
    /// Transformation appended to an existing plan
    Stage,
    /// Stage whose first argument is a complete right-hand plan
    Combinator,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub namespace: String,
    pub name: String,
    pub signature: Signature,
    pub returns: TypeId,
    pub kind: FunctionKind,
}

impl FunctionDecl {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Parameter declaration by type name, resolved when the catalog is built
#[derive(Debug, Clone)]
pub struct ParamDecl {
    name: &'static str,
    type_name: &'static str,
    required: bool,
    repeatable: bool,
}

/// Required, single-valued parameter
pub fn param(name: &'static str, type_name: &'static str) -> ParamDecl {
    ParamDecl {
        name,
        type_name,
        required: true,
        repeatable: false,
    }
}

impl ParamDecl {
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub kind: FunctionKind,
    pub signature: String,
    pub returns: String,
}

pub struct FunctionCatalog {
    types: Arc<TypeRegistry>,
    functions: HashMap<(String, String), FunctionDecl>,
}

static GLOBAL: LazyLock<FunctionCatalog> = LazyLock::new(|| {
    FunctionCatalog::builtin(TypeRegistry::global_arc())
        .expect("built-in function catalog must match the built-in ontology")
});

impl FunctionCatalog {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            functions: HashMap::new(),
        }
    }

    /// Process-wide catalog over the global ontology
    pub fn global() -> &'static FunctionCatalog {
        &GLOBAL
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn declare(
        &mut self,
        kind: FunctionKind,
        namespace: &str,
        name: &str,
        params: Vec<ParamDecl>,
        variadic: bool,
        returns: &str,
    ) -> Result<(), CatalogError> {
        let qualified = format!("{}.{}", namespace, name);
        let declaration = |source| CatalogError::Declaration {
            function: qualified.clone(),
            source,
        };

        let mut resolved = Vec::with_capacity(params.len());
        for p in params {
            let type_id = self.types.id(p.type_name).map_err(declaration)?;
            resolved.push(Param::new(p.name, type_id, p.required, p.repeatable));
        }
        let returns = self.types.id(returns).map_err(declaration)?;
        let signature = if variadic {
            Signature::variadic(resolved)
        } else {
            Signature::new(resolved)
        };

        let key = (namespace.to_string(), name.to_string());
        if self.functions.contains_key(&key) {
            return Err(CatalogError::DuplicateFunction(qualified));
        }
        self.functions.insert(
            key,
            FunctionDecl {
                namespace: namespace.to_string(),
                name: name.to_string(),
                signature,
                returns,
                kind,
            },
        );
        Ok(())
    }

    /// Look up by wire name; camelCase spellings (`fromView`) are accepted too.
    pub fn lookup(&self, namespace: &str, name: &str) -> Result<&FunctionDecl, CatalogError> {
        let canonical = canonical_name(name);
        self.functions
            .get(&(namespace.to_string(), canonical.into_owned()))
            .ok_or_else(|| CatalogError::FunctionNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Normalize `args` against the declaration and build its node.
    pub fn invoke(&self, decl: &FunctionDecl, args: CallArgs) -> Result<Node, CatalogError> {
        let args = normalize(&self.types, &decl.qualified_name(), &decl.signature, args)?;
        Ok(Node::new(
            decl.namespace.clone(),
            decl.name.clone(),
            args,
            decl.returns,
        ))
    }

    pub fn call(&self, namespace: &str, name: &str, args: CallArgs) -> Result<Node, CatalogError> {
        let decl = self.lookup(namespace, name)?;
        self.invoke(decl, args)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Human-readable listing, sorted by qualified name
    pub fn summaries(&self) -> Vec<FunctionSummary> {
        let mut out: Vec<FunctionSummary> = self
            .functions
            .values()
            .map(|decl| FunctionSummary {
                name: decl.qualified_name(),
                kind: decl.kind,
                signature: decl.signature.describe(&self.types),
                returns: self.types.name(decl.returns),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn builtin(types: Arc<TypeRegistry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(types);
        catalog.register_builtins()?;
        Ok(catalog)
    }

    fn register_builtins(&mut self) -> Result<(), CatalogError> {
        use FunctionKind::{Combinator, Expression, Source, Stage};

        // Source accessors
        self.declare(Source, "op", "from-view", vec![
            param("schema", "xs.string").optional(),
            param("view", "xs.string"),
            param("qualifier", "xs.string").optional(),
            param("sysCols", "PlanSystemColumn").optional().repeated(),
        ], false, "PlanPlan")?;
        self.declare(Source, "op", "from-literals", vec![
            param("rows", "PlanRowSet"),
            param("qualifier", "xs.string").optional(),
        ], false, "PlanPlan")?;
        self.declare(Source, "op", "from-lexicons", vec![
            param("indexes", "PlanLexiconMap"),
            param("qualifier", "xs.string").optional(),
            param("sysCols", "PlanSystemColumn").optional().repeated(),
        ], false, "PlanPlan")?;
        self.declare(Source, "op", "from-triples", vec![
            param("patterns", "PlanTriplePattern").repeated(),
            param("qualifier", "xs.string").optional(),
            param("graphIris", "xs.string").optional().repeated(),
            param("option", "PlanTripleOptions").optional(),
        ], false, "PlanPlan")?;
        self.declare(Source, "op", "from-sparql", vec![
            param("select", "xs.string"),
            param("qualifier", "xs.string").optional(),
            param("option", "PlanSparqlOptions").optional(),
        ], false, "PlanPlan")?;
        self.declare(Source, "op", "from-sql", vec![
            param("select", "xs.string"),
            param("qualifier", "xs.string").optional(),
        ], false, "PlanPlan")?;

        // Pipeline stages
        self.declare(Stage, "op", "where", vec![param("condition", "PlanCondition")], false, "PlanPlan")?;
        self.declare(Stage, "op", "select", vec![
            param("columns", "PlanExprColName").repeated(),
            param("qualifier", "xs.string").optional(),
        ], false, "PlanPlan")?;
        self.declare(Stage, "op", "group-by", vec![
            param("keys", "PlanExprColName").optional().repeated(),
            param("aggregates", "PlanAggregateCol").optional().repeated(),
        ], false, "PlanPlan")?;
        self.declare(Stage, "op", "order-by", vec![param("keys", "PlanSortKeyName").repeated()], false, "PlanPlan")?;
        self.declare(Stage, "op", "offset", vec![param("start", "xs.integer")], false, "PlanPlan")?;
        self.declare(Stage, "op", "limit", vec![param("length", "xs.integer")], false, "PlanPlan")?;
        self.declare(Stage, "op", "offset-limit", vec![
            param("start", "xs.integer").optional(),
            param("length", "xs.integer").optional(),
        ], false, "PlanPlan")?;
        self.declare(Stage, "op", "where-distinct", vec![], false, "PlanPlan")?;

        // Binary plan combinators
        for name in ["join-inner", "join-left-outer"] {
            self.declare(Combinator, "op", name, vec![
                param("right", "PlanPlan"),
                param("keys", "PlanJoinKey").optional().repeated(),
                param("condition", "PlanCondition").optional(),
            ], false, "PlanPlan")?;
        }
        self.declare(Combinator, "op", "join-cross-product", vec![
            param("right", "PlanPlan"),
            param("condition", "PlanCondition").optional(),
        ], false, "PlanPlan")?;
        for name in ["union", "intersect", "except"] {
            self.declare(Combinator, "op", name, vec![param("right", "PlanPlan")], false, "PlanPlan")?;
        }

        // Column references
        self.declare(Expression, "op", "col", vec![param("column", "xs.string")], false, "PlanColumn")?;
        self.declare(Expression, "op", "view-col", vec![
            param("view", "xs.string"),
            param("column", "xs.string"),
        ], false, "PlanColumn")?;
        self.declare(Expression, "op", "schema-col", vec![
            param("schema", "xs.string").optional(),
            param("view", "xs.string"),
            param("column", "xs.string"),
        ], false, "PlanColumn")?;
        self.declare(Expression, "op", "fragment-id-col", vec![param("column", "xs.string")], false, "PlanSystemColumn")?;
        self.declare(Expression, "op", "as", vec![
            param("column", "PlanColumnName"),
            param("expression", "item").optional(),
        ], false, "PlanExprCol")?;
        self.declare(Expression, "op", "param", vec![param("name", "xs.string")], false, "PlanParam")?;

        // Comparison and boolean logic
        for name in ["eq", "ne", "lt", "le", "gt", "ge"] {
            self.declare(Expression, "op", name, vec![
                param("left", "xs.anyAtomicType"),
                param("right", "xs.anyAtomicType"),
            ], false, "xs.boolean")?;
        }
        for name in ["and", "or"] {
            self.declare(Expression, "op", name, vec![param("list", "PlanCondition")], true, "xs.boolean")?;
        }
        self.declare(Expression, "op", "not", vec![param("condition", "PlanCondition")], false, "xs.boolean")?;
        self.declare(Expression, "op", "is-defined", vec![param("column", "PlanColumn")], false, "xs.boolean")?;

        // Arithmetic
        for name in ["add", "multiply"] {
            self.declare(Expression, "op", name, vec![
                param("left", "xs.anyAtomicType"),
                param("right", "xs.anyAtomicType"),
            ], true, "xs.numeric")?;
        }
        for name in ["subtract", "divide", "modulo"] {
            self.declare(Expression, "op", name, vec![
                param("left", "xs.anyAtomicType"),
                param("right", "xs.anyAtomicType"),
            ], false, "xs.numeric")?;
        }

        // Join keys and sort keys
        self.declare(Expression, "op", "on", vec![
            param("left", "PlanExprColName"),
            param("right", "PlanExprColName"),
        ], false, "PlanJoinKey")?;
        for name in ["asc", "desc"] {
            self.declare(Expression, "op", name, vec![param("column", "PlanExprColName")], false, "PlanSortKey")?;
        }

        // Aggregates
        self.declare(Expression, "op", "count", vec![
            param("name", "PlanColumnName"),
            param("column", "PlanExprColName").optional(),
        ], false, "PlanAggregateCol")?;
        for name in ["sum", "avg", "min", "max", "array-aggregate"] {
            self.declare(Expression, "op", name, vec![
                param("name", "PlanColumnName"),
                param("column", "PlanExprColName"),
            ], false, "PlanAggregateCol")?;
        }
        self.declare(Expression, "op", "group-concat", vec![
            param("name", "PlanColumnName"),
            param("column", "PlanExprColName"),
            param("options", "PlanGroupConcatOptions").optional(),
        ], false, "PlanAggregateCol")?;

        // Triple patterns
        self.declare(Expression, "op", "pattern", vec![
            param("subjects", "PlanTriplePosition").repeated(),
            param("predicates", "PlanTriplePosition").repeated(),
            param("objects", "PlanTriplePosition").repeated(),
            param("sysCols", "PlanSystemColumn").optional().repeated(),
        ], false, "PlanTriplePattern")?;

        // XML node constructors
        self.declare(Expression, "op", "xml-document", vec![param("root", "node")], false, "document-node")?;
        self.declare(Expression, "op", "xml-element", vec![
            param("name", "xs.string"),
            param("attributes", "attribute-node").optional().repeated(),
            param("content", "item").optional().repeated(),
        ], false, "element-node")?;
        self.declare(Expression, "op", "xml-attribute", vec![
            param("name", "xs.string"),
            param("value", "xs.anyAtomicType"),
        ], false, "attribute-node")?;
        self.declare(Expression, "op", "xml-text", vec![param("value", "xs.anyAtomicType")], false, "text-node")?;
        self.declare(Expression, "op", "xml-comment", vec![param("value", "xs.anyAtomicType")], false, "comment-node")?;
        self.declare(Expression, "op", "xml-pi", vec![
            param("name", "xs.string"),
            param("value", "xs.anyAtomicType"),
        ], false, "processing-instruction-node")?;

        // fn
        self.declare(Expression, "fn", "concat", vec![
            param("left", "xs.anyAtomicType"),
            param("right", "xs.anyAtomicType"),
        ], true, "xs.string")?;
        for name in ["upper-case", "lower-case"] {
            self.declare(Expression, "fn", name, vec![param("value", "xs.anyAtomicType")], false, "xs.string")?;
        }
        self.declare(Expression, "fn", "string-length", vec![param("value", "xs.anyAtomicType")], false, "xs.integer")?;
        self.declare(Expression, "fn", "contains", vec![
            param("value", "xs.anyAtomicType"),
            param("search", "xs.anyAtomicType"),
        ], false, "xs.boolean")?;
        self.declare(Expression, "fn", "substring", vec![
            param("value", "xs.anyAtomicType"),
            param("start", "xs.anyAtomicType"),
            param("length", "xs.anyAtomicType").optional(),
        ], false, "xs.string")?;

        // sem / cts
        self.declare(Expression, "sem", "iri", vec![param("value", "xs.string")], false, "sem.iri")?;
        for name in ["element-reference", "json-property-reference"] {
            self.declare(Expression, "cts", name, vec![
                param("name", "xs.string"),
                param("options", "xs.string").optional().repeated(),
            ], false, "cts.reference")?;
        }
        self.declare(Expression, "cts", "word-query", vec![
            param("text", "xs.string").repeated(),
            param("options", "xs.string").optional().repeated(),
        ], false, "cts.query")?;

        Ok(())
    }
}

/// `fromView` → `from-view`; names already in wire form pass through.
///
/// An uppercase run is one word (`xmlPI` → `xml-pi`) unless it is followed by
/// lowercase letters, whose word starts at the run's last capital
/// (`xmlPIValue` → `xml-pi-value`).
pub fn canonical_name(name: &str) -> Cow<'_, str> {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if i > 0 && (!prev_upper || next_lower) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
