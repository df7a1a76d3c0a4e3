//! Argument normalization
//!
//! Reconciles the positional, named-options and single-value calling shapes
//! into one canonical argument list, checking arity against the signature and
//! every value against the ontology.
//!
//! Canonical form:
//! - one slot per supplied position, with explicit nulls for skipped
//!   optional parameters
//! - repeatable parameters hold a list (a lone value is wrapped)
//! - trailing nulls are dropped

use crate::ontology::{OntologyError, TypeRegistry};
use crate::signature::{MaxArity, Param, Signature};
use optic_ir::{Value, ValueMap};
use thiserror::Error;

/// The shape a caller supplied its arguments in
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// Values in declared parameter order
    Positional(Vec<Value>),
    /// A named-options object keyed by parameter name
    Named(ValueMap),
    /// One bare value; see [`normalize`] for how it is read
    Single(Value),
}

impl CallArgs {
    pub fn none() -> Self {
        CallArgs::Positional(Vec::new())
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(values: Vec<Value>) -> Self {
        CallArgs::Positional(values)
    }
}

impl From<ValueMap> for CallArgs {
    fn from(named: ValueMap) -> Self {
        CallArgs::Named(named)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Arity,
    Type,
    Structural,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("{function}: expected at least {min} arguments, got {actual}; parameter '{parameter}' at position {position} is required")]
    TooFew {
        function: String,
        parameter: String,
        position: usize,
        min: usize,
        actual: usize,
    },

    #[error("{function}: expected at most {max} arguments, got {actual}; no parameter after '{parameter}' for the value at position {position}")]
    TooMany {
        function: String,
        parameter: String,
        position: usize,
        max: usize,
        actual: usize,
    },

    #[error("{function}: parameter '{parameter}' at position {position} requires a value")]
    MissingRequired {
        function: String,
        parameter: String,
        position: usize,
    },

    #[error("{function}: parameter '{parameter}' at position {position} requires one or more values, got an empty list")]
    EmptyList {
        function: String,
        parameter: String,
        position: usize,
    },

    #[error("{function}: parameter '{parameter}' at position {position} expects {expected}, got {found}")]
    TypeMismatch {
        function: String,
        parameter: String,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("{function}: parameter '{parameter}' at position {position} takes a single value, got a list")]
    UnexpectedList {
        function: String,
        parameter: String,
        position: usize,
    },

    #[error("{function}: unknown named parameter '{key}'")]
    UnknownParameter { function: String, key: String },

    #[error("{function}: {source}")]
    Ontology {
        function: String,
        #[source]
        source: OntologyError,
    },
}

impl ArgumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArgumentError::TooFew { .. }
            | ArgumentError::TooMany { .. }
            | ArgumentError::MissingRequired { .. }
            | ArgumentError::EmptyList { .. } => ErrorKind::Arity,
            ArgumentError::TypeMismatch { .. }
            | ArgumentError::UnexpectedList { .. }
            | ArgumentError::UnknownParameter { .. } => ErrorKind::Type,
            ArgumentError::Ontology { .. } => ErrorKind::Structural,
        }
    }

    /// Name of the offending parameter (or named key)
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ArgumentError::TooFew { parameter, .. }
            | ArgumentError::TooMany { parameter, .. }
            | ArgumentError::MissingRequired { parameter, .. }
            | ArgumentError::EmptyList { parameter, .. }
            | ArgumentError::TypeMismatch { parameter, .. }
            | ArgumentError::UnexpectedList { parameter, .. } => Some(parameter),
            ArgumentError::UnknownParameter { key, .. } => Some(key),
            ArgumentError::Ontology { .. } => None,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            ArgumentError::TooFew { position, .. }
            | ArgumentError::TooMany { position, .. }
            | ArgumentError::MissingRequired { position, .. }
            | ArgumentError::EmptyList { position, .. }
            | ArgumentError::TypeMismatch { position, .. }
            | ArgumentError::UnexpectedList { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Normalize `args` against `signature` into the canonical argument list.
///
/// A `Single` value is the argument of a one-parameter signature even when
/// it is a mapping. For wider signatures a mapping is read as named options,
/// unless the first parameter itself takes a mapping, and anything else as
/// the first positional argument.
pub fn normalize(
    types: &TypeRegistry,
    function: &str,
    signature: &Signature,
    args: CallArgs,
) -> Result<Vec<Value>, ArgumentError> {
    let normalizer = Normalizer {
        types,
        function,
        signature,
    };
    let result = match args {
        CallArgs::Positional(values) => normalizer.positional(values),
        CallArgs::Named(named) => normalizer.named(named),
        CallArgs::Single(value) => normalizer.single(value),
    };

    match &result {
        Ok(values) => tracing::trace!(function, arity = values.len(), "normalized arguments"),
        Err(err) => tracing::trace!(function, error = %err, "argument normalization failed"),
    }
    result
}

struct Normalizer<'a> {
    types: &'a TypeRegistry,
    function: &'a str,
    signature: &'a Signature,
}

impl Normalizer<'_> {
    fn positional(&self, values: Vec<Value>) -> Result<Vec<Value>, ArgumentError> {
        let params = self.signature.params();
        let actual = values.len();

        if actual < self.signature.min_arity() {
            return Err(ArgumentError::TooFew {
                function: self.function.to_string(),
                parameter: params[actual].name.clone(),
                position: actual,
                min: self.signature.min_arity(),
                actual,
            });
        }
        if let MaxArity::Bounded(max) = self.signature.max_arity() {
            if actual > max {
                return Err(self.too_many(max, actual));
            }
        }

        let mut out = Vec::with_capacity(actual);
        for (position, value) in values.into_iter().enumerate() {
            let param = self
                .signature
                .param_at(position)
                .ok_or_else(|| self.too_many(params.len(), actual))?;
            out.push(self.check_arg(param, position, value)?);
        }
        self.check_missing(out.len())?;
        Ok(trim_trailing_nulls(out))
    }

    fn named(&self, named: ValueMap) -> Result<Vec<Value>, ArgumentError> {
        let params = self.signature.params();
        let mut slots: Vec<Value> = Vec::new();

        for (key, value) in named {
            let position = self.signature.position_of(&key).ok_or_else(|| {
                ArgumentError::UnknownParameter {
                    function: self.function.to_string(),
                    key: key.clone(),
                }
            })?;
            if slots.len() <= position {
                slots.resize(position + 1, Value::Null);
            }
            slots[position] = value;
        }

        // a list for the trailing variadic parameter reads as the extra positions
        if self.signature.is_unbounded() && slots.len() == params.len() {
            if let Some(Value::List(_)) = slots.last() {
                if let Some(Value::List(rest)) = slots.pop() {
                    slots.extend(rest);
                }
            }
        }

        let mut out = Vec::with_capacity(slots.len());
        for (position, value) in slots.into_iter().enumerate() {
            let param = self
                .signature
                .param_at(position)
                .ok_or_else(|| self.too_many(params.len(), position + 1))?;
            out.push(self.check_arg(param, position, value)?);
        }
        self.check_missing(out.len())?;
        Ok(trim_trailing_nulls(out))
    }

    fn single(&self, value: Value) -> Result<Vec<Value>, ArgumentError> {
        let params = self.signature.params();
        if params.len() == 1 {
            return self.positional(vec![value]);
        }
        match value {
            Value::Map(named) if !self.first_param_takes_map() => self.named(named),
            other => self.positional(vec![other]),
        }
    }

    fn first_param_takes_map(&self) -> bool {
        self.signature
            .params()
            .first()
            .and_then(|p| self.types.descriptor(p.type_id).ok())
            .is_some_and(|d| d.accepts_map())
    }

    /// Required parameters past the supplied ones get a null placeholder,
    /// which fails the required check.
    fn check_missing(&self, supplied: usize) -> Result<(), ArgumentError> {
        let params = self.signature.params();
        for (position, param) in params.iter().enumerate().skip(supplied) {
            if param.required {
                return Err(self.missing(param, position));
            }
        }
        Ok(())
    }

    fn check_arg(&self, param: &Param, position: usize, value: Value) -> Result<Value, ArgumentError> {
        match value {
            Value::Null if param.required => Err(self.missing(param, position)),
            Value::Null => Ok(Value::Null),
            Value::List(items) => {
                if self.accepts_list(param)? {
                    let list = Value::List(items);
                    self.check_value(param, position, &list)?;
                    return Ok(list);
                }
                if !param.repeatable {
                    return Err(ArgumentError::UnexpectedList {
                        function: self.function.to_string(),
                        parameter: param.name.clone(),
                        position,
                    });
                }
                if items.is_empty() {
                    if param.required {
                        return Err(ArgumentError::EmptyList {
                            function: self.function.to_string(),
                            parameter: param.name.clone(),
                            position,
                        });
                    }
                    return Ok(Value::Null);
                }
                for item in &items {
                    self.check_value(param, position, item)?;
                }
                Ok(Value::List(items))
            }
            other => {
                self.check_value(param, position, &other)?;
                if param.repeatable {
                    Ok(Value::List(vec![other]))
                } else {
                    Ok(other)
                }
            }
        }
    }

    fn check_value(&self, param: &Param, position: usize, value: &Value) -> Result<(), ArgumentError> {
        let assignable = self
            .types
            .is_assignable(value, param.type_id)
            .map_err(|source| self.ontology(source))?;
        if assignable {
            return Ok(());
        }
        Err(ArgumentError::TypeMismatch {
            function: self.function.to_string(),
            parameter: param.name.clone(),
            position,
            expected: self.types.name(param.type_id),
            found: value.kind_name(),
        })
    }

    fn accepts_list(&self, param: &Param) -> Result<bool, ArgumentError> {
        self.types
            .descriptor(param.type_id)
            .map(|d| d.accepts_list())
            .map_err(|source| self.ontology(source))
    }

    fn missing(&self, param: &Param, position: usize) -> ArgumentError {
        ArgumentError::MissingRequired {
            function: self.function.to_string(),
            parameter: param.name.clone(),
            position,
        }
    }

    fn too_many(&self, max: usize, actual: usize) -> ArgumentError {
        let parameter = self
            .signature
            .params()
            .last()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        ArgumentError::TooMany {
            function: self.function.to_string(),
            parameter,
            position: max,
            max,
            actual,
        }
    }

    fn ontology(&self, source: OntologyError) -> ArgumentError {
        ArgumentError::Ontology {
            function: self.function.to_string(),
            source,
        }
    }
}

fn trim_trailing_nulls(mut values: Vec<Value>) -> Vec<Value> {
    while values.last().is_some_and(Value::is_null) {
        values.pop();
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Param;
    use optic_ir::{Node, TypeId};

    fn types() -> &'static TypeRegistry {
        TypeRegistry::global()
    }

    fn ty(name: &str) -> TypeId {
        types().id(name).unwrap()
    }

    fn node_of(type_name: &str) -> Value {
        Value::Node(Node::new("op", "test", vec![], ty(type_name)))
    }

    fn one_to_three() -> Signature {
        Signature::new(vec![
            Param::new("a", ty("xs.string"), true, false),
            Param::new("b", ty("xs.string"), false, false),
            Param::new("c", ty("xs.string"), false, false),
        ])
    }

    fn from_view() -> Signature {
        Signature::new(vec![
            Param::new("schema", ty("xs.string"), false, false),
            Param::new("view", ty("xs.string"), true, false),
            Param::new("qualifier", ty("xs.string"), false, false),
            Param::new("sysCols", ty("PlanSystemColumn"), false, true),
        ])
    }

    fn run(sig: &Signature, args: CallArgs) -> Result<Vec<Value>, ArgumentError> {
        normalize(types(), "op.test", sig, args)
    }

    fn named(pairs: &[(&str, Value)]) -> CallArgs {
        CallArgs::Named(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn test_arity_boundary() {
        let sig = one_to_three();
        for n in 1..=3 {
            let args = vec![Value::from("x"); n];
            assert_eq!(run(&sig, CallArgs::Positional(args)).unwrap().len(), n);
        }

        let err = run(&sig, CallArgs::none()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(err.parameter(), Some("a"));
        assert_eq!(err.position(), Some(0));

        let err = run(&sig, CallArgs::Positional(vec![Value::from("x"); 4])).unwrap_err();
        assert!(matches!(err, ArgumentError::TooMany { max: 3, actual: 4, position: 3, .. }));
        assert!(err.to_string().contains("op.test"));
    }

    #[test]
    fn test_named_backfills_gaps_with_nulls() {
        let sig = from_view();
        let args = run(&sig, named(&[("view", Value::from("songs")), ("qualifier", Value::from("s"))])).unwrap();
        assert_eq!(args, vec![Value::Null, Value::from("songs"), Value::from("s")]);

        let positional = run(
            &sig,
            CallArgs::Positional(vec![Value::Null, Value::from("songs"), Value::from("s")]),
        )
        .unwrap();
        assert_eq!(args, positional);
    }

    #[test]
    fn test_named_missing_required_is_arity_error() {
        let err = run(&from_view(), named(&[("schema", Value::from("main"))])).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::MissingRequired {
                function: "op.test".to_string(),
                parameter: "view".to_string(),
                position: 1,
            }
        );

        let err = run(&from_view(), named(&[("qualifier", Value::from("q"))])).unwrap_err();
        assert_eq!(err.parameter(), Some("view"));
        assert_eq!(err.kind(), ErrorKind::Arity);
    }

    #[test]
    fn test_named_rejects_unknown_keys() {
        let err = run(&from_view(), named(&[("table", Value::from("songs"))])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.parameter(), Some("table"));
        assert!(err.to_string().contains("unknown named parameter 'table'"));
    }

    #[test]
    fn test_trailing_nulls_are_trimmed() {
        let args = run(
            &from_view(),
            CallArgs::Positional(vec![Value::from("main"), Value::from("songs"), Value::Null]),
        )
        .unwrap();
        assert_eq!(args, vec![Value::from("main"), Value::from("songs")]);
    }

    #[test]
    fn test_repeatable_wraps_scalars_and_rejects_empty() {
        let sig = Signature::new(vec![Param::new("columns", ty("PlanExprColName"), true, true)]);
        let args = run(&sig, CallArgs::Positional(vec![Value::from("a")])).unwrap();
        assert_eq!(args, vec![Value::List(vec![Value::from("a")])]);

        let err = run(&sig, CallArgs::Positional(vec![Value::List(vec![])])).unwrap_err();
        assert!(matches!(err, ArgumentError::EmptyList { position: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Arity);
    }

    #[test]
    fn test_list_for_single_valued_param() {
        let sig = one_to_three();
        let err = run(&sig, CallArgs::Positional(vec![Value::from(vec!["a", "b"])])).unwrap_err();
        assert!(matches!(err, ArgumentError::UnexpectedList { position: 0, .. }));
    }

    #[test]
    fn test_type_rejection_names_parameter() {
        let sig = Signature::new(vec![Param::new("column", ty("PlanColumn"), true, false)]);
        let err = run(&sig, CallArgs::Positional(vec![Value::from("popularity")])).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::TypeMismatch {
                function: "op.test".to_string(),
                parameter: "column".to_string(),
                position: 0,
                expected: "PlanColumn".to_string(),
                found: "string".to_string(),
            }
        );

        assert!(run(&sig, CallArgs::Positional(vec![node_of("PlanSystemColumn")])).is_ok());
    }

    #[test]
    fn test_unbounded_checks_extra_args_against_last_param() {
        let sig = Signature::variadic(vec![Param::new("list", ty("PlanCondition"), true, false)]);
        let conds = vec![node_of("xs.boolean"), node_of("cts.query"), node_of("xs.boolean")];
        assert_eq!(run(&sig, CallArgs::Positional(conds.clone())).unwrap().len(), 3);

        let mut bad = conds.clone();
        bad.push(Value::from("x"));
        let err = run(&sig, CallArgs::Positional(bad)).unwrap_err();
        assert_eq!(err.position(), Some(3));
        assert_eq!(err.parameter(), Some("list"));

        let spread = run(&sig, named(&[("list", Value::List(conds.clone()))])).unwrap();
        assert_eq!(spread, run(&sig, CallArgs::Positional(conds)).unwrap());
    }

    #[test]
    fn test_single_value_shorthand() {
        let sig = Signature::new(vec![Param::new("column", ty("xs.string"), true, false)]);
        assert_eq!(
            run(&sig, CallArgs::Single(Value::from("id"))).unwrap(),
            run(&sig, CallArgs::Positional(vec![Value::from("id")])).unwrap()
        );

        // wider signatures read a mapping as named options
        let from_map = run(
            &from_view(),
            CallArgs::Single(Value::Map(ValueMap::from([
                ("schema".to_string(), Value::from("main")),
                ("view".to_string(), Value::from("songs")),
            ]))),
        )
        .unwrap();
        assert_eq!(from_map, vec![Value::from("main"), Value::from("songs")]);
    }

    #[test]
    fn test_single_mapping_for_map_typed_first_param() {
        let sig = Signature::new(vec![
            Param::new("rows", ty("PlanRowSet"), true, false),
            Param::new("qualifier", ty("xs.string"), false, false),
        ]);
        let rows = Value::Map(ValueMap::from([
            ("columnNames".to_string(), Value::from(vec!["a"])),
            ("rowValues".to_string(), Value::List(vec![Value::from(vec![1i64])])),
        ]));
        let args = run(&sig, CallArgs::Single(rows.clone())).unwrap();
        assert_eq!(args, vec![rows]);
    }

    #[test]
    fn test_unregistered_type_is_structural() {
        let sig = Signature::new(vec![Param::new("x", ty("xs.string"), true, false)]);
        let stray = Value::Node(Node::new("op", "col", vec![], TypeId::new(50_000)));
        let err = run(&sig, CallArgs::Positional(vec![stray])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }
}
