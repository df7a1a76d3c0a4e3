//! Declared parameter lists of builder functions

use crate::ontology::TypeRegistry;
use optic_ir::TypeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub type_id: TypeId,
    pub required: bool,
    pub repeatable: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, type_id: TypeId, required: bool, repeatable: bool) -> Self {
        Self {
            name: name.into(),
            type_id,
            required,
            repeatable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxArity {
    Bounded(usize),
    Unbounded,
}

/// Ordered parameters plus the accepted argument count range.
///
/// `min_arity` counts the leading required parameters. For unbounded
/// signatures the last parameter describes every argument past the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
    min_arity: usize,
    max_arity: MaxArity,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        let max = params.len();
        Self::with_max(params, MaxArity::Bounded(max))
    }

    /// Unbounded signature; without parameters it degrades to a nullary one.
    pub fn variadic(params: Vec<Param>) -> Self {
        if params.is_empty() {
            return Self::new(params);
        }
        Self::with_max(params, MaxArity::Unbounded)
    }

    fn with_max(params: Vec<Param>, max_arity: MaxArity) -> Self {
        let min_arity = params.iter().take_while(|p| p.required).count();
        Self {
            params,
            min_arity,
            max_arity,
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn min_arity(&self) -> usize {
        self.min_arity
    }

    pub fn max_arity(&self) -> MaxArity {
        self.max_arity
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_arity == MaxArity::Unbounded
    }

    /// Parameter governing the argument at `position`
    pub fn param_at(&self, position: usize) -> Option<&Param> {
        match self.params.get(position) {
            Some(param) => Some(param),
            None if self.is_unbounded() => self.params.last(),
            None => None,
        }
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Render as `(schema?: xs.string, view: xs.string, ...)`
    pub fn describe(&self, types: &TypeRegistry) -> String {
        let mut parts: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                format!(
                    "{}{}{}: {}",
                    p.name,
                    if p.repeatable { "*" } else { "" },
                    if p.required { "" } else { "?" },
                    types.name(p.type_id)
                )
            })
            .collect();
        if self.is_unbounded() {
            parts.push("...".to_string());
        }
        format!("({})", parts.join(", "))
    }
}
