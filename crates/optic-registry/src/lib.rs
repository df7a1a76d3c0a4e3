//! Type ontology, function signatures and argument normalization
//!
//! The built-in ontology and catalog are built once per process and are
//! read-only afterwards; see [`TypeRegistry::global`] and
//! [`FunctionCatalog::global`].

mod catalog;
mod normalize;
mod ontology;
mod signature;

pub use catalog::{
    canonical_name, param, CatalogError, FunctionCatalog, FunctionDecl, FunctionKind,
    FunctionSummary, ParamDecl,
};
pub use normalize::{normalize, ArgumentError, CallArgs, ErrorKind};
pub use ontology::{
    OntologyError, Shape, TypeDescriptor, TypeKind, TypeRegistry, TypeRegistryBuilder, PLAN_TYPE,
};
pub use signature::{MaxArity, Param, Signature};
