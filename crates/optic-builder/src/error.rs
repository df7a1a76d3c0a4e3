use optic_export::ExportError;
use optic_registry::{ArgumentError, CatalogError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{0} does not start a plan")]
    NotASource(String),

    #[error("{0} cannot be appended to a plan")]
    NotAStage(String),

    #[error("{0} is a plan operation, not an expression")]
    NotAnExpression(String),
}

impl PlanError {
    /// The argument error behind a rejected call, if that is what failed
    pub fn argument_error(&self) -> Option<&ArgumentError> {
        match self {
            PlanError::Catalog(CatalogError::Argument(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ArgumentError> for PlanError {
    fn from(err: ArgumentError) -> Self {
        PlanError::Catalog(CatalogError::Argument(err))
    }
}
