//! Serialize a built plan into the JSON wire document the server executes
//!
//! Every node, whether an expression or a pipeline stage, becomes
//! `{"namespace", "operation", "args"}`. The stages of a plan are wrapped in
//! a single `operators` node under the [`ROOT_KEY`]. Export is read-only: a
//! plan can be exported any number of times and yields the same document.

mod document;
mod exporter;

pub use document::{WireDocument, ROOT_KEY};
pub use exporter::{strategy_for, wire_operation, ExportError, ExportStrategy, Exporter, STRATEGIES};

use optic_ir::Plan;
use optic_registry::TypeRegistry;

/// Export against the built-in ontology
pub fn export(plan: &Plan) -> Result<WireDocument, ExportError> {
    Exporter::new(TypeRegistry::global()).export(plan)
}
