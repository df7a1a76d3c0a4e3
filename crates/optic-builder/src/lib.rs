//! Fluent query-plan builder
//!
//! Plans start from a source accessor in [`op`] and grow one stage at a time
//! through [`PlanExt`]. Expressions come from the namespace modules
//! ([`op`], [`fns`], [`sem`], [`cts`]). Every call is checked against the
//! built-in function catalog before a node is created.
//!
//! ```no_run
//! use optic_builder::{op, PlanExt};
//!
//! # fn main() -> Result<(), optic_builder::PlanError> {
//! let songs = op::from_view(None, "songs", None)?;
//! let popular = songs.filter(op::gt(songs.col("popularity")?, 2)?)?;
//! println!("{}", popular.export()?);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod cts;
mod error;
pub mod fns;
pub mod op;
mod plan;
pub mod script;
pub mod sem;

pub use column::{column_form, resolve_column, ColumnForm};
pub use error::PlanError;
pub use plan::PlanExt;

pub use optic_export::WireDocument;
pub use optic_ir::{Node, Plan, Value, ValueMap};
pub use optic_registry::CallArgs;
