//! Schema-to-validation-schema compilation.
//!
//! Walks the attribute graph from a component root and produces the
//! declarative, immutable [`ValidationSchema`] used by the orchestrator's
//! structural checks and by the spreadsheet layer for real-time hints.

mod cache;
mod schema;

pub use cache::SchemaCache;
pub use schema::{compile, ConditionalRule, PropertyConstraint, ValidationSchema};
