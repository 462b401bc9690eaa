//! The attribute graph: the schema a manifest is validated against.
//!
//! The graph itself is produced by a schema-loading collaborator (CSV or
//! JSON-LD ingestion is out of scope); this module defines what that
//! collaborator must hand over: a registry of strongly-typed [`Attribute`]
//! records whose `depends_on` edges form a DAG rooted at component nodes.

mod attribute;
mod graph;

pub use attribute::{Attribute, ColumnType, ValidationRules};
pub use graph::AttributeGraph;
