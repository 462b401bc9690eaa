//! # Manifest Guard - Metadata Manifest Validation for Rust
//!
//! Manifest Guard validates biomedical metadata manifests (tabular files
//! describing datasets: one row per entity, one column per annotation
//! attribute) against a declarative attribute graph. It parses the
//! component-scoped rule micro-grammar embedded in the graph, compiles
//! per-component validation schemas, executes rules over Arrow-backed
//! manifests, and aggregates findings into a deterministic report.
//!
//! ## Overview
//!
//! A data curation platform stores its schema as an attribute graph: each
//! attribute carries a `required` flag, enumerated valid values, `depends_on`
//! edges, and a raw validation rule string such as
//! `#Patient unique warning^^#Biospecimen unique error` or
//! `list strict::regex match [a-f]`. Manifest Guard resolves those strings
//! for a target component, dispatches the parsed rules to per-column
//! executors, and reports row-precise errors and warnings. Cross-manifest
//! rules (`matchAtLeastOne`, `matchExactlyOne`, `matchNone`,
//! `filenameExists`) compare against other manifests through an injected
//! asset-store trait, with memoization, timeouts, and bounded retry.
//!
//! ## Quick Start
//!
//! ```rust
//! use manifest_guard::manifest::Manifest;
//! use manifest_guard::orchestrator::ManifestValidator;
//! use manifest_guard::schema::{Attribute, AttributeGraph};
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! // Describe the schema as an attribute graph.
//! let mut graph = AttributeGraph::new();
//! graph.add_component("Patient");
//! graph.add_attribute(Attribute::new("Patient").depends_on(["PatientID", "Age"]));
//! graph.add_attribute(Attribute::new("PatientID").required(true).rules("unique error"));
//! graph.add_attribute(Attribute::new("Age").rules("inRange 18 90 warning"));
//!
//! // Load a manifest (normally parsed from CSV/XLSX by a collaborator).
//! let manifest = Manifest::from_columns(vec![
//!     ("Component", vec![Some("Patient"), Some("Patient")]),
//!     ("PatientID", vec![Some("P1"), Some("P1")]),
//!     ("Age", vec![Some("45"), Some("101")]),
//! ])?;
//!
//! // Validate.
//! let validator = ManifestValidator::new(graph);
//! let report = validator.validate(&manifest).await?;
//!
//! assert!(!report.is_valid());
//! for finding in &report.errors {
//!     println!("{}: {}", finding.attribute, finding.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`schema`**: the `Attribute` record and `AttributeGraph` traversal
//! - **`rules`**: the rule micro-grammar parser (`^^`, `#`, `::` delimiters)
//! - **`compile`**: per-component `ValidationSchema` compiler and cache
//! - **`manifest`**: the Arrow-backed manifest table
//! - **`executors`**: one executor per rule kind
//! - **`resolver`**: cross-manifest resolution over the `AssetStore` trait
//! - **`orchestrator`**: the validation state machine
//! - **`report`** / **`formatters`**: findings, aggregation, and rendering
//!
//! ## Error Handling
//!
//! Validation findings are data, returned in the report. An `Err` from the
//! engine means the run itself failed: a schema error (bad rule syntax, a
//! cyclic graph) or a resolver failure (network, timeout). Callers can
//! distinguish "this manifest is invalid" from "I could not find out".

pub mod compile;
pub mod error;
pub mod executors;
pub mod formatters;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod prelude;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod schema;
