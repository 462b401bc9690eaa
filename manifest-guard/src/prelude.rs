//! Prelude for commonly used types and traits in manifest-guard.

pub use crate::compile::{SchemaCache, ValidationSchema};
pub use crate::error::{ErrorContext, GuardError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::manifest::Manifest;
pub use crate::orchestrator::ManifestValidator;
pub use crate::report::{Finding, Level, ValidationReport};
pub use crate::resolver::{AssetStore, CrossManifestResolver, Scope};
pub use crate::schema::{Attribute, AttributeGraph};
