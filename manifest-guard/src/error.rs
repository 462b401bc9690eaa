//! Error types for the manifest-guard validation engine.
//!
//! This module provides a comprehensive error handling strategy using `thiserror`
//! for automatic error trait implementations. All errors in the library are
//! represented by the `GuardError` enum.
//!
//! Two families of failure exist and must never be conflated:
//!
//! - **Schema errors** (`RuleSyntax`, `UnknownRule`, `CyclicSchema`) are fatal
//!   and raised before any manifest row is touched.
//! - **Validation findings** are data, returned inside a
//!   [`ValidationReport`](crate::report::ValidationReport), never as errors.
//!
//! Resolver failures sit in between: they mean "I don't know whether this
//! manifest is valid", which callers must be able to distinguish from "this
//! manifest is invalid".

use thiserror::Error;

/// The main error type for the manifest-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A rule string is malformed for a known rule kind.
    ///
    /// Raised at parse time, naming the offending segment, so schema errors
    /// surface before any manifest is processed.
    #[error("rule syntax error in segment '{segment}': {message}")]
    RuleSyntax {
        /// The raw rule segment that failed to parse
        segment: String,
        /// Detailed error message
        message: String,
    },

    /// A rule string names a rule kind the engine does not know.
    #[error("unknown validation rule '{rule}' in segment '{segment}'")]
    UnknownRule {
        /// The unrecognized rule word
        rule: String,
        /// The raw rule segment containing it
        segment: String,
    },

    /// The attribute graph contains a dependency cycle.
    ///
    /// `depends_on` edges must form a DAG rooted at component nodes; a cycle
    /// is a fatal schema error.
    #[error("attribute graph contains a dependency cycle through '{attribute}'")]
    CyclicSchema {
        /// An attribute on the detected cycle
        attribute: String,
    },

    /// An attribute referenced by the schema or a rule does not exist.
    #[error("attribute '{attribute}' not found in the schema graph")]
    AttributeNotFound { attribute: String },

    /// A required column is not present in the manifest.
    #[error("column '{column}' not found in manifest")]
    ColumnNotFound { column: String },

    /// A manifest column has a non-string physical type.
    #[error("type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Cross-manifest resolution failed.
    ///
    /// Transient store failures are retried a bounded number of times with
    /// backoff before this surfaces. It is reported as a failed validation
    /// *run*, distinct from "manifest invalid".
    #[error("cross-manifest resolution failed: {message}")]
    Resolver {
        /// Detailed error message
        message: String,
        /// Whether the failure was a timeout
        timed_out: bool,
    },

    /// Error from Arrow operations.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, GuardError>`.
///
/// This is the standard `Result` type used throughout the library.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a rule syntax error for the given segment.
    pub fn rule_syntax(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleSyntax {
            segment: segment.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-rule error for the given segment.
    pub fn unknown_rule(rule: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnknownRule {
            rule: rule.into(),
            segment: segment.into(),
        }
    }

    /// Creates a resolver error.
    pub fn resolver(message: impl Into<String>) -> Self {
        Self::Resolver {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Creates a resolver timeout error.
    pub fn resolver_timeout(message: impl Into<String>) -> Self {
        Self::Resolver {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Creates an internal invariant-violation error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is a schema error (parse/compile time).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            GuardError::RuleSyntax { .. }
                | GuardError::UnknownRule { .. }
                | GuardError::CyclicSchema { .. }
                | GuardError::AttributeNotFound { .. }
        )
    }

    /// Returns true if this error came from the cross-manifest resolver.
    pub fn is_resolver_error(&self) -> bool {
        matches!(self, GuardError::Resolver { .. })
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<GuardError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            match base_error {
                GuardError::Internal(inner) => GuardError::Internal(format!("{}: {}", msg, inner)),
                other => GuardError::Internal(format!("{}: {}", msg, other)),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            let base_error = e.into();
            match base_error {
                GuardError::Internal(inner) => GuardError::Internal(format!("{}: {}", msg, inner)),
                other => GuardError::Internal(format!("{}: {}", msg, other)),
            }
        })
    }
}
