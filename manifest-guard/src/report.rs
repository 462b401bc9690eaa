//! Findings and validation reports.
//!
//! A validation run never raises exceptions for bad data: every problem a
//! rule executor detects becomes a [`Finding`], and findings are aggregated
//! into a [`ValidationReport`] partitioned by level. A manifest is "valid for
//! submission" iff the error partition is empty; warnings never block.
//!
//! Findings are created during one validation pass and discarded after being
//! serialized to the caller; they are never persisted.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Offset from a zero-based data row index to the spreadsheet row number
/// shown in findings (row 1 is the header, data starts at row 2).
pub const ROW_OFFSET: u64 = 2;

/// Converts a zero-based data row index to a spreadsheet row number.
pub fn spreadsheet_row(index: usize) -> u64 {
    index as u64 + ROW_OFFSET
}

/// Message level of a finding.
///
/// Errors block submission; warnings are surfaced but never block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// The finding blocks submission
    Error,
    /// The finding is advisory only
    Warning,
}

impl Level {
    /// Parses a trailing rule-string token into a level, if it is one.
    pub fn from_token(token: &str) -> Option<Level> {
        match token {
            "error" => Some(Level::Error),
            "warning" => Some(Level::Warning),
            _ => None,
        }
    }

    /// Returns the rule-string token for this level.
    pub fn as_token(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }
}

/// One structured error or warning produced during validation.
///
/// `row` is a spreadsheet row number (see [`spreadsheet_row`]); column-level
/// findings (structural problems, set-scope comparisons) carry no row and
/// serialize it as JSON null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The attribute (manifest column) the finding refers to
    pub attribute: String,
    /// Spreadsheet row number, if the finding is row-scoped
    pub row: Option<u64>,
    /// The rule kind that produced the finding (e.g. "regex", "inRange")
    pub rule: String,
    /// Severity of the finding
    pub level: Level,
    /// Human-readable message with a fixed, reproducible format
    pub message: String,
    /// The offending value, if any
    pub value: Option<String>,
}

impl Finding {
    /// Creates a row-scoped finding.
    pub fn row_scoped(
        attribute: impl Into<String>,
        row_index: usize,
        rule: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            row: Some(spreadsheet_row(row_index)),
            rule: rule.into(),
            level,
            message: message.into(),
            value,
        }
    }

    /// Creates a column-scoped finding with no row reference.
    pub fn column_scoped(
        attribute: impl Into<String>,
        rule: impl Into<String>,
        level: Level,
        message: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            row: None,
            rule: rule.into(),
            level,
            message: message.into(),
            value: None,
        }
    }

    /// The positional-array rendering consumers expect:
    /// `[row, attribute, message, value]`.
    pub fn to_positional(&self) -> Value {
        json!([self.row, self.attribute, self.message, self.value])
    }
}

/// Counters describing one validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Number of rule invocations evaluated
    pub rules_evaluated: usize,
    /// Number of manifest columns that had at least one rule dispatched
    pub columns_validated: usize,
    /// Wall-clock execution time in milliseconds
    pub execution_time_ms: u64,
    /// Custom per-rule metrics (e.g. duplicate counts)
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub custom_metrics: HashMap<String, f64>,
}

/// Aggregated findings from one manifest validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings that block submission
    pub errors: Vec<Finding>,
    /// Advisory findings
    pub warnings: Vec<Finding>,
    /// Run counters
    pub metrics: ValidationMetrics,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finding to the partition matching its level.
    pub fn add(&mut self, finding: Finding) {
        match finding.level {
            Level::Error => self.errors.push(finding),
            Level::Warning => self.warnings.push(finding),
        }
    }

    /// Adds every finding in the iterator.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// True iff the manifest is valid for submission (no error findings).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings across both partitions.
    pub fn len(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// True when no findings were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Sorts both partitions by `(row, attribute)` for deterministic output.
    ///
    /// Column-scoped findings (no row) sort before all row-scoped ones.
    pub fn sort(&mut self) {
        let key = |f: &Finding| (f.row, f.attribute.clone());
        self.errors.sort_by_key(key);
        self.warnings.sort_by_key(key);
    }

    /// Renders the positional-array JSON document
    /// `{"errors": [[row, attribute, message, value], …], "warnings": […]}`.
    pub fn to_positional_json(&self) -> Value {
        json!({
            "errors": self.errors.iter().map(Finding::to_positional).collect::<Vec<_>>(),
            "warnings": self.warnings.iter().map(Finding::to_positional).collect::<Vec<_>>(),
        })
    }
}
