//! `list` executor: comma-delimited text.

use crate::error::{GuardError, Result};
use crate::report::{Finding, Level};

use super::ColumnCells;

/// How strictly a cell must look like a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Bare values without a comma are rejected, even singletons
    Strict,
    /// A bare value is accepted as a one-element list
    Like,
}

impl ListMode {
    pub(super) fn from_arguments(arguments: &[String]) -> Result<Self> {
        match arguments.first().map(String::as_str) {
            None | Some("strict") => Ok(ListMode::Strict),
            Some("like") => Ok(ListMode::Like),
            Some(other) => Err(GuardError::internal(format!(
                "unvalidated list mode '{other}' reached execution"
            ))),
        }
    }
}

/// Splits a comma-delimited cell into trimmed elements; empty trailing
/// segments (`"a,b,"`) are dropped.
pub(crate) fn split_elements(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(String::from)
        .collect()
}

/// Returns findings plus the successfully parsed rows for chain staging.
pub(super) fn execute(
    cells: &ColumnCells,
    mode: ListMode,
    level: Level,
    attribute: &str,
) -> (Vec<Finding>, Vec<(usize, Vec<String>)>) {
    let mut findings = Vec::new();
    let mut parsed = Vec::new();

    for (row, value) in cells {
        let Some(value) = value else { continue };
        if mode == ListMode::Strict && !value.contains(',') {
            findings.push(Finding::row_scoped(
                attribute,
                *row,
                "list",
                level,
                format!("'{value}' is not a comma delimited list"),
                Some(value.clone()),
            ));
            continue;
        }
        parsed.push((*row, split_elements(value)));
    }

    (findings, parsed)
}
