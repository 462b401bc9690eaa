//! `regex` executor: `search` (substring) and `match` (anchored) modules.

use regex::Regex;

use crate::error::{GuardError, Result};
use crate::report::{Finding, Level};

use super::ColumnCells;

pub(super) fn execute(
    cells: &ColumnCells,
    arguments: &[String],
    level: Level,
    attribute: &str,
) -> Result<Vec<Finding>> {
    // The pattern was whitespace-tokenized by the parser and may span
    // several arguments.
    let (module, rest) = match arguments {
        [module, rest @ ..] if !rest.is_empty() => (module.as_str(), rest),
        _ => {
            return Err(GuardError::internal(
                "unvalidated regex arguments reached execution",
            ))
        }
    };
    let pattern = rest.join(" ");
    let pattern = pattern.as_str();

    // match anchors at the start of the value; search scans anywhere.
    let compiled = if module == "match" {
        Regex::new(&format!("^(?:{pattern})"))
    } else {
        Regex::new(pattern)
    }
    .map_err(|e| GuardError::internal(format!("regex '{pattern}' failed to compile: {e}")))?;

    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        if compiled.is_match(value) {
            continue;
        }
        let message = if module == "match" {
            format!("'{value}' does not match the pattern '{pattern}'")
        } else {
            format!("'{value}' does not contain the pattern '{pattern}'")
        };
        findings.push(Finding::row_scoped(
            attribute,
            *row,
            "regex",
            level,
            message,
            Some(value.clone()),
        ));
    }
    Ok(findings)
}
