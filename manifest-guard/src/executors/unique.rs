//! `unique` executor: duplicate detection within a column.

use std::collections::HashMap;

use crate::report::{spreadsheet_row, Finding, Level};

use super::ColumnCells;

/// Flags every occurrence after the first, referencing the row that holds
/// the first occurrence.
pub(super) fn execute(cells: &ColumnCells, level: Level, attribute: &str) -> Vec<Finding> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut findings = Vec::new();

    for (row, value) in cells {
        let Some(value) = value else { continue };
        match first_seen.get(value.as_str()) {
            None => {
                first_seen.insert(value, *row);
            }
            Some(first) => findings.push(Finding::row_scoped(
                attribute,
                *row,
                "unique",
                level,
                format!(
                    "'{value}' duplicates the value in row {}",
                    spreadsheet_row(*first)
                ),
                Some(value.clone()),
            )),
        }
    }
    findings
}
