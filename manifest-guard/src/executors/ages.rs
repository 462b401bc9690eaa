//! `protectAges` executor: HIPAA-style age censoring.

use crate::report::{Finding, Level};

use super::ColumnCells;

const MIN_UNPROTECTED: f64 = 18.0;
const MAX_UNPROTECTED: f64 = 89.0;

/// Ages under 18 or over 89 identify protected populations and must be
/// censored before a manifest is released.
pub(super) fn execute(cells: &ColumnCells, level: Level, attribute: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        match value.parse::<f64>() {
            Err(_) => findings.push(Finding::row_scoped(
                attribute,
                *row,
                "protectAges",
                level,
                format!("'{value}' is not a numeric age"),
                Some(value.clone()),
            )),
            Ok(age) if age < MIN_UNPROTECTED || age > MAX_UNPROTECTED => {
                findings.push(Finding::row_scoped(
                    attribute,
                    *row,
                    "protectAges",
                    level,
                    format!("age '{value}' must be censored before release"),
                    Some(value.clone()),
                ))
            }
            Ok(_) => {}
        }
    }
    findings
}
