//! `inRange` executor: inclusive numeric bounds.

use crate::error::{GuardError, Result};
use crate::report::{Finding, Level};

use super::ColumnCells;

pub(super) fn execute(
    cells: &ColumnCells,
    arguments: &[String],
    level: Level,
    attribute: &str,
) -> Result<Vec<Finding>> {
    let (min_text, max_text) = match arguments {
        [min, max] => (min.as_str(), max.as_str()),
        _ => {
            return Err(GuardError::internal(
                "unvalidated inRange arguments reached execution",
            ))
        }
    };
    let min: f64 = min_text
        .parse()
        .map_err(|_| GuardError::internal(format!("inRange bound '{min_text}' is not numeric")))?;
    let max: f64 = max_text
        .parse()
        .map_err(|_| GuardError::internal(format!("inRange bound '{max_text}' is not numeric")))?;

    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        match value.parse::<f64>() {
            // A non-numeric value can never satisfy a range, so the type
            // failure is an error regardless of the configured level.
            Err(_) => findings.push(Finding::row_scoped(
                attribute,
                *row,
                "inRange",
                Level::Error,
                format!("'{value}' is not a number and cannot be range checked"),
                Some(value.clone()),
            )),
            Ok(n) if n < min || n > max => findings.push(Finding::row_scoped(
                attribute,
                *row,
                "inRange",
                level,
                format!("'{value}' is not between {min_text} and {max_text}"),
                Some(value.clone()),
            )),
            Ok(_) => {}
        }
    }
    Ok(findings)
}
