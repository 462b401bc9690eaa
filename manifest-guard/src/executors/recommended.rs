//! `recommended` executor: soft requirement on a column.

use crate::report::{Finding, Level};

use super::ColumnCells;

pub(super) fn execute(cells: &ColumnCells, level: Level, attribute: &str) -> Vec<Finding> {
    cells
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(row, _)| {
            Finding::row_scoped(
                attribute,
                *row,
                "recommended",
                level,
                format!("column '{attribute}' is recommended but no value was provided"),
                None,
            )
        })
        .collect()
}
