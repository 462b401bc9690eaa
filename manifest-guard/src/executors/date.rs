//! `date` executor: permissive parsing across common layouts.

use chrono::{NaiveDate, NaiveDateTime};

use crate::report::{Finding, Level};

use super::ColumnCells;

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parses_as_date(value: &str) -> bool {
    let value = value.trim();
    if NaiveDateTime::parse_from_str(value, "%+").is_ok() {
        return true;
    }
    if DATE_LAYOUTS
        .iter()
        .any(|layout| NaiveDate::parse_from_str(value, layout).is_ok())
    {
        return true;
    }
    if DATETIME_LAYOUTS
        .iter()
        .any(|layout| NaiveDateTime::parse_from_str(value, layout).is_ok())
    {
        return true;
    }
    // A bare four-digit year is accepted, matching permissive parsers.
    value.len() == 4 && value.parse::<u16>().map_or(false, |y| (1000..=9999).contains(&y))
}

pub(super) fn execute(cells: &ColumnCells, level: Level, attribute: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        if parses_as_date(value) {
            continue;
        }
        findings.push(Finding::row_scoped(
            attribute,
            *row,
            "date",
            level,
            format!("'{value}' could not be parsed as a date"),
            Some(value.clone()),
        ));
    }
    findings
}
