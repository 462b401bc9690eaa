//! Scalar type executors: `float`, `int`, `num`, `string`.

use crate::report::{Finding, Level};
use crate::rules::RuleKind;

use super::ColumnCells;

fn conforms(kind: RuleKind, value: &str) -> bool {
    match kind {
        RuleKind::Int => value.parse::<i64>().is_ok(),
        RuleKind::Float | RuleKind::Num => value.parse::<f64>().is_ok(),
        // Every manifest cell is already text.
        RuleKind::Str => true,
        _ => true,
    }
}

pub(super) fn execute(
    cells: &ColumnCells,
    kind: RuleKind,
    level: Level,
    attribute: &str,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        if conforms(kind, value) {
            continue;
        }
        findings.push(Finding::row_scoped(
            attribute,
            *row,
            kind.token(),
            level,
            format!("'{value}' is not of type {kind}"),
            Some(value.clone()),
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<(usize, Option<String>)> {
        values
            .iter()
            .enumerate()
            .map(|(row, v)| (row, v.map(String::from)))
            .collect()
    }

    #[test]
    fn test_int_rejects_decimals_and_text() {
        let column = cells(&[Some("42"), Some("3.5"), Some("abc"), Some("-7")]);
        let findings = execute(&column, RuleKind::Int, Level::Error, "Count");

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "'3.5' is not of type int");
        assert_eq!(findings[1].message, "'abc' is not of type int");
    }

    #[test]
    fn test_float_accepts_integers_and_scientific_notation() {
        let column = cells(&[Some("3"), Some("3.5"), Some("1e-4"), Some("nope")]);
        let findings = execute(&column, RuleKind::Float, Level::Warning, "Dose");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].value.as_deref(), Some("nope"));
        assert_eq!(findings[0].level, Level::Warning);
    }

    #[test]
    fn test_string_never_fails() {
        let column = cells(&[Some("anything"), Some("123"), None]);
        assert!(execute(&column, RuleKind::Str, Level::Error, "Notes").is_empty());
    }
}
