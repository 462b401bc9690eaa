//! `url` executor: well-formedness plus required substrings.

use url::Url;

use crate::report::{Finding, Level};

use super::ColumnCells;

pub(super) fn execute(
    cells: &ColumnCells,
    substrings: &[String],
    level: Level,
    attribute: &str,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        if Url::parse(value).is_err() {
            findings.push(Finding::row_scoped(
                attribute,
                *row,
                "url",
                level,
                format!("'{value}' is not a well formed URL"),
                Some(value.clone()),
            ));
            continue;
        }
        for needle in substrings {
            if !value.contains(needle.as_str()) {
                findings.push(Finding::row_scoped(
                    attribute,
                    *row,
                    "url",
                    level,
                    format!("URL '{value}' does not contain '{needle}'"),
                    Some(value.clone()),
                ));
            }
        }
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
    fn test_malformed_url_is_flagged() {
        let column = cells(&[Some("not a url"), Some("https://example.org/x")]);
        let findings = execute(&column, &[], Level::Error, "Protocol");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "'not a url' is not a well formed URL");
    }

    #[test]
    fn test_each_missing_substring_is_a_separate_finding() {
        let column = cells(&[Some("https://example.org/data")]);
        let needles = vec!["example.org".to_string(), "v2".to_string()];
        let findings = execute(&column, &needles, Level::Warning, "Protocol");

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "URL 'https://example.org/data' does not contain 'v2'"
        );
    }

    #[test]
    fn test_substrings_are_not_checked_on_malformed_urls() {
        let column = cells(&[Some("::broken::")]);
        let needles = vec!["x".to_string()];
        let findings = execute(&column, &needles, Level::Error, "Protocol");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.ends_with("is not a well formed URL"));
    }
}
