//! Rule executors: one per rule kind.
//!
//! Each executor takes a column of `(row index, value)` pairs plus the parsed
//! rule arguments and produces typed findings. Executors never mutate the
//! manifest and are pure functions of their inputs, except the `match*`
//! family and `filenameExists`, which consume remote data through the
//! [`CrossManifestResolver`](crate::resolver::CrossManifestResolver).

mod ages;
mod cross;
mod date;
mod filename;
mod link;
mod list;
mod pattern;
mod range;
mod recommended;
mod types;
mod unique;

pub use list::ListMode;
pub(crate) use list::split_elements;

use crate::error::{GuardError, Result};
use crate::report::Finding;
use crate::resolver::CrossManifestResolver;
use crate::rules::{RuleInvocation, RuleKind};

/// One column's cells: `(row index, value)`, nulls normalized to `None`.
pub type ColumnCells = [(usize, Option<String>)];

/// Everything an executor may need beyond its own column.
pub struct ExecContext<'a> {
    /// The attribute (column) under validation
    pub attribute: &'a str,
    /// Resolver for cross-manifest rules; absent in offline validation
    pub resolver: Option<&'a CrossManifestResolver>,
    /// The manifest's `entityId` cells, aligned with the column rows
    /// (needed only by `filenameExists`)
    pub entity_ids: Option<&'a ColumnCells>,
}

impl<'a> ExecContext<'a> {
    /// A context for executors that need no remote data.
    pub fn offline(attribute: &'a str) -> Self {
        Self {
            attribute,
            resolver: None,
            entity_ids: None,
        }
    }

    fn require_resolver(&self, rule: RuleKind) -> Result<&'a CrossManifestResolver> {
        self.resolver.ok_or_else(|| {
            GuardError::resolver(format!(
                "rule '{rule}' requires an asset store but none was configured"
            ))
        })
    }
}

/// Executes a single rule invocation against a column.
pub async fn execute_invocation(
    invocation: &RuleInvocation,
    cells: &ColumnCells,
    ctx: &ExecContext<'_>,
) -> Result<Vec<Finding>> {
    let attribute = ctx.attribute;
    let level = invocation.level;
    Ok(match invocation.kind {
        RuleKind::List => {
            let mode = ListMode::from_arguments(&invocation.arguments)?;
            list::execute(cells, mode, level, attribute).0
        }
        RuleKind::Regex => pattern::execute(cells, &invocation.arguments, level, attribute)?,
        RuleKind::Float | RuleKind::Int | RuleKind::Num | RuleKind::Str => {
            types::execute(cells, invocation.kind, level, attribute)
        }
        RuleKind::Url => link::execute(cells, &invocation.arguments, level, attribute),
        RuleKind::InRange => range::execute(cells, &invocation.arguments, level, attribute)?,
        RuleKind::Date => date::execute(cells, level, attribute),
        RuleKind::Unique => unique::execute(cells, level, attribute),
        RuleKind::Recommended => recommended::execute(cells, level, attribute),
        RuleKind::ProtectAges => ages::execute(cells, level, attribute),
        RuleKind::MatchAtLeastOne | RuleKind::MatchExactlyOne | RuleKind::MatchNone => {
            let resolver = ctx.require_resolver(invocation.kind)?;
            cross::execute(invocation, cells, resolver, attribute).await?
        }
        RuleKind::FilenameExists => {
            let resolver = ctx.require_resolver(invocation.kind)?;
            filename::execute(invocation, cells, ctx.entity_ids, resolver, attribute).await?
        }
        RuleKind::Required => Vec::new(),
    })
}

/// Executes a `::` chain left-to-right.
///
/// Every non-final stage is a `list` stage (the parser guarantees it): its
/// output is a list of elements per row, fed element-wise to the next stage.
/// A row whose list fails to parse skips downstream stages for that row only;
/// findings from all stages are reported.
pub async fn execute_chain(
    invocations: &[&RuleInvocation],
    cells: &ColumnCells,
    ctx: &ExecContext<'_>,
) -> Result<Vec<Finding>> {
    match invocations {
        [] => Ok(Vec::new()),
        [single] => execute_invocation(single, cells, ctx).await,
        [stages @ .., last] => {
            let mut findings = Vec::new();
            let mut current: Vec<(usize, Option<String>)> = cells.to_vec();

            for stage in stages {
                let mode = ListMode::from_arguments(&stage.arguments)?;
                let (stage_findings, parsed) =
                    list::execute(&current, mode, stage.level, ctx.attribute);
                findings.extend(stage_findings);
                current = parsed
                    .into_iter()
                    .flat_map(|(row, elements)| {
                        elements.into_iter().map(move |e| (row, Some(e)))
                    })
                    .collect();
            }

            findings.extend(execute_invocation(last, &current, ctx).await?);
            Ok(findings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Level;
    use crate::rules::parse;

    fn cells(values: &[Option<&str>]) -> Vec<(usize, Option<String>)> {
        values
            .iter()
            .enumerate()
            .map(|(row, v)| (row, v.map(String::from)))
            .collect()
    }

    fn invocations(raw: &str) -> Vec<RuleInvocation> {
        match parse(raw, "Patient").unwrap() {
            crate::rules::RuleResolution::Rules(list) => list,
            crate::rules::RuleResolution::NoRule => panic!("unexpected NoRule"),
        }
    }

    #[tokio::test]
    async fn test_chain_applies_downstream_per_element() {
        let parsed = invocations("list like::regex match [a-f]+");
        let refs: Vec<&RuleInvocation> = parsed.iter().collect();
        let column = cells(&[Some("abc,def"), Some("abc,xyz")]);

        let findings = execute_chain(&refs, &column, &ExecContext::offline("Markers"))
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row, Some(3));
        assert_eq!(findings[0].value.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_chain_skips_downstream_for_unparsed_rows_only() {
        let parsed = invocations("list strict::int");
        let refs: Vec<&RuleInvocation> = parsed.iter().collect();
        // Row 0 fails strict list parse; row 1 parses and its elements
        // reach the int stage.
        let column = cells(&[Some("bare"), Some("1,x")]);

        let findings = execute_chain(&refs, &column, &ExecContext::offline("Counts"))
            .await
            .unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule, "list");
        assert_eq!(findings[0].row, Some(2));
        assert_eq!(findings[1].rule, "int");
        assert_eq!(findings[1].row, Some(3));
        assert_eq!(findings[1].value.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_cross_rule_without_resolver_is_resolver_error() {
        let parsed = invocations("matchAtLeastOne Patient.PatientID value");
        let column = cells(&[Some("A")]);

        let err = execute_invocation(&parsed[0], &column, &ExecContext::offline("PatientID"))
            .await
            .unwrap_err();
        assert!(err.is_resolver_error());
    }

    #[tokio::test]
    async fn test_required_pseudo_rule_produces_no_findings() {
        let invocation = RuleInvocation {
            kind: RuleKind::Required,
            arguments: Vec::new(),
            level: Level::Error,
        };
        let column = cells(&[None]);
        let findings = execute_invocation(&invocation, &column, &ExecContext::offline("X"))
            .await
            .unwrap();
        assert!(findings.is_empty());
    }
}
