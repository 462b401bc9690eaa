//! `matchAtLeastOne` / `matchExactlyOne` / `matchNone` executors.
//!
//! The comparison target is a `Component.Attribute` reference resolved across
//! every visible manifest of that component. `value` scope flattens all
//! source manifests into one multiset and checks each tested cell; `set`
//! scope compares the tested column's distinct values against each source
//! manifest's distinct set and reports at column level.

use std::collections::{HashMap, HashSet};

use crate::error::{GuardError, Result};
use crate::report::Finding;
use crate::resolver::CrossManifestResolver;
use crate::rules::{RuleInvocation, RuleKind};

use super::ColumnCells;

struct Target<'a> {
    component: &'a str,
    attribute: &'a str,
    set_scope: bool,
}

fn parse_target<'a>(invocation: &'a RuleInvocation) -> Result<Target<'a>> {
    let reference = invocation.arguments.first().ok_or_else(|| {
        GuardError::internal("unvalidated match target reached execution")
    })?;
    let (component, attribute) = reference.split_once('.').ok_or_else(|| {
        GuardError::internal(format!("'{reference}' is not a Component.Attribute reference"))
    })?;
    Ok(Target {
        component,
        attribute,
        set_scope: invocation.arguments.get(1).map(String::as_str) == Some("set"),
    })
}

pub(super) async fn execute(
    invocation: &RuleInvocation,
    cells: &ColumnCells,
    resolver: &CrossManifestResolver,
    attribute: &str,
) -> Result<Vec<Finding>> {
    let target = parse_target(invocation)?;
    let sources = resolver.resolve(target.component, target.attribute).await?;

    if target.set_scope {
        Ok(execute_set_scope(invocation, cells, &sources, &target, attribute))
    } else {
        Ok(execute_value_scope(invocation, cells, &sources, &target, attribute))
    }
}

fn execute_value_scope(
    invocation: &RuleInvocation,
    cells: &ColumnCells,
    sources: &[crate::resolver::ResolvedColumn],
    target: &Target<'_>,
    attribute: &str,
) -> Vec<Finding> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for source in sources {
        for value in &source.values {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
    }

    let reference = format!("{}.{}", target.component, target.attribute);
    let mut findings = Vec::new();
    for (row, value) in cells {
        let Some(value) = value else { continue };
        let count = counts.get(value.as_str()).copied().unwrap_or(0);
        let message = match invocation.kind {
            RuleKind::MatchAtLeastOne if count == 0 => {
                format!("'{value}' does not appear in any {reference} manifest")
            }
            RuleKind::MatchExactlyOne if count != 1 => format!(
                "'{value}' appears {count} times across {reference} manifests, expected exactly one"
            ),
            RuleKind::MatchNone if count > 0 => {
                format!("'{value}' already appears in a {reference} manifest")
            }
            _ => continue,
        };
        findings.push(Finding::row_scoped(
            attribute,
            *row,
            invocation.kind.token(),
            invocation.level,
            message,
            Some(value.clone()),
        ));
    }
    findings
}

fn execute_set_scope(
    invocation: &RuleInvocation,
    cells: &ColumnCells,
    sources: &[crate::resolver::ResolvedColumn],
    target: &Target<'_>,
    attribute: &str,
) -> Vec<Finding> {
    let tested: HashSet<&str> = cells
        .iter()
        .filter_map(|(_, v)| v.as_deref())
        .collect();
    if tested.is_empty() {
        return Vec::new();
    }

    let reference = format!("{}.{}", target.component, target.attribute);
    let mut findings = Vec::new();
    match invocation.kind {
        RuleKind::MatchAtLeastOne | RuleKind::MatchExactlyOne => {
            let containing = sources
                .iter()
                .filter(|source| {
                    let set: HashSet<&str> =
                        source.values.iter().map(String::as_str).collect();
                    tested.iter().all(|v| set.contains(v))
                })
                .count();
            let failed = if invocation.kind == RuleKind::MatchAtLeastOne {
                containing == 0
            } else {
                containing != 1
            };
            if failed {
                let message = if invocation.kind == RuleKind::MatchAtLeastOne {
                    format!(
                        "no {reference} manifest contains every value in column '{attribute}'"
                    )
                } else {
                    format!(
                        "{containing} {reference} manifests contain every value in column \
                         '{attribute}', expected exactly one"
                    )
                };
                findings.push(Finding::column_scoped(
                    attribute,
                    invocation.kind.token(),
                    invocation.level,
                    message,
                ));
            }
        }
        RuleKind::MatchNone => {
            for source in sources {
                let overlaps = source
                    .values
                    .iter()
                    .any(|v| tested.contains(v.as_str()));
                if overlaps {
                    findings.push(Finding::column_scoped(
                        attribute,
                        invocation.kind.token(),
                        invocation.level,
                        format!(
                            "values in column '{attribute}' already appear in {reference} \
                             manifest '{}'",
                            source.manifest_id
                        ),
                    ));
                }
            }
        }
        _ => {}
    }
    findings
}
