//! `filenameExists` executor: manifest paths against the dataset listing.
//!
//! Each row's `(path, entity id)` pair is checked against the `(entity id,
//! path)` file listing resolved for the dataset scope. Four failure subtypes
//! get distinct wordings so a curator can tell a stale listing from a typo'd
//! path from a mis-assigned entity id.

use std::collections::HashMap;

use crate::error::{GuardError, Result};
use crate::report::Finding;
use crate::resolver::CrossManifestResolver;
use crate::rules::RuleInvocation;

use super::ColumnCells;

pub(super) async fn execute(
    invocation: &RuleInvocation,
    cells: &ColumnCells,
    entity_ids: Option<&ColumnCells>,
    resolver: &CrossManifestResolver,
    attribute: &str,
) -> Result<Vec<Finding>> {
    let dataset_scope = invocation.arguments.first().ok_or_else(|| {
        GuardError::internal("unvalidated filenameExists arguments reached execution")
    })?;
    let listing = resolver.file_listing(dataset_scope).await?;

    let id_to_path: HashMap<&str, &str> = listing
        .iter()
        .map(|(id, path)| (id.as_str(), path.as_str()))
        .collect();
    let known_paths: HashMap<&str, &str> = listing
        .iter()
        .map(|(id, path)| (path.as_str(), id.as_str()))
        .collect();

    let entity_for_row = |row: usize| -> Option<&str> {
        entity_ids?
            .iter()
            .find(|(r, _)| *r == row)
            .and_then(|(_, v)| v.as_deref())
    };

    let mut findings = Vec::new();
    for (row, path) in cells {
        let Some(path) = path else { continue };
        let message = match entity_for_row(*row) {
            None => {
                if known_paths.contains_key(path.as_str()) {
                    format!("manifest entry '{path}' is missing an entityId")
                } else {
                    format!("path '{path}' was not found in the dataset file listing")
                }
            }
            Some(id) => match id_to_path.get(id) {
                None => format!(
                    "entityId '{id}' for '{path}' was not found in the dataset file listing"
                ),
                Some(listed) if *listed != path.as_str() => {
                    format!("entityId '{id}' points to '{listed}' in the dataset, not '{path}'")
                }
                Some(_) => continue,
            },
        };
        findings.push(Finding::row_scoped(
            attribute,
            *row,
            "filenameExists",
            invocation.level,
            message,
            Some(path.clone()),
        ));
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::report::Level;
    use crate::resolver::InMemoryAssetStore;
    use crate::rules::RuleKind;

    fn cells(values: &[Option<&str>]) -> Vec<(usize, Option<String>)> {
        values
            .iter()
            .enumerate()
            .map(|(row, v)| (row, v.map(String::from)))
            .collect()
    }

    fn invocation() -> RuleInvocation {
        RuleInvocation {
            kind: RuleKind::FilenameExists,
            arguments: vec!["syn999".to_string()],
            level: Level::Error,
        }
    }

    fn resolver() -> CrossManifestResolver {
        let store = InMemoryAssetStore::new();
        store.insert_files(
            "syn999",
            vec![
                ("syn1".to_string(), "data/a.csv".to_string()),
                ("syn2".to_string(), "data/b.csv".to_string()),
            ],
        );
        CrossManifestResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_matching_pairs_pass() {
        let paths = cells(&[Some("data/a.csv"), Some("data/b.csv")]);
        let ids = cells(&[Some("syn1"), Some("syn2")]);
        let findings = execute(&invocation(), &paths, Some(&ids), &resolver(), "Filename")
            .await
            .unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_four_failure_subtypes_have_distinct_wordings() {
        let paths = cells(&[
            Some("data/a.csv"),   // listed path, no entity id
            Some("data/new.csv"), // unlisted path, no entity id
            Some("data/a.csv"),   // entity id unknown to the listing
            Some("data/b.csv"),   // entity id listed under a different path
        ]);
        let ids = cells(&[None, None, Some("syn404"), Some("syn1")]);

        let findings = execute(&invocation(), &paths, Some(&ids), &resolver(), "Filename")
            .await
            .unwrap();

        assert_eq!(findings.len(), 4);
        assert_eq!(
            findings[0].message,
            "manifest entry 'data/a.csv' is missing an entityId"
        );
        assert_eq!(
            findings[1].message,
            "path 'data/new.csv' was not found in the dataset file listing"
        );
        assert_eq!(
            findings[2].message,
            "entityId 'syn404' for 'data/a.csv' was not found in the dataset file listing"
        );
        assert_eq!(
            findings[3].message,
            "entityId 'syn1' points to 'data/a.csv' in the dataset, not 'data/b.csv'"
        );
    }

    #[tokio::test]
    async fn test_missing_entity_column_falls_back_to_path_checks() {
        let paths = cells(&[Some("data/a.csv")]);
        let findings = execute(&invocation(), &paths, None, &resolver(), "Filename")
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "manifest entry 'data/a.csv' is missing an entityId"
        );
    }
}
