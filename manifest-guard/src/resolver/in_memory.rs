//! In-memory asset store for testing and development.

use super::{AssetStore, ManifestId, Scope};
use crate::error::{GuardError, Result};
use crate::manifest::Manifest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// One stored manifest with its component and optional scope tag.
#[derive(Debug, Clone)]
struct StoredManifest {
    component: String,
    scope_tag: Option<String>,
    manifest: Manifest,
}

/// In-memory implementation of [`AssetStore`].
///
/// Useful for tests and development: supports scope tagging, call counters
/// for memoization assertions, and transient-failure injection for retry
/// tests.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    manifests: RwLock<HashMap<ManifestId, StoredManifest>>,
    files: RwLock<HashMap<String, Arc<Vec<(String, String)>>>>,
    list_manifest_calls: AtomicUsize,
    load_manifest_calls: AtomicUsize,
    list_files_calls: AtomicUsize,
    fail_next: AtomicU32,
}

impl InMemoryAssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a manifest under the given component and optional scope tag
    /// (a project or dataset identifier).
    pub fn insert_manifest(
        &self,
        id: impl Into<ManifestId>,
        component: impl Into<String>,
        scope_tag: Option<&str>,
        manifest: Manifest,
    ) {
        self.manifests.write().expect("store poisoned").insert(
            id.into(),
            StoredManifest {
                component: component.into(),
                scope_tag: scope_tag.map(String::from),
                manifest,
            },
        );
    }

    /// Stores a file listing for a dataset scope.
    pub fn insert_files(&self, dataset_scope: impl Into<String>, listing: Vec<(String, String)>) {
        self.files
            .write()
            .expect("store poisoned")
            .insert(dataset_scope.into(), Arc::new(listing));
    }

    /// Makes the next `n` store calls fail with a transient error.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of `list_manifests` calls served.
    pub fn list_manifest_calls(&self) -> usize {
        self.list_manifest_calls.load(Ordering::SeqCst)
    }

    /// Number of `load_manifest` calls served.
    pub fn load_manifest_calls(&self) -> usize {
        self.load_manifest_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_files` calls served.
    pub fn list_files_calls(&self) -> usize {
        self.list_files_calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self) -> Result<()> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(GuardError::Internal(
                "injected transient store failure".to_string(),
            ));
        }
        Ok(())
    }

    fn in_scope(stored: &StoredManifest, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Projects(ids) => stored
                .scope_tag
                .as_ref()
                .map(|tag| ids.contains(tag))
                .unwrap_or(false),
            Scope::Dataset(id) => stored.scope_tag.as_deref() == Some(id.as_str()),
        }
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn list_manifests(&self, component: &str, scope: &Scope) -> Result<Vec<ManifestId>> {
        self.list_manifest_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        let manifests = self.manifests.read().expect("store poisoned");
        let mut ids: Vec<ManifestId> = manifests
            .iter()
            .filter(|(_, stored)| stored.component == component && Self::in_scope(stored, scope))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn load_manifest(&self, id: &ManifestId) -> Result<Manifest> {
        self.load_manifest_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.manifests
            .read()
            .expect("store poisoned")
            .get(id)
            .map(|stored| stored.manifest.clone())
            .ok_or_else(|| GuardError::resolver(format!("manifest '{id}' not found")))
    }

    async fn list_files(&self, dataset_scope: &str) -> Result<Vec<(String, String)>> {
        self.list_files_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        Ok(self
            .files
            .read()
            .expect("store poisoned")
            .get(dataset_scope)
            .map(|listing| listing.as_ref().clone())
            .unwrap_or_default())
    }
}
