//! Cross-manifest resolution against the remote asset store.
//!
//! The asset store is an injected capability: the engine only knows it as "a
//! key-value metadata store keyed by identifiers, queryable by scope". That
//! keeps the core logic testable against an in-memory fake without any
//! network dependency.
//!
//! Remote lookups are the only operations in the engine instrumented with
//! timeouts and retries: idempotent reads are retried a small fixed number of
//! times with exponential backoff, and exhaustion or timeout surfaces as a
//! `GuardError::Resolver`: "I don't know if this is valid", never "this is
//! invalid".

mod in_memory;

pub use in_memory::InMemoryAssetStore;

use crate::error::{GuardError, Result};
use crate::manifest::Manifest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Identifier of a stored manifest.
pub type ManifestId = String;

/// The set of projects/datasets considered when resolving comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Restrict to manifests within the given projects
    Projects(Vec<String>),
    /// Restrict to one dataset
    Dataset(String),
    /// Everything the caller can access
    All,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Projects(ids) => write!(f, "projects[{}]", ids.join(",")),
            Scope::Dataset(id) => write!(f, "dataset[{id}]"),
            Scope::All => f.write_str("all"),
        }
    }
}

/// The asset-store collaborator interface, consumed but not implemented here.
#[async_trait]
pub trait AssetStore: fmt::Debug + Send + Sync {
    /// Enumerates manifests of `component` visible within `scope`.
    async fn list_manifests(&self, component: &str, scope: &Scope) -> Result<Vec<ManifestId>>;

    /// Loads one manifest by identifier.
    async fn load_manifest(&self, id: &ManifestId) -> Result<Manifest>;

    /// Lists `(entity id, path)` pairs for a dataset scope.
    async fn list_files(&self, dataset_scope: &str) -> Result<Vec<(String, String)>>;
}

/// One source manifest's contribution to a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// The manifest the values came from
    pub manifest_id: ManifestId,
    /// Non-null values of the target attribute, in row order
    pub values: Vec<String>,
}

/// Resolver with a per-run memoizing cache.
///
/// One resolver instance is scoped to one orchestrator invocation, so
/// repeated rules against the same `(component, attribute)` pair fetch the
/// remote data once.
#[derive(Debug)]
pub struct CrossManifestResolver {
    store: Arc<dyn AssetStore>,
    scope: Scope,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
    columns: RwLock<HashMap<(String, String), Arc<Vec<ResolvedColumn>>>>,
    listings: RwLock<HashMap<String, Arc<Vec<(String, String)>>>>,
}

impl CrossManifestResolver {
    /// Creates a resolver over the given store with default limits
    /// (30s timeout, 3 attempts, 250ms backoff base).
    ///
    /// Accepts both a concrete `Arc<SomeStore>` and an already type-erased
    /// `Arc<dyn AssetStore>`.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            scope: Scope::All,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(250),
            columns: RwLock::new(HashMap::new()),
            listings: RwLock::new(HashMap::new()),
        }
    }

    /// Restricts resolution to a scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of attempts per read (minimum 1) and the backoff base.
    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff_base = backoff_base;
        self
    }

    /// The scope this resolver operates in.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Resolves the comparison columns for `component.attribute`.
    ///
    /// Zero target manifests is not an error: the comparison set is simply
    /// empty, and the match executors define their trivial outcomes over it.
    #[instrument(skip(self), fields(component = %component, attribute = %attribute, scope = %self.scope))]
    pub async fn resolve(
        &self,
        component: &str,
        attribute: &str,
    ) -> Result<Arc<Vec<ResolvedColumn>>> {
        let key = (component.to_string(), attribute.to_string());
        if let Some(cached) = self.columns.read().await.get(&key) {
            debug!("comparison columns served from memo cache");
            return Ok(Arc::clone(cached));
        }

        let ids = self
            .retrying("list_manifests", || {
                self.store.list_manifests(component, &self.scope)
            })
            .await?;

        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let manifest = self
                .retrying("load_manifest", || self.store.load_manifest(&id))
                .await?;
            // A source manifest without the target column contributes no
            // values but still counts as a manifest for set comparisons.
            let values = match manifest.column_values(attribute) {
                Ok(cells) => cells.into_iter().filter_map(|(_, v)| v).collect(),
                Err(GuardError::ColumnNotFound { .. }) => Vec::new(),
                Err(other) => return Err(other),
            };
            resolved.push(ResolvedColumn {
                manifest_id: id,
                values,
            });
        }

        let resolved = Arc::new(resolved);
        self.columns
            .write()
            .await
            .insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Resolves the `(entity id, path)` file listing for a dataset scope.
    #[instrument(skip(self), fields(dataset = %dataset_scope))]
    pub async fn file_listing(&self, dataset_scope: &str) -> Result<Arc<Vec<(String, String)>>> {
        if let Some(cached) = self.listings.read().await.get(dataset_scope) {
            debug!("file listing served from memo cache");
            return Ok(Arc::clone(cached));
        }

        let listing = Arc::new(
            self.retrying("list_files", || self.store.list_files(dataset_scope))
                .await?,
        );
        self.listings
            .write()
            .await
            .insert(dataset_scope.to_string(), Arc::clone(&listing));
        Ok(listing)
    }

    /// Runs one idempotent read with timeout and bounded backoff retry.
    async fn retrying<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_message = String::new();
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_base * 2u32.pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            }
            match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    warn!(
                        operation = %operation,
                        attempt = attempt + 1,
                        error = %e,
                        "asset store read failed"
                    );
                    last_message = e.to_string();
                }
                Err(_) => {
                    return Err(GuardError::resolver_timeout(format!(
                        "{operation} timed out after {:?}",
                        self.timeout
                    )));
                }
            }
        }
        Err(GuardError::resolver(format!(
            "{operation} failed after {} attempts: {last_message}",
            self.max_retries
        )))
    }
}
