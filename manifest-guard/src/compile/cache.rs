//! Explicit cache for compiled validation schemas.
//!
//! Compiled schemas are memoized per `(graph fingerprint, component)` for the
//! duration of one process invocation. The cache is an owned object (no
//! process-lifetime module state), so the orchestrator controls its lifetime
//! and invalidation explicitly.

use super::schema::{compile, ValidationSchema};
use crate::error::Result;
use crate::schema::AttributeGraph;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache keyed by `(graph fingerprint, component)`.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<(String, String), Arc<ValidationSchema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled schema for `(graph, component)`, compiling and
    /// storing it on first request.
    ///
    /// A changed graph has a changed fingerprint, so stale entries are never
    /// served; they linger until [`invalidate`](Self::invalidate) removes
    /// them.
    pub async fn get_or_compile(
        &self,
        graph: &AttributeGraph,
        component: &str,
    ) -> Result<Arc<ValidationSchema>> {
        let key = (graph.fingerprint(), component.to_string());

        if let Some(schema) = self.entries.read().await.get(&key) {
            debug!(component = %component, "validation schema cache hit");
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(compile(graph, component)?);
        self.entries
            .write()
            .await
            .insert(key, Arc::clone(&schema));
        debug!(component = %component, "validation schema compiled and cached");
        Ok(schema)
    }

    /// Drops every entry compiled from the graph with the given fingerprint.
    pub async fn invalidate(&self, graph_fingerprint: &str) {
        self.entries
            .write()
            .await
            .retain(|(fp, _), _| fp != graph_fingerprint);
    }

    /// Number of cached schemas.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
