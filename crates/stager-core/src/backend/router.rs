use std::{collections::HashMap, sync::Arc};

use stager_model::Lifecycle;
use thiserror::Error;
use tracing::debug;

use super::Backend;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("task domain {0:?} is already registered")]
    DuplicateDomain(String),

    #[error("lifecycle {0} is already registered")]
    DuplicateLifecycle(Lifecycle),
}

/// Backends indexed by task domain (watch path) and by lifecycle tag (HTTP path).
///
/// Filled once at startup, then shared read-only.
#[derive(Default, Clone)]
pub struct BackendRouter {
    by_domain: HashMap<String, Arc<dyn Backend>>,
    by_lifecycle: HashMap<Lifecycle, Arc<dyn Backend>>,
}

impl BackendRouter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn Backend>) -> Result<(), RouterError> {
        let domain = backend.task_domain().to_string();
        let lifecycle = backend.lifecycle();

        if self.by_domain.contains_key(&domain) {
            return Err(RouterError::DuplicateDomain(domain));
        }
        if self.by_lifecycle.contains_key(&lifecycle) {
            return Err(RouterError::DuplicateLifecycle(lifecycle));
        }

        debug!(%lifecycle, %domain, "backend registered");
        self.by_domain.insert(domain, Arc::clone(&backend));
        self.by_lifecycle.insert(lifecycle, backend);
        Ok(())
    }

    /// Chained form of [`BackendRouter::register`].
    pub fn with(mut self, backend: Arc<dyn Backend>) -> Result<Self, RouterError> {
        self.register(backend)?;
        Ok(self)
    }

    pub fn for_domain(&self, domain: &str) -> Option<&Arc<dyn Backend>> {
        self.by_domain.get(domain)
    }

    /// Backend for an annotation lifecycle tag; unknown tags yield `None`.
    pub fn for_lifecycle(&self, tag: &str) -> Option<&Arc<dyn Backend>> {
        let lifecycle: Lifecycle = tag.parse().ok()?;
        self.by_lifecycle.get(&lifecycle)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.by_domain.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}

impl std::fmt::Debug for BackendRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRouter")
            .field("domains", &self.by_domain.keys().collect::<Vec<_>>())
            .finish()
    }
}
