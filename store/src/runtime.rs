//! Shared collaborators for the caches, behind the development-mode guard.

use std::rc::Rc;

use tracing::{debug, error};

use crate::core::path::{NormalizedPath, PathNormalizer, TrailingSlashNormalizer};
use crate::core::types::PageProps;
use crate::emitter::Emitter;
use crate::error::StoreError;
use crate::io::config::ExecutionMode;
use crate::io::registry::PathRegistry;
use crate::io::source::DataSource;

/// Refuse to operate outside development mode.
pub fn ensure_development(mode: ExecutionMode) -> Result<(), StoreError> {
    match mode {
        ExecutionMode::Development => Ok(()),
        ExecutionMode::Production => {
            error!(
                mode = mode.as_str(),
                "refusing to start development-only store"
            );
            Err(StoreError::Misconfigured {
                mode: mode.as_str(),
            })
        }
    }
}

/// Collaborators shared by every cache instance of one view tree.
///
/// Only obtainable through [`Runtime::new`], so no cache can subscribe or
/// register in production mode.
#[derive(Clone)]
pub struct Runtime {
    source: Rc<dyn DataSource>,
    registry: Rc<dyn PathRegistry>,
    emitter: Rc<Emitter>,
    normalizer: Rc<dyn PathNormalizer>,
}

impl Runtime {
    /// Check `mode` first; nothing else is touched when it fails.
    pub fn new(
        mode: ExecutionMode,
        source: Rc<dyn DataSource>,
        registry: Rc<dyn PathRegistry>,
        emitter: Rc<Emitter>,
    ) -> Result<Self, StoreError> {
        ensure_development(mode)?;
        debug!("store runtime initialized");
        Ok(Self {
            source,
            registry,
            emitter,
            normalizer: Rc::new(TrailingSlashNormalizer),
        })
    }

    /// Replace the default trailing-slash normalizer.
    pub fn with_normalizer(mut self, normalizer: Rc<dyn PathNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn source(&self) -> &Rc<dyn DataSource> {
        &self.source
    }

    pub fn registry(&self) -> &Rc<dyn PathRegistry> {
        &self.registry
    }

    pub fn emitter(&self) -> &Rc<Emitter> {
        &self.emitter
    }

    pub fn normalize(&self, raw: &str) -> NormalizedPath {
        self.normalizer.normalize(raw)
    }

    /// Resolved path for `props`: the normalized page path, if any.
    pub fn resolve_path(&self, props: &PageProps) -> Option<NormalizedPath> {
        props
            .page_resources
            .as_ref()
            .and_then(|res| res.page.as_ref())
            .map(|page| self.normalize(&page.path))
    }
}
