//! Data source collaborators: where the caches pull results from.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::path::NormalizedPath;
use crate::core::types::{GlobalSnapshot, PathResultMap, ResultPayload};
use crate::error::StoreError;
use crate::io::results_dir::{LoadedResults, load_results_dir};

/// Synchronous, side-effect free snapshot reads.
pub trait DataSource {
    /// All path-keyed results known right now.
    fn path_results(&self) -> PathResultMap;

    /// The current static-query snapshot.
    fn global_results(&self) -> GlobalSnapshot;
}

/// Counts of entries touched by a sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub pages_changed: usize,
    pub statics_changed: usize,
}

impl SyncSummary {
    pub fn is_empty(&self) -> bool {
        self.pages_changed == 0 && self.statics_changed == 0
    }
}

/// In-memory data source fed by the result producer.
///
/// Writing a page result replaces only that entry's identity. Entries are
/// never removed.
#[derive(Default)]
pub struct MemorySource {
    pages: RefCell<PathResultMap>,
    statics: RefCell<Map<String, Value>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from a results directory.
    pub fn from_dir(dir: &Path) -> Result<Self, StoreError> {
        let source = Self::new();
        source.sync_from_dir(dir)?;
        Ok(source)
    }

    pub fn set_path_result(&self, path: NormalizedPath, payload: ResultPayload) {
        debug!(path = %path, "page result stored");
        self.pages.borrow_mut().insert(path, Rc::new(payload));
    }

    pub fn set_static_result(&self, query_id: impl Into<String>, payload: ResultPayload) {
        let query_id = query_id.into();
        debug!(query_id = %query_id, "static result stored");
        self.statics.borrow_mut().insert(query_id, payload);
    }

    /// Apply a fresh load, keeping the identity of entries whose content is unchanged.
    pub fn apply(&self, loaded: LoadedResults) -> SyncSummary {
        let mut summary = SyncSummary::default();

        let mut pages = self.pages.borrow_mut();
        for (path, payload) in loaded.pages {
            let unchanged = pages.get(&path).is_some_and(|entry| **entry == payload);
            if !unchanged {
                pages.insert(path, Rc::new(payload));
                summary.pages_changed += 1;
            }
        }

        let mut statics = self.statics.borrow_mut();
        for (query_id, payload) in loaded.statics {
            if statics.get(&query_id) != Some(&payload) {
                statics.insert(query_id, payload);
                summary.statics_changed += 1;
            }
        }

        debug!(
            pages_changed = summary.pages_changed,
            statics_changed = summary.statics_changed,
            "results applied"
        );
        summary
    }

    /// Re-read `dir` and apply it.
    pub fn sync_from_dir(&self, dir: &Path) -> Result<SyncSummary, StoreError> {
        let loaded = load_results_dir(dir)?;
        Ok(self.apply(loaded))
    }

    /// Known paths, sorted.
    pub fn paths(&self) -> Vec<NormalizedPath> {
        let mut paths: Vec<NormalizedPath> = self.pages.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl DataSource for MemorySource {
    fn path_results(&self) -> PathResultMap {
        self.pages.borrow().clone()
    }

    /// Every call yields a new snapshot reference.
    fn global_results(&self) -> GlobalSnapshot {
        Rc::new(Value::Object(self.statics.borrow().clone()))
    }
}
