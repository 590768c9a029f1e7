//! Test-only helpers: recording collaborators and prop builders.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::path::{NormalizedPath, PathNormalizer, TrailingSlashNormalizer};
use crate::core::types::{Location, PageProps, PageResources, PageView};
use crate::emitter::Emitter;
use crate::io::config::ExecutionMode;
use crate::io::registry::{InterestRegistry, PathRegistry};
use crate::io::results_dir::{STATIC_DIR, page_result_file};
use crate::io::source::MemorySource;
use crate::page_store::PageRenderer;
use crate::runtime::Runtime;

/// Normalize with the default normalizer.
pub fn path(raw: &str) -> NormalizedPath {
    TrailingSlashNormalizer.normalize(raw)
}

/// Props for a page at `raw` with a fresh location.
pub fn page_props(raw: &str) -> PageProps {
    PageProps::new(Location::new(raw), Some(PageResources::for_path(raw)))
}

/// One registry call, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register(Option<NormalizedPath>),
    Unregister(Option<NormalizedPath>),
}

/// Registry that records every call and forwards to an [`InterestRegistry`].
#[derive(Default)]
pub struct RecordingRegistry {
    pub calls: RefCell<Vec<RegistryCall>>,
    pub interest: InterestRegistry,
    /// Largest number of distinct registered paths seen at once.
    pub max_active: RefCell<usize>,
}

impl RecordingRegistry {
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.borrow().clone()
    }

    pub fn max_active(&self) -> usize {
        *self.max_active.borrow()
    }

    fn note_active(&self) {
        let active = self.interest.active_paths().len();
        let mut max = self.max_active.borrow_mut();
        if active > *max {
            *max = active;
        }
    }
}

impl PathRegistry for RecordingRegistry {
    fn register_path(&self, path: Option<&NormalizedPath>) {
        self.calls
            .borrow_mut()
            .push(RegistryCall::Register(path.cloned()));
        self.interest.register_path(path);
        self.note_active();
    }

    fn unregister_path(&self, path: Option<&NormalizedPath>) {
        self.calls
            .borrow_mut()
            .push(RegistryCall::Unregister(path.cloned()));
        self.interest.unregister_path(path);
        self.note_active();
    }
}

/// Renderer that keeps every view it was handed.
#[derive(Default)]
pub struct RecordingRenderer {
    views: RefCell<Vec<PageView>>,
}

impl RecordingRenderer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn views(&self) -> Vec<PageView> {
        self.views.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.views.borrow().len()
    }

    pub fn last(&self) -> Option<PageView> {
        self.views.borrow().last().cloned()
    }
}

impl PageRenderer for RecordingRenderer {
    fn render(&self, view: &PageView) {
        self.views.borrow_mut().push(view.clone());
    }
}

/// Collaborators wired into a development-mode runtime.
pub struct Harness {
    pub source: Rc<MemorySource>,
    pub registry: Rc<RecordingRegistry>,
    pub emitter: Rc<Emitter>,
    pub runtime: Runtime,
}

impl Harness {
    pub fn new() -> Self {
        let source = Rc::new(MemorySource::new());
        let registry = Rc::new(RecordingRegistry::default());
        let emitter = Rc::new(Emitter::new());
        let runtime = Runtime::new(
            ExecutionMode::Development,
            source.clone(),
            registry.clone(),
            emitter.clone(),
        )
        .expect("development runtime");
        Self {
            source,
            registry,
            emitter,
            runtime,
        }
    }

    /// Store a page result and fire the broadcast signal.
    pub fn publish_page(&self, raw: &str, payload: Value) {
        self.source.set_path_result(path(raw), payload);
        self.emitter.emit("page-query-result");
    }

    /// Store a static result and fire the broadcast signal.
    pub fn publish_static(&self, query_id: &str, payload: Value) {
        self.source.set_static_result(query_id, payload);
        self.emitter.emit("static-query-result");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Temporary results directory with page and static writers.
pub struct TempResults {
    dir: TempDir,
}

impl TempResults {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp results dir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_page(&self, raw: &str, payload: &Value) -> Result<()> {
        let file = page_result_file(self.path(), &path(raw));
        write_json(&file, payload)
    }

    pub fn write_static(&self, query_id: &str, payload: &Value) -> Result<()> {
        let file = self
            .path()
            .join(STATIC_DIR)
            .join(format!("{query_id}.json"));
        write_json(&file, payload)
    }
}

fn write_json(file: &Path, payload: &Value) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(file, payload.to_string()).with_context(|| format!("write {}", file.display()))
}
