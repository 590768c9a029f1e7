//! One-shot render helpers for `query-store render` and `query-store paths`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};

use crate::core::path::NormalizedPath;
use crate::core::types::{Location, PageProps, PageResources, PageView, Props};
use crate::emitter::Emitter;
use crate::io::config::StoreConfig;
use crate::io::registry::InterestRegistry;
use crate::io::source::MemorySource;
use crate::page_store::{PageRenderer, PathQueryCache};
use crate::runtime::{Runtime, ensure_development};

/// What to mount for a one-shot render.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Raw page path, normalized by the runtime.
    pub path: String,
    /// Declared route template such as `/users/:id`.
    pub route: Option<String>,
    pub props: Props,
    pub page_context: Map<String, Value>,
}

impl RenderRequest {
    pub fn page_props(&self) -> PageProps {
        let mut props = PageProps::new(
            Location::new(self.path.clone()),
            Some(PageResources {
                page_context: self.page_context.clone(),
                ..PageResources::for_path(self.path.clone())
            }),
        );
        props.route_path = self.route.clone();
        props.props = self.props.clone();
        props
    }
}

/// Mount a page cache for `request`, capture its first view, and unmount.
pub fn render_page(runtime: &Runtime, request: &RenderRequest) -> PageView {
    let captured = Rc::new(RefCell::new(PageView::Placeholder));
    let sink = Rc::clone(&captured);
    let renderer: Rc<dyn PageRenderer> = Rc::new(move |view: &PageView| {
        *sink.borrow_mut() = view.clone();
    });
    let cache = PathQueryCache::mount(runtime, request.page_props(), renderer);
    cache.unmount();
    captured.replace(PageView::Placeholder)
}

/// Build a runtime over the results directory configured for `root`.
///
/// The mode is checked before the results directory is read.
pub fn runtime_for_root(root: &Path, config: &StoreConfig) -> Result<(Runtime, Rc<MemorySource>)> {
    ensure_development(config.mode)?;
    let source = Rc::new(
        MemorySource::from_dir(&config.results_dir_in(root)).context("load results directory")?,
    );
    let runtime = Runtime::new(
        config.mode,
        source.clone(),
        Rc::new(InterestRegistry::new()),
        Rc::new(Emitter::new()),
    )?;
    Ok((runtime, source))
}

/// Load results for `root` and render one page.
pub fn render_from_root(
    root: &Path,
    config: &StoreConfig,
    request: &RenderRequest,
) -> Result<PageView> {
    let (runtime, _) = runtime_for_root(root, config)?;
    Ok(render_page(&runtime, request))
}

/// Normalized paths that currently have a result, sorted.
pub fn list_paths(root: &Path, config: &StoreConfig) -> Result<Vec<NormalizedPath>> {
    let (_, source) = runtime_for_root(root, config)?;
    Ok(source.paths())
}

/// Parse a `key=value` prop. The value is JSON when it parses, else a string.
pub fn parse_prop(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("prop '{raw}' must look like key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("prop '{raw}' has an empty key"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Parse a JSON object given on the command line.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("parse JSON object")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("expected a JSON object, got {other}")),
    }
}
