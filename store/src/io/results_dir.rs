//! On-disk results directory written by the query runner.
//!
//! Layout:
//!
//! ```text
//! <results>/
//! ├── pages/
//! │   ├── result.json            -> "/"
//! │   └── blog/
//! │       └── hello/result.json  -> "/blog/hello"
//! └── static/
//!     └── <query-id>.json        -> static query "<query-id>"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path};

use serde_json::Value;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::path::{NormalizedPath, PathNormalizer, TrailingSlashNormalizer};
use crate::error::StoreError;

pub const PAGES_DIR: &str = "pages";
pub const STATIC_DIR: &str = "static";
pub const PAGE_RESULT_FILE: &str = "result.json";

/// Raw results read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedResults {
    pub pages: HashMap<NormalizedPath, Value>,
    pub statics: BTreeMap<String, Value>,
}

/// Read every page and static result below `dir`.
///
/// Missing `pages/` or `static/` directories count as empty.
pub fn load_results_dir(dir: &Path) -> Result<LoadedResults, StoreError> {
    let mut loaded = LoadedResults::default();

    let pages_dir = dir.join(PAGES_DIR);
    if pages_dir.is_dir() {
        for entry in WalkDir::new(&pages_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| StoreError::ResultsWalk {
                path: pages_dir.clone(),
                source,
            })?;
            if !entry.file_type().is_file() || entry.file_name() != PAGE_RESULT_FILE {
                continue;
            }
            let Some(page_path) = page_path_for(&pages_dir, entry.path()) else {
                continue;
            };
            let payload = read_json(entry.path())?;
            trace!(path = %page_path, "page result loaded");
            loaded.pages.insert(page_path, payload);
        }
    }

    let static_dir = dir.join(STATIC_DIR);
    if static_dir.is_dir() {
        for entry in WalkDir::new(&static_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| StoreError::ResultsWalk {
                path: static_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some("json")
            {
                continue;
            }
            let Some(query_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let payload = read_json(path)?;
            trace!(query_id, "static result loaded");
            loaded.statics.insert(query_id.to_string(), payload);
        }
    }

    debug!(
        dir = %dir.display(),
        pages = loaded.pages.len(),
        statics = loaded.statics.len(),
        "results directory loaded"
    );
    Ok(loaded)
}

/// Map `<pages>/a/b/result.json` to the normalized path `/a/b`.
pub fn page_path_for(pages_dir: &Path, result_file: &Path) -> Option<NormalizedPath> {
    let rel = result_file.strip_prefix(pages_dir).ok()?.parent()?;
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            _ => return None,
        }
    }
    let raw = format!("/{}", segments.join("/"));
    Some(TrailingSlashNormalizer.normalize(&raw))
}

/// Where the result for `path` lives below `dir`.
pub fn page_result_file(dir: &Path, path: &NormalizedPath) -> std::path::PathBuf {
    let mut file = dir.join(PAGES_DIR);
    for segment in path.as_str().split('/').filter(|s| !s.is_empty()) {
        file.push(segment);
    }
    file.join(PAGE_RESULT_FILE)
}

fn read_json(path: &Path) -> Result<Value, StoreError> {
    let contents = fs::read_to_string(path).map_err(|source| StoreError::ResultsIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| StoreError::ResultsJson {
        path: path.to_path_buf(),
        source,
    })
}
