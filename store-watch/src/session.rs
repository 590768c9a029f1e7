//! Mounted caches driven by the file watcher.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use query_result_store::core::types::PageView;
use query_result_store::io::config::StoreConfig;
use query_result_store::io::source::{MemorySource, SyncSummary};
use query_result_store::render::{RenderRequest, runtime_for_root};
use query_result_store::{GlobalQueryCache, PageRenderer, PathQueryCache, Runtime};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Broadcast fired after page results changed on disk.
pub const PAGE_RESULT_EVENT: &str = "page-query-result";
/// Broadcast fired after static results changed on disk.
pub const STATIC_RESULT_EVENT: &str = "static-query-result";

/// Receives one JSON value per rendered view.
pub type LineSink = Rc<dyn Fn(Value)>;

/// A static cache plus one page cache per watched path.
pub struct Session {
    results_dir: PathBuf,
    source: Rc<MemorySource>,
    runtime: Runtime,
    // Drop order: pages unmount before the static cache.
    pages: Vec<PathQueryCache>,
    statics: GlobalQueryCache,
}

impl Session {
    pub fn open(
        root: &Path,
        config: &StoreConfig,
        paths: &[String],
        sink: LineSink,
    ) -> Result<Self> {
        let (runtime, source) = runtime_for_root(root, config)?;

        let statics = GlobalQueryCache::mount(&runtime);
        let static_sink = Rc::clone(&sink);
        statics.reader().watch(move |snapshot| {
            static_sink(json!({ "static": (**snapshot).clone() }));
        });

        let pages = paths
            .iter()
            .map(|raw| {
                let request = RenderRequest {
                    path: raw.clone(),
                    ..RenderRequest::default()
                };
                let renderer: Rc<dyn PageRenderer> = Rc::new(PathLines {
                    path: raw.clone(),
                    sink: Rc::clone(&sink),
                });
                PathQueryCache::mount(&runtime, request.page_props(), renderer)
            })
            .collect();

        info!(pages = paths.len(), "session opened");
        Ok(Self {
            results_dir: config.results_dir_in(root),
            source,
            runtime,
            pages,
            statics,
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn static_renders(&self) -> usize {
        self.statics.render_count()
    }

    /// Re-read the results directory and broadcast what changed.
    pub fn sync(&self) -> Result<SyncSummary> {
        let summary = self.source.sync_from_dir(&self.results_dir)?;
        if summary.pages_changed > 0 {
            debug!(pages = summary.pages_changed, "broadcasting page results");
            self.runtime.emitter().emit(PAGE_RESULT_EVENT);
        }
        if summary.statics_changed > 0 {
            debug!(
                statics = summary.statics_changed,
                "broadcasting static results"
            );
            self.runtime.emitter().emit(STATIC_RESULT_EVENT);
        }
        Ok(summary)
    }
}

struct PathLines {
    path: String,
    sink: LineSink,
}

impl PageRenderer for PathLines {
    fn render(&self, view: &PageView) {
        (self.sink)(json!({ "path": self.path, "view": view_json(view) }));
    }
}

/// Placeholder views print as `null`.
pub fn view_json(view: &PageView) -> Value {
    match view {
        PageView::Placeholder => Value::Null,
        PageView::Page(props) => Value::Object(props.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    struct Fixture {
        root: tempfile::TempDir,
        config: StoreConfig,
        lines: Rc<RefCell<Vec<Value>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: tempfile::tempdir().expect("tempdir"),
                config: StoreConfig::default(),
                lines: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn open(&self, paths: &[&str]) -> Session {
            let lines = Rc::clone(&self.lines);
            let sink: LineSink = Rc::new(move |line| lines.borrow_mut().push(line));
            let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
            Session::open(self.root.path(), &self.config, &paths, sink).expect("session")
        }

        fn write(&self, relative: &str, payload: &Value) {
            let file = self.config.results_dir_in(self.root.path()).join(relative);
            fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
            fs::write(file, payload.to_string()).expect("write");
        }

        fn lines(&self) -> Vec<Value> {
            self.lines.borrow().clone()
        }
    }

    #[test]
    fn mount_prints_initial_views() {
        let fx = Fixture::new();
        fx.write("pages/a/result.json", &json!({ "n": 1 }));
        let session = fx.open(&["/a", "/b"]);

        assert_eq!(session.page_count(), 2);
        assert_eq!(
            fx.lines(),
            vec![
                json!({ "path": "/a", "view": { "n": 1 } }),
                json!({ "path": "/b", "view": null }),
            ]
        );
    }

    #[test]
    fn sync_rerenders_only_changed_paths() {
        let fx = Fixture::new();
        fx.write("pages/a/result.json", &json!({ "n": 1 }));
        let session = fx.open(&["/a", "/b"]);
        fx.lines.borrow_mut().clear();

        fx.write("pages/b/result.json", &json!({ "n": 2 }));
        let summary = session.sync().expect("sync");
        assert_eq!(summary.pages_changed, 1);

        let page_lines: Vec<Value> = fx
            .lines()
            .into_iter()
            .filter(|line| line.get("path").is_some())
            .collect();
        let expected = json!({ "path": "/b", "view": { "n": 2 } });
        assert_eq!(page_lines, vec![expected]);
        // Any broadcast redistributes the static snapshot.
        assert_eq!(session.static_renders(), 2);
    }

    #[test]
    fn unchanged_directory_broadcasts_nothing() {
        let fx = Fixture::new();
        fx.write("pages/a/result.json", &json!({ "n": 1 }));
        let session = fx.open(&["/a"]);
        fx.lines.borrow_mut().clear();

        let summary = session.sync().expect("sync");
        assert!(summary.is_empty());
        assert!(fx.lines().is_empty());
        assert_eq!(session.static_renders(), 1);
    }

    #[test]
    fn static_changes_print_snapshot() {
        let fx = Fixture::new();
        let session = fx.open(&[]);

        fx.write("static/site.json", &json!({ "title": "Docs" }));
        session.sync().expect("sync");
        assert_eq!(
            fx.lines(),
            vec![json!({ "static": { "site": { "title": "Docs" } } })]
        );
        assert_eq!(session.static_renders(), 2);
    }

    #[test]
    fn placeholder_view_is_null() {
        assert_eq!(view_json(&PageView::Placeholder), Value::Null);
    }
}
