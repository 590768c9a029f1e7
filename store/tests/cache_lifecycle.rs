//! Lifecycle tests for mounted page and static caches.
//!
//! These drive caches through mount, prop updates, broadcasts, and unmount
//! against recording collaborators, checking registrations and renders.

use std::rc::Rc;

use query_result_store::core::types::{Location, PageProps, PageView};
use query_result_store::emitter::Emitter;
use query_result_store::error::StoreError;
use query_result_store::io::config::ExecutionMode;
use query_result_store::io::source::MemorySource;
use query_result_store::test_support::{
    Harness, RecordingRegistry, RecordingRenderer, RegistryCall, page_props, path,
};
use query_result_store::{GlobalQueryCache, PathQueryCache, Runtime};
use serde_json::{Map, json};

/// Verifies navigation across three pages with one mounted view.
///
/// ```text
/// mount /a -> update /b -> update /c/ -> unmount
/// ```
///
/// At no point is more than one path registered, and the final state has
/// nothing registered.
#[test]
fn navigation_keeps_one_registration_and_cleans_up() {
    let h = Harness::new();
    let renderer = RecordingRenderer::new();

    let cache = PathQueryCache::mount(&h.runtime, page_props("/a"), renderer.clone());
    cache.update_props(page_props("/b"));
    cache.update_props(page_props("/c/"));
    assert_eq!(cache.registered_path(), Some(path("/c")));
    cache.unmount();

    assert_eq!(
        h.registry.calls(),
        vec![
            RegistryCall::Unregister(None),
            RegistryCall::Register(Some(path("/a"))),
            RegistryCall::Unregister(Some(path("/a"))),
            RegistryCall::Register(Some(path("/b"))),
            RegistryCall::Unregister(Some(path("/b"))),
            RegistryCall::Register(Some(path("/c"))),
            RegistryCall::Unregister(Some(path("/c"))),
        ]
    );
    assert_eq!(h.registry.max_active(), 1);
    assert!(h.registry.interest.active_paths().is_empty());
    assert_eq!(h.emitter.listener_count(), 0);
    assert_eq!(renderer.count(), 3);
}

/// Verifies `/docs/` and `/docs` resolve to one registration.
#[test]
fn trailing_slash_variants_share_one_registration() {
    let h = Harness::new();
    let renderer = RecordingRenderer::new();
    let cache = PathQueryCache::mount(&h.runtime, page_props("/docs/"), renderer.clone());

    let props = page_props("/docs");
    cache.update_props(props);

    // Only the first mount touched the registry.
    assert_eq!(h.registry.calls().len(), 2);
    assert_eq!(cache.registered_path(), Some(path("/docs")));
}

/// Verifies a mounted page ignores results for other paths.
///
/// Page results for `/b` and a static broadcast leave the `/a` view alone;
/// a new result for `/a/` renders once with the fresh payload.
#[test]
fn unrelated_result_does_not_rerender() {
    let h = Harness::new();
    h.source.set_path_result(path("/a"), json!({ "v": 1 }));
    let renderer = RecordingRenderer::new();
    let _cache = PathQueryCache::mount(&h.runtime, page_props("/a"), renderer.clone());
    assert_eq!(renderer.count(), 1);

    h.publish_page("/b", json!({ "v": 2 }));
    h.publish_static("site", json!({ "title": "x" }));
    assert_eq!(renderer.count(), 1);

    h.publish_page("/a/", json!({ "v": 3 }));
    assert_eq!(renderer.count(), 2);
    let last = renderer.last().unwrap_or(PageView::Placeholder);
    assert_eq!(last.props().and_then(|p| p.get("v")), Some(&json!(3)));
}

/// Verifies the placeholder is replaced once the first result lands.
#[test]
fn placeholder_until_result_arrives() {
    let h = Harness::new();
    let renderer = RecordingRenderer::new();
    let cache = PathQueryCache::mount(&h.runtime, page_props("/late"), renderer.clone());
    assert!(cache.view().is_placeholder());

    h.publish_page("/late", json!({ "ready": true }));
    let mut ready = Map::new();
    ready.insert("ready".to_string(), json!(true));
    assert_eq!(
        renderer.views(),
        vec![PageView::Placeholder, PageView::Page(ready)]
    );
}

/// Verifies re-rendering keys on location identity, not on the path string.
#[test]
fn new_location_rerenders_even_with_same_path() {
    let h = Harness::new();
    let renderer = RecordingRenderer::new();
    let props = page_props("/a");
    let cache = PathQueryCache::mount(&h.runtime, props.clone(), renderer.clone());

    // Same location reference: nothing to do.
    cache.update_props(props.clone());
    assert_eq!(renderer.count(), 1);

    let mut moved = props;
    moved.location = Rc::new(Location {
        hash: "#top".to_string(),
        ..Location::new("/a")
    });
    cache.update_props(moved);
    assert_eq!(renderer.count(), 2);
}

/// Verifies route params and page context reach the rendered props.
///
/// Collection data replaces the entry's own `data` field.
#[test]
fn route_params_and_context_merge_into_view() {
    let h = Harness::new();
    let entry = json!({ "name": "Ada", "data": "entry" });
    h.source.set_path_result(path("/users/42"), entry);

    let mut props = page_props("/users/42");
    props.route_path = Some("/users/:id".to_string());
    props.props.insert("id".to_string(), json!("42"));
    if let Some(resources) = props.page_resources.as_mut() {
        resources
            .page_context
            .insert("__collectionData".to_string(), json!([1, 2]));
    }

    let renderer = RecordingRenderer::new();
    let cache = PathQueryCache::mount(&h.runtime, props, renderer.clone());
    let view = cache.view();
    let merged = view.props().expect("page view");

    assert_eq!(merged.get("name"), Some(&json!("Ada")));
    assert_eq!(merged.get("id"), Some(&json!("42")));
    // Collection data overrides the entry's own `data`.
    assert_eq!(merged.get("data"), Some(&json!([1, 2])));
}

/// Verifies a page without resources mounts without registering.
#[test]
fn props_without_page_resources_register_nothing() {
    let h = Harness::new();
    let renderer = RecordingRenderer::new();
    let props = PageProps::new(Location::new("/x"), None);
    let cache = PathQueryCache::mount(&h.runtime, props, renderer.clone());

    assert_eq!(cache.registered_path(), None);
    assert!(cache.view().is_placeholder());
    assert!(h.registry.interest.active_paths().is_empty());
}

/// Verifies the static cache redistributes on page and static broadcasts.
#[test]
fn static_cache_redistributes_on_every_broadcast() {
    let h = Harness::new();
    let statics = GlobalQueryCache::mount(&h.runtime);
    let reader = statics.reader();

    h.publish_page("/a", json!({}));
    assert_eq!(statics.render_count(), 2);

    h.publish_static("site", json!({ "title": "Docs" }));
    assert_eq!(statics.render_count(), 3);
    assert_eq!(
        reader.static_query("site"),
        Some(json!({ "title": "Docs" }))
    );
}

/// Verifies caches sharing one emitter stay independent.
///
/// Each page only re-renders for its own path, and dropping one cache leaves
/// the other registered and subscribed.
#[test]
fn two_pages_and_static_cache_share_one_emitter() {
    let h = Harness::new();
    let statics = GlobalQueryCache::mount(&h.runtime);
    let a = RecordingRenderer::new();
    let b = RecordingRenderer::new();
    let cache_a = PathQueryCache::mount(&h.runtime, page_props("/a"), a.clone());
    let cache_b = PathQueryCache::mount(&h.runtime, page_props("/b"), b.clone());
    assert_eq!(h.emitter.listener_count(), 3);

    h.publish_page("/b", json!({ "n": 1 }));
    assert_eq!((a.count(), b.count()), (1, 2));

    drop(cache_b);
    assert_eq!(h.registry.interest.active_paths(), vec![path("/a")]);
    h.publish_page("/a", json!({ "n": 2 }));
    assert_eq!((a.count(), b.count()), (2, 2));

    drop(cache_a);
    statics.unmount();
    assert_eq!(h.emitter.listener_count(), 0);
}

/// Verifies production mode fails before any registration or subscription.
#[test]
fn production_mode_sets_nothing_up() {
    let registry = Rc::new(RecordingRegistry::default());
    let emitter = Rc::new(Emitter::new());
    let result = Runtime::new(
        ExecutionMode::Production,
        Rc::new(MemorySource::new()),
        registry.clone(),
        emitter.clone(),
    );

    assert!(matches!(result, Err(StoreError::Misconfigured { .. })));
    assert!(registry.calls().is_empty());
    assert_eq!(emitter.listener_count(), 0);
}
