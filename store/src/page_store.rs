//! Path-keyed query cache for the page currently on screen.
//!
//! A [`PathQueryCache`] is the live counterpart of one mounted page view. It
//! keeps exactly one path registered with the interest registry, re-pulls the
//! path-keyed results on every broadcast, and re-renders only when its own
//! slice of data (or its routing inputs) changed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::core::decision::{PageFrame, RenderReason, page_render_reason};
use crate::core::merge::page_view;
use crate::core::params::extract_params;
use crate::core::path::NormalizedPath;
use crate::core::types::{PageProps, PageView, PathResultMap};
use crate::emitter::SubscriptionId;
use crate::runtime::Runtime;

/// Rendering collaborator receiving each new page view.
pub trait PageRenderer {
    fn render(&self, view: &PageView);
}

impl<F> PageRenderer for F
where
    F: Fn(&PageView),
{
    fn render(&self, view: &PageView) {
        self(view);
    }
}

struct PageState {
    props: PageProps,
    /// Resolved path, which is also the single registered path.
    path: Option<NormalizedPath>,
    results: PathResultMap,
    view: PageView,
    render_count: usize,
}

struct PageInner {
    runtime: Runtime,
    renderer: Rc<dyn PageRenderer>,
    state: RefCell<PageState>,
}

/// Query cache bound to one mounted page view.
///
/// Dropping the cache unmounts it: the registered path is withdrawn and the
/// broadcast subscription removed.
pub struct PathQueryCache {
    inner: Rc<PageInner>,
    subscription: SubscriptionId,
}

impl PathQueryCache {
    /// Mount a page view: register its path, subscribe, and render once.
    pub fn mount(runtime: &Runtime, props: PageProps, renderer: Rc<dyn PageRenderer>) -> Self {
        let inner = Rc::new(PageInner {
            runtime: runtime.clone(),
            renderer,
            state: RefCell::new(PageState {
                props,
                path: None,
                results: runtime.source().path_results(),
                view: PageView::Placeholder,
                render_count: 0,
            }),
        });

        let path = {
            let state = inner.state.borrow();
            runtime.resolve_path(&state.props)
        };
        inner.transition_to(path);

        let weak: Weak<PageInner> = Rc::downgrade(&inner);
        let subscription = runtime.emitter().on_any(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_broadcast(event);
            }
        });

        inner.render();
        Self {
            inner,
            subscription,
        }
    }

    /// Reconcile new props: move the registration first, then decide whether
    /// to render.
    pub fn update_props(&self, props: PageProps) {
        let new_path = self.inner.runtime.resolve_path(&props);
        let previous = {
            let mut state = self.inner.state.borrow_mut();
            let location = Rc::clone(&state.props.location);
            let path = state.path.clone();
            state.props = props;
            (location, path)
        };
        self.inner.transition_to(new_path);

        let reason = {
            let state = self.inner.state.borrow();
            page_render_reason(
                &PageFrame {
                    location: &previous.0,
                    path: previous.1.as_ref(),
                    results: &state.results,
                },
                &PageFrame {
                    location: &state.props.location,
                    path: state.path.as_ref(),
                    results: &state.results,
                },
            )
        };
        self.inner.render_if(reason);
    }

    /// Unmount explicitly; equivalent to dropping.
    pub fn unmount(self) {}

    /// The view produced by the last render.
    pub fn view(&self) -> PageView {
        self.inner.state.borrow().view.clone()
    }

    pub fn render_count(&self) -> usize {
        self.inner.state.borrow().render_count
    }

    /// The path currently registered by this instance.
    pub fn registered_path(&self) -> Option<NormalizedPath> {
        self.inner.state.borrow().path.clone()
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }
}

impl Drop for PathQueryCache {
    fn drop(&mut self) {
        let path = self.inner.state.borrow_mut().path.take();
        self.inner.runtime.registry().unregister_path(path.as_ref());
        self.inner.runtime.emitter().off(self.subscription);
        debug!(path = ?path, "page cache unmounted");
    }
}

impl PageInner {
    /// The only place registrations change: unregister the old path, then
    /// register the new one. No-op when the path is unchanged.
    fn transition_to(&self, new_path: Option<NormalizedPath>) {
        let old_path = {
            let state = self.state.borrow();
            if state.path == new_path {
                return;
            }
            state.path.clone()
        };
        let registry = self.runtime.registry();
        registry.unregister_path(old_path.as_ref());
        registry.register_path(new_path.as_ref());
        debug!(from = ?old_path, to = ?new_path, "registered path moved");
        self.state.borrow_mut().path = new_path;
    }

    fn on_broadcast(&self, event: &str) {
        let fresh = self.runtime.source().path_results();
        let reason = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let previous = std::mem::replace(&mut state.results, fresh);
            let path = state.path.as_ref();
            page_render_reason(
                &PageFrame {
                    location: &state.props.location,
                    path,
                    results: &previous,
                },
                &PageFrame {
                    location: &state.props.location,
                    path,
                    results: &state.results,
                },
            )
        };
        trace!(event, ?reason, "page cache refreshed");
        self.render_if(reason);
    }

    fn render_if(&self, reason: Option<RenderReason>) {
        match reason {
            Some(reason) => {
                debug!(?reason, "page re-render");
                self.render();
            }
            None => trace!("page render skipped"),
        }
    }

    fn render(&self) {
        let view = {
            let mut state = self.state.borrow_mut();
            let props = &state.props;
            let page_context = props.page_context();
            let params = extract_params(props.route_path.as_deref(), &props.props, page_context);
            let entry = state.path.as_ref().and_then(|path| state.results.get(path));
            let view = page_view(
                &props.props,
                entry.map(|entry| entry.as_ref()),
                page_context,
                &params,
            );
            if view.is_placeholder() {
                debug!(path = ?state.path, "no result yet, rendering placeholder");
            }
            state.view = view.clone();
            state.render_count += 1;
            view
        };
        self.renderer.render(&view);
    }
}
