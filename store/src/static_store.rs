//! Global cache for static (path-independent) query results.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::context::{ContextReader, StaticQueryContext};
use crate::core::decision::global_snapshot_changed;
use crate::core::types::GlobalSnapshot;
use crate::emitter::SubscriptionId;
use crate::runtime::Runtime;

struct StaticInner {
    runtime: Runtime,
    snapshot: RefCell<GlobalSnapshot>,
    context: StaticQueryContext,
    render_count: Cell<usize>,
}

/// Root-level cache distributing the static-query snapshot to descendants.
///
/// Every broadcast pulls a whole new snapshot; a new reference is always
/// redistributed. Dropping the cache unsubscribes it.
pub struct GlobalQueryCache {
    inner: Rc<StaticInner>,
    subscription: SubscriptionId,
}

impl GlobalQueryCache {
    pub fn mount(runtime: &Runtime) -> Self {
        let snapshot = runtime.source().global_results();
        let inner = Rc::new(StaticInner {
            runtime: runtime.clone(),
            context: StaticQueryContext::new(Rc::clone(&snapshot)),
            snapshot: RefCell::new(snapshot),
            render_count: Cell::new(1),
        });

        let weak: Weak<StaticInner> = Rc::downgrade(&inner);
        let subscription = runtime.emitter().on_any(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_broadcast(event);
            }
        });
        debug!(subscription, "static cache mounted");

        Self {
            inner,
            subscription,
        }
    }

    /// Provider handle descendants read from.
    pub fn context(&self) -> &StaticQueryContext {
        &self.inner.context
    }

    /// Shorthand for `context().reader()`.
    pub fn reader(&self) -> ContextReader {
        self.inner.context.reader()
    }

    pub fn snapshot(&self) -> GlobalSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Unmount explicitly; equivalent to dropping.
    pub fn unmount(self) {}
}

impl Drop for GlobalQueryCache {
    fn drop(&mut self) {
        self.inner.runtime.emitter().off(self.subscription);
        debug!(subscription = self.subscription, "static cache unmounted");
    }
}

impl StaticInner {
    fn on_broadcast(&self, event: &str) {
        let fresh = self.runtime.source().global_results();
        let changed = global_snapshot_changed(&self.snapshot.borrow(), &fresh);
        if !changed {
            trace!(event, "static snapshot unchanged");
            return;
        }
        *self.snapshot.borrow_mut() = Rc::clone(&fresh);
        self.render_count.set(self.render_count.get() + 1);
        debug!(event, "static snapshot redistributed");
        self.context.provide(fresh);
    }
}
