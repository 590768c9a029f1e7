//! Single-threaded broadcast emitter with wildcard subscriptions.
//!
//! Events carry only a name. Subscribers that need data re-read it from the
//! authoritative source, so the emitter stays ignorant of what changed.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, trace, warn};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback invoked with the emitted event name.
pub type Handler = Rc<dyn Fn(&str)>;

/// Which events a handler receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Every event (the `*` wildcard).
    Any,
    /// Only events with this exact name.
    Named(String),
}

impl Topic {
    fn matches(&self, event: &str) -> bool {
        match self {
            Topic::Any => true,
            Topic::Named(name) => name == event,
        }
    }
}

struct Listener {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

/// Broadcast point shared by every cache instance.
///
/// Delivery follows subscription order. An event emitted from inside a handler
/// is queued and dispatched after the current event reaches every listener.
pub struct Emitter {
    listeners: RefCell<Vec<Listener>>,
    next_id: Cell<SubscriptionId>,
    queue: RefCell<VecDeque<String>>,
    dispatching: Cell<bool>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
        }
    }

    /// Subscribe `handler` to `topic`; returns the id used to unsubscribe.
    pub fn on<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&str) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            topic,
            handler: Rc::new(handler),
        });
        trace!(id, "listener added");
        id
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&str) + 'static,
    {
        self.on(Topic::Any, handler)
    }

    /// Remove a subscription. Returns true if it was present.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        let removed = listeners.len() != before;
        trace!(id, removed, "listener removed");
        removed
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|listener| listener.id == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Emit `event` to every matching listener.
    pub fn emit(&self, event: &str) {
        self.queue.borrow_mut().push_back(event.to_string());
        if self.dispatching.get() {
            debug!(event, "emit during dispatch, queued");
            return;
        }

        let _guard = DispatchGuard::enter(&self.dispatching, &self.queue);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            self.dispatch(&event);
        }
    }

    fn dispatch(&self, event: &str) {
        let targets: Vec<(SubscriptionId, Handler)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.topic.matches(event))
            .map(|listener| (listener.id, Rc::clone(&listener.handler)))
            .collect();
        debug!(event, listeners = targets.len(), "dispatching");

        for (id, handler) in targets {
            // Skip listeners removed by an earlier handler of this dispatch.
            if self.is_subscribed(id) {
                handler(event);
            }
        }
    }
}

struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
    queue: &'a RefCell<VecDeque<String>>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>, queue: &'a RefCell<VecDeque<String>>) -> Self {
        flag.set(true);
        Self { flag, queue }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
        // A panicking handler abandons the rest of the batch.
        if std::thread::panicking() {
            let dropped = std::mem::take(&mut *self.queue.borrow_mut());
            warn!(
                dropped = dropped.len(),
                "handler panicked, queued events dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&str)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&str)> {
            let log = Rc::clone(&log_clone);
            let tag = tag.to_string();
            Box::new(move |event: &str| log.borrow_mut().push(format!("{tag}:{event}")))
        };
        (log, make)
    }

    #[test]
    fn wildcard_receives_every_event() {
        let emitter = Emitter::new();
        let (log, make) = recorder();
        emitter.on_any(make("any"));
        emitter.on(Topic::Named("a".to_string()), make("a"));

        emitter.emit("a");
        emitter.emit("b");

        assert_eq!(*log.borrow(), vec!["any:a", "a:a", "any:b"]);
    }

    #[test]
    fn off_stops_delivery() {
        let emitter = Emitter::new();
        let (log, make) = recorder();
        let id = emitter.on_any(make("x"));
        assert!(emitter.off(id));
        assert!(!emitter.off(id));

        emitter.emit("a");
        assert!(log.borrow().is_empty());
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn nested_emit_is_queued_after_current_event() {
        let emitter = Rc::new(Emitter::new());
        let (log, make) = recorder();

        let weak = Rc::downgrade(&emitter);
        let first = make("first");
        emitter.on_any(move |event| {
            first(event);
            if event == "outer"
                && let Some(emitter) = weak.upgrade()
            {
                emitter.emit("inner");
            }
        });
        emitter.on_any(make("second"));

        emitter.emit("outer");

        assert_eq!(
            *log.borrow(),
            vec!["first:outer", "second:outer", "first:inner", "second:inner"]
        );
    }

    #[test]
    fn panicking_handler_does_not_leak_queued_events() {
        let emitter = Rc::new(Emitter::new());
        let (log, make) = recorder();

        let weak = Rc::downgrade(&emitter);
        emitter.on(Topic::Named("boom".to_string()), move |_| {
            if let Some(emitter) = weak.upgrade() {
                emitter.emit("inner");
            }
            panic!("handler failed");
        });
        emitter.on_any(make("any"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| emitter.emit("boom")));
        assert!(result.is_err());

        emitter.emit("next");
        assert_eq!(*log.borrow(), vec!["any:next"]);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let emitter = Rc::new(Emitter::new());
        let (log, make) = recorder();

        let victim = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(&emitter);
        let victim_clone = Rc::clone(&victim);
        emitter.on_any(move |_| {
            if let Some(emitter) = weak.upgrade() {
                emitter.off(victim_clone.get());
            }
        });
        victim.set(emitter.on_any(make("victim")));

        emitter.emit("a");
        assert!(log.borrow().is_empty());
    }
}
