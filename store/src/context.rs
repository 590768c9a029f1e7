//! Context distribution for the global static-query snapshot.
//!
//! One provider owns the current value; any number of readers observe it
//! without prop threading. Readers hold a `Weak` view and are revoked when the
//! provider goes away.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::core::types::GlobalSnapshot;
use crate::emitter::SubscriptionId;

type Listener = (SubscriptionId, Rc<dyn Fn(&GlobalSnapshot)>);

struct ContextState {
    value: GlobalSnapshot,
    listeners: Vec<Listener>,
    next_id: SubscriptionId,
}

/// Provider side of the static-query context.
pub struct StaticQueryContext {
    state: Rc<RefCell<ContextState>>,
}

impl StaticQueryContext {
    pub fn new(initial: GlobalSnapshot) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContextState {
                value: initial,
                listeners: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Replace the distributed value and notify listeners in subscription order.
    pub fn provide(&self, value: GlobalSnapshot) {
        let listeners: Vec<Rc<dyn Fn(&GlobalSnapshot)>> = {
            let mut state = self.state.borrow_mut();
            state.value = Rc::clone(&value);
            state
                .listeners
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect()
        };
        for listener in listeners {
            listener(&value);
        }
    }

    pub fn current(&self) -> GlobalSnapshot {
        Rc::clone(&self.state.borrow().value)
    }

    /// A read-only, revocable view for descendants.
    pub fn reader(&self) -> ContextReader {
        ContextReader {
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

/// Consumer side of the static-query context.
#[derive(Clone)]
pub struct ContextReader {
    state: Weak<RefCell<ContextState>>,
}

impl ContextReader {
    /// Latest snapshot, or `None` once the provider has been dropped.
    pub fn current(&self) -> Option<GlobalSnapshot> {
        self.state
            .upgrade()
            .map(|state| Rc::clone(&state.borrow().value))
    }

    /// Look up one static query result by id in the latest snapshot.
    pub fn static_query(&self, query_id: &str) -> Option<Value> {
        self.current()
            .and_then(|snapshot| snapshot.get(query_id).cloned())
    }

    /// Get called with every newly provided snapshot.
    ///
    /// Returns `None` when the provider is gone.
    pub fn watch<F>(&self, listener: F) -> Option<SubscriptionId>
    where
        F: Fn(&GlobalSnapshot) + 'static,
    {
        let state = self.state.upgrade()?;
        let mut state = state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Rc::new(listener)));
        Some(id)
    }

    pub fn unwatch(&self, id: SubscriptionId) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut state = state.borrow_mut();
        let before = state.listeners.len();
        state
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }
}
