//! Path-interest registration channel.
//!
//! Live page views declare which path they need so the result producer can
//! prioritize it. Many views register independently; the registry counts them.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::path::NormalizedPath;

/// Registration channel consumed by page caches. `None` is always a no-op.
pub trait PathRegistry {
    fn register_path(&self, path: Option<&NormalizedPath>);
    fn unregister_path(&self, path: Option<&NormalizedPath>);
}

/// Reference-counted interest per path.
#[derive(Debug, Default)]
pub struct InterestRegistry {
    counts: RefCell<HashMap<NormalizedPath, usize>>,
}

impl InterestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations for `path`.
    pub fn interest(&self, path: &NormalizedPath) -> usize {
        self.counts.borrow().get(path).copied().unwrap_or(0)
    }

    pub fn is_registered(&self, path: &NormalizedPath) -> bool {
        self.interest(path) > 0
    }

    /// Paths with at least one registration, sorted.
    pub fn active_paths(&self) -> Vec<NormalizedPath> {
        let mut paths: Vec<NormalizedPath> = self.counts.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl PathRegistry for InterestRegistry {
    fn register_path(&self, path: Option<&NormalizedPath>) {
        let Some(path) = path else {
            return;
        };
        let mut counts = self.counts.borrow_mut();
        let count = counts.entry(path.clone()).or_insert(0);
        *count += 1;
        debug!(path = %path, interest = *count, "path registered");
    }

    fn unregister_path(&self, path: Option<&NormalizedPath>) {
        let Some(path) = path else {
            return;
        };
        let mut counts = self.counts.borrow_mut();
        match counts.get_mut(path) {
            Some(count) if *count > 1 => {
                *count -= 1;
                debug!(path = %path, interest = *count, "path unregistered");
            }
            Some(_) => {
                counts.remove(path);
                debug!(path = %path, interest = 0, "path unregistered");
            }
            None => warn!(path = %path, "unregister for path with no interest"),
        }
    }
}
