//! Re-render decisions for the two caches.
//!
//! Both decisions compare identities, never contents.

use std::rc::Rc;

use crate::core::path::NormalizedPath;
use crate::core::types::{GlobalSnapshot, Location, PathResultMap};

/// The inputs a page render depends on.
#[derive(Debug, Clone)]
pub struct PageFrame<'a> {
    pub location: &'a Rc<Location>,
    pub path: Option<&'a NormalizedPath>,
    pub results: &'a PathResultMap,
}

/// Why a page view re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReason {
    LocationChanged,
    PathChanged,
    EntryChanged,
}

/// Decide whether a page view must re-render when going from `prev` to `next`.
///
/// The entry comparison looks up the *next* path in both maps, so a change to
/// an unrelated path's entry never triggers a render.
pub fn page_render_reason(prev: &PageFrame<'_>, next: &PageFrame<'_>) -> Option<RenderReason> {
    if !Rc::ptr_eq(prev.location, next.location) {
        return Some(RenderReason::LocationChanged);
    }
    if prev.path != next.path {
        return Some(RenderReason::PathChanged);
    }
    let before = next.path.and_then(|path| prev.results.get(path));
    let after = next.path.and_then(|path| next.results.get(path));
    let same = match (before, after) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    };
    if same {
        None
    } else {
        Some(RenderReason::EntryChanged)
    }
}

/// A global snapshot is redistributed whenever its identity changes.
pub fn global_snapshot_changed(prev: &GlobalSnapshot, next: &GlobalSnapshot) -> bool {
    !Rc::ptr_eq(prev, next)
}
