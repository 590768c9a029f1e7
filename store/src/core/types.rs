//! Shared data types for the query caches.
//!
//! Payloads are opaque JSON values. Cache entries are reference-counted so that
//! change detection can compare identity instead of content.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::core::path::NormalizedPath;

/// Opaque query result produced upstream.
pub type ResultPayload = Value;

/// A cached query result. Identity (`Rc::ptr_eq`) marks "the same result".
pub type ResultEntry = Rc<ResultPayload>;

/// All path-keyed results known at one instant.
///
/// Cloning keeps the identity of every entry.
pub type PathResultMap = HashMap<NormalizedPath, ResultEntry>;

/// Whole static-query snapshot; replaced, never merged.
pub type GlobalSnapshot = Rc<ResultPayload>;

/// Props bag handed to the page renderer.
pub type Props = Map<String, Value>;

/// Routing location. Compared by identity, like a router-owned object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }
}

/// Page metadata resolved by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Raw, un-normalized page path.
    pub path: String,
}

/// Resources available for the page being rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageResources {
    pub page: Option<PageInfo>,
    /// Page context; may carry `__params` and `__collectionData`.
    pub page_context: Map<String, Value>,
}

impl PageResources {
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            page: Some(PageInfo { path: path.into() }),
            page_context: Map::new(),
        }
    }
}

/// Everything a page view receives from its parent.
#[derive(Debug, Clone)]
pub struct PageProps {
    pub location: Rc<Location>,
    /// Declared route template, e.g. `/users/:id`.
    pub route_path: Option<String>,
    pub page_resources: Option<PageResources>,
    /// Own props, merged first and consulted for route parameters.
    pub props: Props,
}

impl PageProps {
    pub fn new(location: Location, page_resources: Option<PageResources>) -> Self {
        Self {
            location: Rc::new(location),
            route_path: None,
            page_resources,
            props: Props::new(),
        }
    }

    pub fn page_context(&self) -> Option<&Map<String, Value>> {
        self.page_resources.as_ref().map(|res| &res.page_context)
    }
}

/// What a page view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// Result not yet available for the resolved path.
    Placeholder,
    /// Merged render props.
    Page(Props),
}

impl PageView {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, PageView::Placeholder)
    }

    pub fn props(&self) -> Option<&Props> {
        match self {
            PageView::Placeholder => None,
            PageView::Page(props) => Some(props),
        }
    }
}
