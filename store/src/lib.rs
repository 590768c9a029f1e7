//! Development-time query-result synchronization layer.
//!
//! Keeps a client-resident cache of query results fresh while an upstream
//! producer recomputes them, and re-renders dependent views exactly when their
//! slice of data changes. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (path normalization, parameter
//!   extraction, prop merge, re-render decisions). No I/O.
//! - **[`io`]**: Collaborators with side effects or shared state (config file,
//!   results directory, data source, path-interest registry).
//!
//! The live components, [`page_store::PathQueryCache`] and
//! [`static_store::GlobalQueryCache`], are built on a [`runtime::Runtime`]
//! that refuses to exist outside development mode. Both subscribe to the
//! wildcard [`emitter::Emitter`] and re-pull whole snapshots on every signal.

pub mod context;
pub mod core;
pub mod emitter;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod page_store;
pub mod render;
pub mod runtime;
pub mod static_store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::StoreError;
pub use page_store::{PageRenderer, PathQueryCache};
pub use runtime::Runtime;
pub use static_store::GlobalQueryCache;
