//! Typed errors surfaced by the store library.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was initialized outside development mode.
    #[error(
        "query-result-store is misconfigured: it is a development-only layer and must not run \
         in {mode} mode. Unless the build has a custom configuration this is a bug; check \
         QUERY_STORE_MODE and the `mode` key of the store config."
    )]
    Misconfigured { mode: &'static str },

    #[error("read results {path}: {source}")]
    ResultsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse results {path}: {source}")]
    ResultsJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("walk results directory {path}: {source}")]
    ResultsWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl StoreError {
    pub fn is_misconfigured(&self) -> bool {
        matches!(self, StoreError::Misconfigured { .. })
    }
}
