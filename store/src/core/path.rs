//! Normalized page paths used as cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical form of a navigable location.
///
/// Only a [`PathNormalizer`] should construct one from raw input; equality is
/// exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure, total mapping from raw page paths to cache keys.
pub trait PathNormalizer {
    fn normalize(&self, raw: &str) -> NormalizedPath;
}

/// Default normalizer: strips a single trailing slash, keeping `/` as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingSlashNormalizer;

impl PathNormalizer for TrailingSlashNormalizer {
    fn normalize(&self, raw: &str) -> NormalizedPath {
        NormalizedPath(normalize_page_path(raw).to_string())
    }
}

/// Strip one trailing `/` unless the path is the root.
pub fn normalize_page_path(raw: &str) -> &str {
    if raw == "/" {
        return raw;
    }
    raw.strip_suffix('/').unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_kept() {
        assert_eq!(TrailingSlashNormalizer.normalize("/").as_str(), "/");
    }

    #[test]
    fn single_trailing_slash_is_stripped() {
        assert_eq!(
            TrailingSlashNormalizer.normalize("/blog/").as_str(),
            "/blog"
        );
        assert_eq!(TrailingSlashNormalizer.normalize("/blog").as_str(), "/blog");
    }

    #[test]
    fn only_one_slash_is_stripped() {
        assert_eq!(normalize_page_path("/a//"), "/a/");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_page_path(""), "");
    }
}
