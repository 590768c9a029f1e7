//! Initialization helpers for `.query-store/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{StoreConfig, write_config};
use super::results_dir::{PAGES_DIR, STATIC_DIR};

/// Canonical paths within `.query-store/` for a project root.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub store_dir: PathBuf,
    pub config_path: PathBuf,
    pub gitignore_path: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let store_dir = root.join(".query-store");
        Self {
            root: root.clone(),
            store_dir: store_dir.clone(),
            config_path: store_dir.join("config.toml"),
            gitignore_path: store_dir.join(".gitignore"),
        }
    }
}

/// Options for `init_store`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing store-owned files.
    pub force: bool,
}

/// Create `.query-store/` scaffolding in `root` with a default config and an
/// empty results directory.
///
/// Fails if `.query-store/` already exists unless `options.force` is set.
pub fn init_store(root: &Path, options: &InitOptions) -> Result<StorePaths> {
    let paths = StorePaths::new(root);
    if paths.store_dir.exists() && !options.force {
        return Err(anyhow!(
            "query-store init: .query-store already exists (use --force to overwrite)"
        ));
    }
    if paths.store_dir.exists() && !paths.store_dir.is_dir() {
        return Err(anyhow!(
            "query-store init: .query-store exists but is not a directory"
        ));
    }

    let config = StoreConfig::default();
    let results_dir = config.results_dir_in(root);
    create_dir(&paths.store_dir)?;
    create_dir(&results_dir.join(PAGES_DIR))?;
    create_dir(&results_dir.join(STATIC_DIR))?;

    write_config(&paths.config_path, &config)?;
    fs::write(&paths.gitignore_path, STORE_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const STORE_GITIGNORE: &str = "results/\n";
