//! Store configuration stored under `.query-store/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`StoreConfig::mode`].
pub const MODE_ENV: &str = "QUERY_STORE_MODE";

/// Execution context the store runs in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Development,
    Production,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Development => "development",
            ExecutionMode::Production => "production",
        }
    }

    /// Parse a mode name; `dev`/`prod` shorthands are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(ExecutionMode::Development),
            "production" | "prod" => Some(ExecutionMode::Production),
            _ => None,
        }
    }

    /// Mode from [`MODE_ENV`], if set.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(MODE_ENV) {
            Ok(raw) => ExecutionMode::parse(&raw)
                .map(Some)
                .ok_or_else(|| anyhow!("{MODE_ENV}: unknown mode '{raw}'")),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(anyhow!("{MODE_ENV}: {err}")),
        }
    }
}

/// Store configuration (TOML).
///
/// Missing fields default to development values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub mode: ExecutionMode,

    /// Results directory, relative to the project root unless absolute.
    pub results_dir: PathBuf,

    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the poll watcher scans the results directory.
    pub poll_interval_ms: u64,

    /// How often batched file events are flushed into one broadcast.
    pub flush_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            flush_interval_ms: 100,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Development,
            results_dir: PathBuf::from(".query-store/results"),
            watch: WatchConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.results_dir.as_os_str().is_empty() {
            return Err(anyhow!("results_dir must not be empty"));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(anyhow!("watch.poll_interval_ms must be > 0"));
        }
        if self.watch.flush_interval_ms == 0 {
            return Err(anyhow!("watch.flush_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Apply [`MODE_ENV`] on top of the file value.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(mode) = ExecutionMode::from_env()? {
            self.mode = mode;
        }
        Ok(self)
    }

    /// Results directory resolved against `root`.
    pub fn results_dir_in(&self, root: &Path) -> PathBuf {
        if self.results_dir.is_absolute() {
            self.results_dir.clone()
        } else {
            root.join(&self.results_dir)
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `StoreConfig::default()`.
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    if !path.exists() {
        let cfg = StoreConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StoreConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &StoreConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
