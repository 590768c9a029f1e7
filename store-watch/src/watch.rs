//! Results-directory watcher.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use query_result_store::io::config::WatchConfig;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::Session;

/// Watch the session's results directory and sync on every batch of writes.
///
/// Runs until the watcher channel closes.
pub async fn run(session: &Session, config: &WatchConfig) -> Result<()> {
    let results_dir = session.results_dir().to_path_buf();
    std::fs::create_dir_all(&results_dir)
        .with_context(|| format!("create {}", results_dir.display()))?;

    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| match res {
            Ok(event) => {
                let _ = tx.try_send(event);
            }
            Err(err) => warn!(error = %err, "watch error"),
        },
        notify::Config::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(&results_dir, RecursiveMode::Recursive)?;
    info!(path = %results_dir.display(), "watching results directory");

    // Flush at a fixed interval so a burst of writes yields one broadcast.
    let mut pending = false;
    let mut flush_tick = tokio::time::interval(Duration::from_millis(config.flush_interval_ms));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                if is_result_event(&results_dir, &event) {
                    pending = true;
                }
            }
            _ = flush_tick.tick() => {
                if !pending {
                    continue;
                }
                pending = false;
                match session.sync() {
                    Ok(summary) => debug!(
                        pages_changed = summary.pages_changed,
                        statics_changed = summary.statics_changed,
                        "synced"
                    ),
                    // Usually a half-written file; the next write retries.
                    Err(err) => warn!(error = ?err, "sync failed"),
                }
            }
        }
    }
}

/// Whether `event` creates or modifies a JSON file below `results_dir`.
pub fn is_result_event(results_dir: &Path, event: &NotifyEvent) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.starts_with(results_dir) && path.extension().is_some_and(|ext| ext == "json")
    })
}
