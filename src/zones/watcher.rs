//! Zone data directory watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Watches the zone data directory and signals when files change.
pub struct ZoneWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<()>,
}

impl ZoneWatcher {
    /// Create a new watcher that sends one `()` per change event.
    pub fn new(path: &Path, change_tx: mpsc::UnboundedSender<()>) -> Self {
        Self {
            path: path.to_path_buf(),
            change_tx,
        }
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::info!(paths = ?event.paths, "Zone data change detected");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Zone watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Zone watcher started");
        Ok(watcher)
    }
}
