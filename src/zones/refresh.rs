//! Background zone refresh.
//!
//! # Responsibilities
//! - Refresh the zone store on a fixed interval
//! - Refresh immediately on change notifications (file watcher, SIGHUP)
//! - Stop on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time;

use crate::zones::store::ZoneStore;

pub struct ZoneRefresher {
    store: Arc<ZoneStore>,
    interval: Duration,
    changes: Option<mpsc::UnboundedReceiver<()>>,
}

impl ZoneRefresher {
    pub fn new(store: Arc<ZoneStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            changes: None,
        }
    }

    /// Also refresh whenever a change notification arrives.
    pub fn with_changes(mut self, changes: mpsc::UnboundedReceiver<()>) -> Self {
        self.changes = Some(changes);
        self
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Zone refresher starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh("interval").await;
                }
                Some(()) = recv_change(&mut self.changes) => {
                    // Editors emit bursts of events; coalesce what is already queued.
                    if let Some(rx) = self.changes.as_mut() {
                        while rx.try_recv().is_ok() {}
                    }
                    self.refresh("change notification").await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Zone refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn refresh(&self, trigger: &str) {
        match self.store.refresh().await {
            Ok(()) => tracing::debug!(trigger, "Zone refresh complete"),
            Err(e) => tracing::warn!(trigger, error = %e, "Zone refresh degraded"),
        }
    }
}

async fn recv_change(changes: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
