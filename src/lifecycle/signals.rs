//! OS signal handling.
//!
//! # Responsibilities
//! - SIGTERM/SIGINT → graceful shutdown
//! - SIGHUP → zone data reload (unix only)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP reloads zones, never config

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::lifecycle::shutdown::Shutdown;

/// Resolve on the first SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_requested() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Spawn the signal listener task.
///
/// Triggers `shutdown` on SIGINT/SIGTERM and sends on `reload` for each SIGHUP.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>, reload: mpsc::UnboundedSender<()>) {
    #[cfg(unix)]
    {
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGHUP");
                    return;
                }
            };
            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        tracing::info!("SIGHUP received, reloading zone data");
                        let _ = reload.send(());
                    }
                    _ = stop.recv() => break,
                }
            }
        });
    }
    #[cfg(not(unix))]
    drop(reload);

    tokio::spawn(async move {
        shutdown_requested().await;
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });
}
