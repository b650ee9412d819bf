//! Bounded worker pool for CPU-bound scoring.
//!
//! # Responsibilities
//! - Run geometry work off the async dispatch threads
//! - Bound concurrent jobs to the configured worker count
//! - Let in-flight jobs observe request cancellation
//!
//! # Design Decisions
//! - Permits are acquired before spawning so bursts queue instead of piling
//!   onto the blocking thread pool
//! - Cancellation is cooperative: jobs poll a shared flag between samples

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

/// The job observed a cancelled request and stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scoring cancelled")]
pub struct Cancelled;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("scoring pool closed")]
    Closed,

    #[error("scoring job panicked: {0}")]
    Join(String),
}

/// Shared cancellation flag for one request.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the request has been abandoned.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Guard that cancels when dropped, e.g. when the request future is dropped.
    pub fn guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: self.clone(),
        }
    }
}

pub struct CancelOnDrop {
    token: Cancellation,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Semaphore-bounded front for `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ScoringPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl ScoringPool {
    /// Create a pool; `0` sizes it to the available cores.
    pub fn new(max_workers: usize) -> Self {
        let size = if max_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            max_workers
        };

        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` on a blocking thread once a worker slot is free.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| PoolError::Join(e.to_string()))
    }
}
