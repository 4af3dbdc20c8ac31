//! Listener loop and worker pool.

pub mod listener;
pub mod pool;

use std::sync::atomic::{AtomicU64, Ordering};

pub use listener::Server;
pub use pool::{Job, WorkerPool};

/// Process-wide counters, used only for logging.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub accepted: AtomicU64,
    pub served: AtomicU64,
    pub rejected: AtomicU64,
}

impl ServerStats {
    /// Returns (accepted, served, rejected).
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.accepted.load(Ordering::Relaxed),
            self.served.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
        )
    }
}
