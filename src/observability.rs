//! Logging setup and registration counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `filter` (from `--log`) is used,
/// falling back to `info`.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)),
    };

    // try_init so tests and embedders that already installed one don't panic
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .try_init();
}

/// Counters for one registry instance
#[derive(Debug, Default)]
pub struct Metrics {
    inserted: AtomicU64,
    deferred: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    replaced: AtomicU64,
    deleted: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_inserted(&self) {
        self.inserted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_inserted", "Metric incremented");
    }

    pub fn module_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_deferred", "Metric incremented");
    }

    pub fn module_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_rejected", "Metric incremented");
    }

    pub fn module_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_dropped", "Metric incremented");
    }

    pub fn module_replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_replaced", "Metric incremented");
    }

    pub fn module_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "modules_deleted", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserted: self.inserted.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub inserted: u64,
    pub deferred: u64,
    pub rejected: u64,
    pub dropped: u64,
    pub replaced: u64,
    pub deleted: u64,
}
