//! Observability: tracing subscriber setup and in-process counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::TelemetryConfig;

/// Install the global subscriber
///
/// `RUST_LOG` wins over `telemetry.log_level`. Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&telemetry.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if telemetry.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    schedules_generated: AtomicU64,
    items_enqueued: AtomicU64,
    items_published: AtomicU64,
    items_failed: AtomicU64,
    items_reaped: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_generated(&self) {
        self.schedules_generated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "schedules_generated", "Metric incremented");
    }

    pub fn items_enqueued(&self, count: u64) {
        self.items_enqueued.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "items_enqueued", count, "Metric incremented");
    }

    pub fn item_published(&self) {
        self.items_published.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "items_published", "Metric incremented");
    }

    pub fn item_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "items_failed", "Metric incremented");
    }

    pub fn items_reaped(&self, count: u64) {
        self.items_reaped.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "items_reaped", count, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schedules_generated: self.schedules_generated.load(Ordering::Relaxed),
            items_enqueued: self.items_enqueued.load(Ordering::Relaxed),
            items_published: self.items_published.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            items_reaped: self.items_reaped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub schedules_generated: u64,
    pub items_enqueued: u64,
    pub items_published: u64,
    pub items_failed: u64,
    pub items_reaped: u64,
}
