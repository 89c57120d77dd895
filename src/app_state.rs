// =============================================================================
// Central Application State — Signal Wheel API
// =============================================================================
//
// Built once in `main` after the datasets load and shared with every handler
// via `Arc<AppState>`. Nothing here is mutated after construction, so no
// locks are needed.
// =============================================================================

use std::time::Instant;

use serde::Serialize;

use crate::dataset::Dataset;

/// Shared, read-only state handed to every request handler.
pub struct AppState {
    pub dataset: Dataset,

    /// Upper bound on the size of a random signal sample.
    pub signal_sample_size: usize,

    /// Instant the service started. Used for uptime reporting.
    pub start_time: Instant,
}

/// Liveness payload returned by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub signals: usize,
    pub scenarios: usize,
    pub uptime_secs: u64,
    pub server_time: i64,
}

impl AppState {
    pub fn new(dataset: Dataset, signal_sample_size: usize) -> Self {
        Self {
            dataset,
            signal_sample_size,
            start_time: Instant::now(),
        }
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            signals: self.dataset.signals().len(),
            scenarios: self.dataset.scenarios().len(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            server_time: chrono::Utc::now().timestamp_millis(),
        }
    }
}
