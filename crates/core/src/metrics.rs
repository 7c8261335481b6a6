//! Prometheus metrics for the acquisition core.
//!
//! This module provides metrics for:
//! - Acquisitions (results, duration, fallbacks)
//! - Backend runs (by backend and outcome)
//! - Cover art downloads

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

use crate::backend::BackendKind;

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisitions total by result.
pub static ACQUISITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_acquisitions_total", "Total acquisitions"),
        &["result"], // "success", or an error label such as "timeout"
    )
    .unwrap()
});

/// Acquisition duration in seconds.
pub static ACQUISITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "trackfetch_acquisition_duration_seconds",
            "Duration of whole acquisitions",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["success"],
    )
    .unwrap()
});

/// Fallbacks from the primary to the secondary backend.
pub static FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trackfetch_fallbacks_total",
        "Total fallbacks to the secondary backend",
    )
    .unwrap()
});

// =============================================================================
// Backend Metrics
// =============================================================================

/// Backend runs by backend and outcome.
pub static BACKEND_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_backend_runs_total", "Total backend process runs"),
        &["backend", "outcome"], // outcome: "success", "timeout", "rate_limited", "failed"
    )
    .unwrap()
});

/// Cover art downloads by result.
pub static COVER_DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackfetch_cover_downloads_total", "Total cover art downloads"),
        &["result"], // "success", "failed", "unavailable"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Records one supervised backend run.
pub fn record_backend_run(backend: BackendKind, outcome: &str) {
    BACKEND_RUNS
        .with_label_values(&[&backend.to_string(), outcome])
        .inc();
}

/// Counts for an end-of-session summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub fallbacks: u64,
}

/// Reads the acquisition counters.
pub fn session_summary() -> SessionSummary {
    let mut summary = SessionSummary {
        fallbacks: FALLBACKS.get(),
        ..Default::default()
    };
    for family in prometheus::core::Collector::collect(&*ACQUISITIONS) {
        for metric in family.get_metric() {
            let is_success = metric
                .get_label()
                .iter()
                .any(|l| l.get_name() == "result" && l.get_value() == "success");
            let count = metric.get_counter().get_value() as u64;
            if is_success {
                summary.succeeded += count;
            } else {
                summary.failed += count;
            }
        }
    }
    summary
}
