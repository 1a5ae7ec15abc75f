//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Events (outcomes, failing stage)
//! - Conversion (rasterizer duration)
//! - Tracking (completed orders, webhook deliveries)
//! - Object transfers

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Event Metrics
// =============================================================================

/// Events handled total by outcome.
pub static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pngflow_events_total", "Total storage events handled"),
        &["trigger", "outcome"], // outcome: "converted", "ignored", "rejected", "failed"
    )
    .unwrap()
});

/// Event failures by the stage that failed.
pub static STAGE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pngflow_stage_failures_total",
            "Total event failures by pipeline stage",
        ),
        &["stage"],
    )
    .unwrap()
});

/// End-to-end event duration in seconds.
pub static EVENT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pngflow_event_duration_seconds",
            "Duration of event handling from workspace to cleanup",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Rasterizer run duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pngflow_conversion_duration_seconds",
            "Duration of PDF rasterization",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Bytes moved through object storage.
pub static TRANSFER_BYTES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pngflow_transfer_bytes_total",
            "Total bytes downloaded from and uploaded to object storage",
        ),
        &["direction"], // "download", "upload"
    )
    .unwrap()
});

// =============================================================================
// Tracking Metrics
// =============================================================================

/// Orders found complete by this instance.
pub static ORDERS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "pngflow_orders_completed_total",
        "Total orders observed complete after an item was extracted",
    )
    .unwrap()
});

/// Completion notifications by result.
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pngflow_notifications_total",
            "Total completion notifications",
        ),
        &["result"], // "sent", "failed", "already_notified"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Events
        Box::new(EVENTS_TOTAL.clone()),
        Box::new(STAGE_FAILURES.clone()),
        Box::new(EVENT_DURATION.clone()),
        // Conversion
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(TRANSFER_BYTES.clone()),
        // Tracking
        Box::new(ORDERS_COMPLETED.clone()),
        Box::new(NOTIFICATIONS_TOTAL.clone()),
    ]
}
