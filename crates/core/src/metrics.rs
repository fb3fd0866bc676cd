//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Stage execution (outcomes, durations)
//! - Review gate backlog
//! - Ingestion and subscriber fan-out

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Stage Metrics
// =============================================================================

/// Stage executions by stage and result.
pub static STAGE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("governor_stage_outcomes_total", "Stage executions by result"),
        &["stage", "result"], // "completed", "awaiting_review", "rejected", "fault"
    )
    .unwrap()
});

/// Stage processor duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "governor_stage_duration_seconds",
            "Duration of stage processor calls",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["stage"],
    )
    .unwrap()
});

/// Tickets currently paused at the review gate.
pub static TICKETS_AWAITING_REVIEW: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "governor_tickets_awaiting_review",
        "Tickets waiting for application team review",
    )
    .unwrap()
});

/// Tickets that reached the final stage.
pub static PIPELINES_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "governor_pipelines_completed_total",
        "Tickets that completed every stage",
    )
    .unwrap()
});

// =============================================================================
// Ingestion & Fan-out Metrics
// =============================================================================

/// Tickets added to the store by ingestion.
pub static TICKETS_INGESTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "governor_tickets_ingested_total",
        "Tickets added to the store by ingestion",
    )
    .unwrap()
});

/// Subscribers removed because their queue was full or closed.
pub static SUBSCRIBERS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "governor_subscribers_dropped_total",
            "Subscribers removed by the broadcast hub",
        ),
        &["reason"], // "full", "closed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(STAGE_OUTCOMES.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(TICKETS_AWAITING_REVIEW.clone()),
        Box::new(PIPELINES_COMPLETED.clone()),
        Box::new(TICKETS_INGESTED.clone()),
        Box::new(SUBSCRIBERS_DROPPED.clone()),
    ]
}
