//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Library scans (classified items, walk warnings)
//! - Catalog lookups (attempts, retries, latency)
//! - Enrichment (rows by final status)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Scanner
// =============================================================================

/// Scanned items by classification.
pub static SCAN_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("media_hygiene_scan_items_total", "Items classified by the scanner"),
        &["classification"], // "ok", "low_quality", "lost"
    )
    .unwrap()
});

/// Filesystem problems skipped during a walk.
pub static SCAN_WARNINGS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "media_hygiene_scan_warnings_total",
        "Filesystem entries skipped with a warning",
    )
    .unwrap()
});

// =============================================================================
// Catalog lookups
// =============================================================================

/// Lookup attempts by outcome.
pub static LOOKUP_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("media_hygiene_lookup_attempts_total", "Catalog lookup attempts"),
        &["outcome"], // "success", "slow", "retryable", "terminal"
    )
    .unwrap()
});

/// Retries scheduled after a retryable failure.
pub static LOOKUP_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("media_hygiene_lookup_retries_total", "Catalog lookup retries").unwrap()
});

/// Per-attempt latency.
pub static LOOKUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "media_hygiene_lookup_duration_seconds",
            "Duration of a single catalog request",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Enriched rows by final status.
pub static ROWS_ENRICHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("media_hygiene_rows_enriched_total", "Rows written by the lookup pipeline"),
        &["status"], // "matched", "no_match", "failed", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SCAN_ITEMS.clone()),
        Box::new(SCAN_WARNINGS.clone()),
        Box::new(LOOKUP_ATTEMPTS.clone()),
        Box::new(LOOKUP_RETRIES.clone()),
        Box::new(LOOKUP_DURATION.clone()),
        Box::new(ROWS_ENRICHED.clone()),
    ]
}
