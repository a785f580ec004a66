//! Prometheus registry for a single CLI run.
//!
//! The collectors live in `media_hygiene_core::metrics`; this module only
//! registers them and renders the text exposition format.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for collector in media_hygiene_core::metrics::all_metrics() {
        registry
            .register(collector)
            .expect("metric registered twice");
    }
    registry
});

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("text encoding into a Vec cannot fail");
    String::from_utf8(buffer).unwrap_or_default()
}
