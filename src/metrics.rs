//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_with_registry, register_histogram_with_registry, Counter, Histogram,
    HistogramOpts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    /// Completed compaction passes
    pub compactions: Counter,
    /// External summarizer degradations to rule-based output
    pub summarizer_fallbacks: Counter,
    /// Appends that left the buffer over budget even after compaction
    pub budget_overshoots: Counter,
    /// Wall time of compaction passes, including summarization
    pub compaction_duration: Histogram,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let compactions = register_counter_with_registry!(
            "history_compactions_total",
            "Total history compaction passes",
            registry
        )?;

        let summarizer_fallbacks = register_counter_with_registry!(
            "history_summarizer_fallbacks_total",
            "Total degradations from external summarizer to rule-based",
            registry
        )?;

        let budget_overshoots = register_counter_with_registry!(
            "history_budget_overshoots_total",
            "Total appends exceeding the token budget after compaction",
            registry
        )?;

        let compaction_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "history_compaction_duration_seconds",
                "Duration of compaction passes"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            compactions,
            summarizer_fallbacks,
            budget_overshoots,
            compaction_duration,
        })
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}
