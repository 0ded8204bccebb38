//! Prometheus metrics for service observability.
//!
//! # Metrics Families
//!
//! | Metric | Type | Description | Labels |
//! |--------|------|-------------|--------|
//! | `pledger_requests_total` | Counter | Requests by endpoint and outcome | `endpoint`, `outcome` |
//! | `pledger_scoring_seconds` | Histogram | Classifier scoring latency | |
//!
//! Metrics are additive observability: nothing in the scoring contract
//! depends on them, and recording can never fail a request.

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Histogram buckets for scoring latency, in seconds. Scoring is a pure
/// in-memory evaluation, so the buckets skew small.
const SCORING_LATENCY_BUCKETS: &[f64] = &[0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05];

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding error from the prometheus library.
    #[error("metrics error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Registry wrapper exposing the service's metric families.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    requests_total: CounterVec,
    scoring_seconds: Histogram,
}

impl ServiceMetrics {
    /// Creates the registry and registers every metric family.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric family cannot be registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new(
                "pledger_requests_total",
                "Requests handled, by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let scoring_seconds = Histogram::with_opts(
            HistogramOpts::new("pledger_scoring_seconds", "Classifier scoring latency")
                .buckets(SCORING_LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(scoring_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            scoring_seconds,
        })
    }

    /// Counts one handled request.
    pub fn observe_request(&self, endpoint: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Records one scoring latency sample.
    pub fn observe_scoring_seconds(&self, seconds: f64) {
        self.scoring_seconds.observe(seconds);
    }

    /// Encodes every registered family in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
