//! Shared service state.
//!
//! Everything a handler needs, built once at startup and shared by
//! reference. The classifier and metrics registry are immutable; the
//! ledger serializes its own writes internally. Nothing here mutates
//! after construction, so the state is safe to clone across requests
//! without further synchronization.

use std::sync::Arc;

use pledger_core::ledger::SqliteLedger;
use pledger_core::predict::Classifier;

use crate::metrics::ServiceMetrics;

/// Shared state handed to every handler.
pub struct AppState {
    /// The loaded classifier artifact, process-wide and read-only.
    pub classifier: Arc<dyn Classifier>,
    /// The prediction ledger.
    pub ledger: SqliteLedger,
    /// Prometheus metric families.
    pub metrics: ServiceMetrics,
}

/// Shared state behind an `Arc`, as axum hands it to handlers.
pub type SharedState = Arc<AppState>;
