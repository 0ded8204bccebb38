//! Scoring contract and the model artifact implementation.
//!
//! The service treats the trained classifier as an opaque artifact behind
//! the [`Classifier`] capability trait; any compatible backend can be
//! substituted without touching the validation pipeline or the ledger.
//! [`ModelArtifact`] is the shipped implementation, loaded once at startup
//! and shared read-only across requests.

mod artifact;

pub use artifact::{ArtifactError, ColumnKind, ModelArtifact, NumericTerm};

use thiserror::Error;

use crate::observation::Observation;

/// Outcome of scoring a single observation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Scoring {
    /// Probability of the positive class, in [0, 1].
    pub probability: f64,
    /// The classifier's own thresholded label. Authoritative; callers do
    /// not re-derive it from `probability`.
    pub decision: bool,
}

/// Errors surfaced while scoring a structurally valid observation.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The deployed artifact and the observation schema have drifted
    /// apart. This is a deployment defect, not a per-request user error:
    /// the same fault will hit every request until the artifact or the
    /// schema is fixed.
    #[error("model artifact does not match the observation schema: {0}")]
    ArtifactMismatch(String),
}

/// Capability interface over a pre-trained binary classifier.
///
/// Implementations must be safe for unsynchronized concurrent reads; the
/// daemon shares one instance across all in-flight requests.
pub trait Classifier: Send + Sync {
    /// Scores one validated observation.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::ArtifactMismatch`] if the classifier cannot
    /// process an observation that passed schema validation.
    fn score(&self, observation: &Observation) -> Result<Scoring, ScoreError>;
}
