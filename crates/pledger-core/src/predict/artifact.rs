//! The JSON model artifact.
//!
//! An artifact bundles everything the scoring path needs: the fixed
//! column ordering, a per-column coercion table, and the trained
//! parameters of a standardized logistic model. It is parsed and
//! structurally validated once at startup; after that, scoring never
//! allocates and never consults anything outside the artifact.
//!
//! Artifact shape (JSON):
//!
//! ```json
//! {
//!   "columns": ["age", "workclass", ...],
//!   "dtypes": {"age": "integer", "workclass": "categorical", ...},
//!   "numeric": {"age": {"mean": 38.6, "stddev": 13.7, "weight": 0.31}, ...},
//!   "categorical": {"workclass": {"Private": 0.02, ...}, ...},
//!   "intercept": -1.52,
//!   "threshold": 0.5
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{Classifier, ScoreError, Scoring};
use crate::observation::{self, Observation};

/// Errors raised while loading an artifact. All of these are
/// startup-fatal; a daemon without a usable artifact cannot serve.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// I/O error reading the artifact file.
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact is not valid JSON or misses required fields.
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    /// The artifact parsed but is internally inconsistent or contradicts
    /// the observation schema.
    #[error("model artifact validation failed: {0}")]
    Validation(String),
}

/// How a column is coerced before it reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Standardized numeric input.
    Integer,
    /// One-hot categorical input.
    Categorical,
}

/// Trained parameters for one numeric column: standardization moments
/// plus the model weight applied to the standardized value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericTerm {
    /// Training-set mean.
    pub mean: f64,
    /// Training-set standard deviation. Strictly positive.
    pub stddev: f64,
    /// Weight on the standardized value.
    pub weight: f64,
}

/// A pre-trained standardized logistic model with its input schema.
///
/// Immutable after construction; safe for unsynchronized concurrent
/// reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    columns: Vec<String>,
    dtypes: HashMap<String, ColumnKind>,
    #[serde(default)]
    numeric: HashMap<String, NumericTerm>,
    #[serde(default)]
    categorical: HashMap<String, HashMap<String, f64>>,
    intercept: f64,
    threshold: f64,
}

impl ModelArtifact {
    /// Loads and validates an artifact from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// structural validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let content = fs::read_to_string(path.as_ref())?;
        let artifact = Self::from_json(&content)?;
        debug!(
            path = %path.as_ref().display(),
            columns = artifact.columns.len(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Parses and validates an artifact from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails structural
    /// validation.
    pub fn from_json(content: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(content)?;
        artifact.check_consistency()?;
        Ok(artifact)
    }

    /// The decision threshold applied to the positive-class probability.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Structural validation: every declared column must be coercible,
    /// carry parameters of the matching kind, and exist in the
    /// observation schema. Catching drift here keeps
    /// [`ScoreError::ArtifactMismatch`] out of the request path for
    /// everything detectable at load time.
    fn check_consistency(&self) -> Result<(), ArtifactError> {
        if self.columns.is_empty() {
            return Err(ArtifactError::Validation(
                "artifact declares no columns".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ArtifactError::Validation(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }

        for column in &self.columns {
            if !observation::COLUMNS.contains(&column.as_str()) {
                return Err(ArtifactError::Validation(format!(
                    "column `{column}` is not part of the observation schema"
                )));
            }

            match self.dtypes.get(column) {
                None => {
                    return Err(ArtifactError::Validation(format!(
                        "column `{column}` has no dtype entry"
                    )));
                },
                Some(ColumnKind::Integer) => {
                    let term = self.numeric.get(column).ok_or_else(|| {
                        ArtifactError::Validation(format!(
                            "numeric column `{column}` has no trained term"
                        ))
                    })?;
                    if term.stddev <= 0.0 || !term.stddev.is_finite() {
                        return Err(ArtifactError::Validation(format!(
                            "numeric column `{column}` has non-positive stddev {}",
                            term.stddev
                        )));
                    }
                },
                Some(ColumnKind::Categorical) => {
                    if !self.categorical.contains_key(column) {
                        return Err(ArtifactError::Validation(format!(
                            "categorical column `{column}` has no weight table"
                        )));
                    }
                },
            }
        }

        Ok(())
    }
}

impl Classifier for ModelArtifact {
    /// Shapes the observation into the artifact's column order, coercing
    /// each column per its dtype, and evaluates the logistic model. The
    /// decision comes from the artifact's own threshold.
    #[allow(clippy::cast_precision_loss)] // observation integers are far below 2^52
    fn score(&self, observation: &Observation) -> Result<Scoring, ScoreError> {
        let mut z = self.intercept;

        for column in &self.columns {
            let kind = self.dtypes.get(column).ok_or_else(|| {
                ScoreError::ArtifactMismatch(format!("column `{column}` has no dtype entry"))
            })?;

            match kind {
                ColumnKind::Integer => {
                    let value = observation.numeric(column).ok_or_else(|| {
                        ScoreError::ArtifactMismatch(format!(
                            "column `{column}` is not a numeric observation field"
                        ))
                    })?;
                    let term = self.numeric.get(column).ok_or_else(|| {
                        ScoreError::ArtifactMismatch(format!(
                            "numeric column `{column}` has no trained term"
                        ))
                    })?;
                    z += term.weight * ((value as f64 - term.mean) / term.stddev);
                },
                ColumnKind::Categorical => {
                    let value = observation.categorical(column).ok_or_else(|| {
                        ScoreError::ArtifactMismatch(format!(
                            "column `{column}` is not a categorical observation field"
                        ))
                    })?;
                    let weights = self.categorical.get(column).ok_or_else(|| {
                        ScoreError::ArtifactMismatch(format!(
                            "categorical column `{column}` has no weight table"
                        ))
                    })?;
                    // One-hot: a schema-valid category the model never saw
                    // in training contributes nothing.
                    z += weights.get(value).copied().unwrap_or(0.0);
                },
            }
        }

        let probability = sigmoid(z);
        Ok(Scoring {
            probability,
            decision: probability >= self.threshold,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// A small but fully-populated artifact over the real schema.
    const TEST_ARTIFACT: &str = r#"{
        "columns": [
            "age", "workclass", "education", "marital-status", "race",
            "sex", "capital-gain", "capital-loss", "hours-per-week"
        ],
        "dtypes": {
            "age": "integer",
            "workclass": "categorical",
            "education": "categorical",
            "marital-status": "categorical",
            "race": "categorical",
            "sex": "categorical",
            "capital-gain": "integer",
            "capital-loss": "integer",
            "hours-per-week": "integer"
        },
        "numeric": {
            "age": {"mean": 38.58, "stddev": 13.64, "weight": 0.34},
            "capital-gain": {"mean": 1077.6, "stddev": 7385.3, "weight": 2.21},
            "capital-loss": {"mean": 87.3, "stddev": 403.0, "weight": 0.27},
            "hours-per-week": {"mean": 40.44, "stddev": 12.35, "weight": 0.38}
        },
        "categorical": {
            "workclass": {
                "Private": -0.04, "Self-emp-inc": 0.31, "Federal-gov": 0.39,
                "State-gov": -0.06, "Local-gov": -0.01, "Self-emp-not-inc": -0.21,
                "Without-pay": -0.63, "Never-worked": -0.71, "?": -0.17
            },
            "education": {
                "Bachelors": 0.52, "Masters": 0.88, "Doctorate": 1.35,
                "Prof-school": 1.42, "HS-grad": -0.31, "Some-college": -0.07,
                "Assoc-acdm": 0.11, "Assoc-voc": 0.09, "11th": -0.92,
                "10th": -0.97, "9th": -1.14, "7th-8th": -1.21, "12th": -0.78,
                "5th-6th": -1.33, "1st-4th": -1.48, "Preschool": -1.72
            },
            "marital-status": {
                "Married-civ-spouse": 1.08, "Never-married": -1.11,
                "Divorced": -0.74, "Separated": -0.79, "Widowed": -0.62,
                "Married-spouse-absent": -0.71, "Married-AF-spouse": 0.94
            },
            "race": {
                "White": 0.06, "Black": -0.09, "Asian-Pac-Islander": 0.04,
                "Amer-Indian-Eskimo": -0.18, "Other": -0.22
            },
            "sex": {"Male": 0.13, "Female": -0.24}
        },
        "intercept": -1.64,
        "threshold": 0.5
    }"#;

    fn test_observation() -> Observation {
        Observation {
            age: 39,
            sex: "Male".to_string(),
            race: "White".to_string(),
            workclass: "State-gov".to_string(),
            education: "Bachelors".to_string(),
            marital_status: "Never-married".to_string(),
            capital_gain: 2174,
            capital_loss: 0,
            hours_per_week: 40,
        }
    }

    #[test]
    fn loads_and_scores() {
        let artifact = ModelArtifact::from_json(TEST_ARTIFACT).unwrap();
        let scoring = artifact.score(&test_observation()).unwrap();

        assert!((0.0..=1.0).contains(&scoring.probability));
        assert_eq!(scoring.decision, scoring.probability >= artifact.threshold());
    }

    #[test]
    fn scoring_is_deterministic() {
        let artifact = ModelArtifact::from_json(TEST_ARTIFACT).unwrap();
        let obs = test_observation();

        assert_eq!(artifact.score(&obs).unwrap(), artifact.score(&obs).unwrap());
    }

    #[test]
    fn high_signal_observation_scores_above_threshold() {
        let artifact = ModelArtifact::from_json(TEST_ARTIFACT).unwrap();
        let obs = Observation {
            age: 52,
            sex: "Male".to_string(),
            race: "White".to_string(),
            workclass: "Self-emp-inc".to_string(),
            education: "Doctorate".to_string(),
            marital_status: "Married-civ-spouse".to_string(),
            capital_gain: 99_999,
            capital_loss: 0,
            hours_per_week: 60,
        };

        let scoring = artifact.score(&obs).unwrap();
        assert!(scoring.decision);
        assert!(scoring.probability > 0.5);
    }

    #[test]
    fn rejects_column_outside_schema() {
        let bad = TEST_ARTIFACT.replace("\"age\", \"workclass\"", "\"zip-code\", \"workclass\"");
        let err = ModelArtifact::from_json(&bad).unwrap_err();
        assert!(matches!(err, ArtifactError::Validation(_)));
        assert!(err.to_string().contains("zip-code"));
    }

    #[test]
    fn rejects_missing_dtype() {
        let bad = TEST_ARTIFACT.replace("\"age\": \"integer\",", "");
        let err = ModelArtifact::from_json(&bad).unwrap_err();
        assert!(matches!(err, ArtifactError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_stddev() {
        let bad = TEST_ARTIFACT.replace(
            "{\"mean\": 38.58, \"stddev\": 13.64, \"weight\": 0.34}",
            "{\"mean\": 38.58, \"stddev\": 0.0, \"weight\": 0.34}",
        );
        let err = ModelArtifact::from_json(&bad).unwrap_err();
        assert!(matches!(err, ArtifactError::Validation(_)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let bad = TEST_ARTIFACT.replace("\"threshold\": 0.5", "\"threshold\": 1.5");
        let err = ModelArtifact::from_json(&bad).unwrap_err();
        assert!(matches!(err, ArtifactError::Validation(_)));
    }

    #[test]
    fn score_reports_mismatch_for_drifted_artifact() {
        // A dtype that contradicts the schema slips past parsing but the
        // scorer must surface it as a mismatch, not panic or mis-score.
        let drifted = TEST_ARTIFACT
            .replace("\"sex\": \"categorical\"", "\"sex\": \"integer\"")
            .replace(
                "\"numeric\": {",
                "\"numeric\": {\"sex\": {\"mean\": 0.0, \"stddev\": 1.0, \"weight\": 0.0},",
            );
        let artifact = ModelArtifact::from_json(&drifted).unwrap();

        let err = artifact.score(&test_observation()).unwrap_err();
        let ScoreError::ArtifactMismatch(message) = err;
        assert!(message.contains("sex"));
    }

    #[test]
    fn unseen_category_contributes_zero() {
        // `Never-worked` removed from the workclass table: still scores,
        // with the one-hot term contributing nothing.
        let thinner = TEST_ARTIFACT.replace("\"Never-worked\": -0.71, ", "");
        let artifact = ModelArtifact::from_json(&thinner).unwrap();

        let mut obs = test_observation();
        obs.workclass = "Never-worked".to_string();
        let scoring = artifact.score(&obs).unwrap();
        assert!((0.0..=1.0).contains(&scoring.probability));
    }

    fn arb_observation() -> impl Strategy<Value = Observation> {
        use crate::observation::{
            EDUCATION_VALUES, MARITAL_STATUS_VALUES, RACE_VALUES, SEX_VALUES, WORKCLASS_VALUES,
        };

        (
            10i64..=100,
            prop::sample::select(&SEX_VALUES[..]),
            prop::sample::select(&RACE_VALUES[..]),
            prop::sample::select(&WORKCLASS_VALUES[..]),
            prop::sample::select(&EDUCATION_VALUES[..]),
            (
                prop::sample::select(&MARITAL_STATUS_VALUES[..]),
                0i64..=100_000,
                0i64..=10_000,
                0i64..=168,
            ),
        )
            .prop_map(
                |(age, sex, race, workclass, education, (marital_status, gain, loss, hours))| {
                    Observation {
                        age,
                        sex: sex.to_string(),
                        race: race.to_string(),
                        workclass: workclass.to_string(),
                        education: education.to_string(),
                        marital_status: marital_status.to_string(),
                        capital_gain: gain,
                        capital_loss: loss,
                        hours_per_week: hours,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn probability_always_in_unit_interval(obs in arb_observation()) {
            let artifact = ModelArtifact::from_json(TEST_ARTIFACT).unwrap();
            let scoring = artifact.score(&obs).unwrap();
            prop_assert!((0.0..=1.0).contains(&scoring.probability));
            prop_assert_eq!(scoring.decision, scoring.probability >= artifact.threshold());
        }
    }
}
