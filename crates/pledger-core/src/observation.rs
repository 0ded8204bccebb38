//! The observation schema.
//!
//! A scoring request carries exactly nine columns. Their canonical wire
//! names, categorical domains, and numeric ranges are defined here and
//! shared by the validator and the predictor so the two can never drift
//! apart.

use serde::{Deserialize, Serialize};

/// Canonical column names, wire spelling.
pub mod field {
    /// Age in years.
    pub const AGE: &str = "age";
    /// Reported sex.
    pub const SEX: &str = "sex";
    /// Reported race.
    pub const RACE: &str = "race";
    /// Employment class.
    pub const WORKCLASS: &str = "workclass";
    /// Highest education level attained.
    pub const EDUCATION: &str = "education";
    /// Marital status.
    pub const MARITAL_STATUS: &str = "marital-status";
    /// Capital gains for the year.
    pub const CAPITAL_GAIN: &str = "capital-gain";
    /// Capital losses for the year.
    pub const CAPITAL_LOSS: &str = "capital-loss";
    /// Hours worked per week.
    pub const HOURS_PER_WEEK: &str = "hours-per-week";
}

/// The complete column set. A payload must carry exactly these keys.
pub const COLUMNS: [&str; 9] = [
    field::AGE,
    field::SEX,
    field::RACE,
    field::WORKCLASS,
    field::EDUCATION,
    field::MARITAL_STATUS,
    field::CAPITAL_GAIN,
    field::CAPITAL_LOSS,
    field::HOURS_PER_WEEK,
];

/// Allowed values for `sex`.
pub const SEX_VALUES: [&str; 2] = ["Male", "Female"];

/// Allowed values for `race`.
pub const RACE_VALUES: [&str; 5] = [
    "White",
    "Black",
    "Asian-Pac-Islander",
    "Amer-Indian-Eskimo",
    "Other",
];

/// Allowed values for `workclass`. The upstream training data encodes
/// unknown employment as a literal `?`, so it is a valid category.
pub const WORKCLASS_VALUES: [&str; 9] = [
    "State-gov",
    "Self-emp-not-inc",
    "Private",
    "Federal-gov",
    "Local-gov",
    "?",
    "Self-emp-inc",
    "Without-pay",
    "Never-worked",
];

/// Allowed values for `education`.
pub const EDUCATION_VALUES: [&str; 16] = [
    "Bachelors",
    "HS-grad",
    "11th",
    "Masters",
    "9th",
    "Some-college",
    "Assoc-acdm",
    "Assoc-voc",
    "7th-8th",
    "Doctorate",
    "Prof-school",
    "5th-6th",
    "10th",
    "1st-4th",
    "Preschool",
    "12th",
];

/// Allowed values for `marital-status`.
pub const MARITAL_STATUS_VALUES: [&str; 7] = [
    "Never-married",
    "Married-civ-spouse",
    "Divorced",
    "Married-spouse-absent",
    "Separated",
    "Married-AF-spouse",
    "Widowed",
];

/// Categorical columns in validation order, each with its domain.
pub const CATEGORICAL_DOMAINS: [(&str, &[&str]); 5] = [
    (field::SEX, &SEX_VALUES),
    (field::RACE, &RACE_VALUES),
    (field::WORKCLASS, &WORKCLASS_VALUES),
    (field::EDUCATION, &EDUCATION_VALUES),
    (field::MARITAL_STATUS, &MARITAL_STATUS_VALUES),
];

/// Inclusive bounds for `age`.
pub const AGE_RANGE: (i64, i64) = (10, 100);

/// Inclusive bounds for `hours-per-week`.
pub const HOURS_PER_WEEK_RANGE: (i64, i64) = (0, 168);

/// A single validated observation.
///
/// Construction goes through [`crate::validate::validate`]; an
/// `Observation` obtained that way satisfies every domain rule, so
/// downstream consumers (the predictor, the ledger) never re-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Age in years, 10-100 inclusive.
    pub age: i64,
    /// One of [`SEX_VALUES`].
    pub sex: String,
    /// One of [`RACE_VALUES`].
    pub race: String,
    /// One of [`WORKCLASS_VALUES`].
    pub workclass: String,
    /// One of [`EDUCATION_VALUES`].
    pub education: String,
    /// One of [`MARITAL_STATUS_VALUES`].
    #[serde(rename = "marital-status")]
    pub marital_status: String,
    /// Non-negative capital gains.
    #[serde(rename = "capital-gain")]
    pub capital_gain: i64,
    /// Non-negative capital losses.
    #[serde(rename = "capital-loss")]
    pub capital_loss: i64,
    /// Hours worked per week, 0-168 inclusive.
    #[serde(rename = "hours-per-week")]
    pub hours_per_week: i64,
}

impl Observation {
    /// Looks up a categorical column by its wire name.
    ///
    /// Returns `None` for numeric columns and names outside the schema.
    #[must_use]
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            field::SEX => Some(&self.sex),
            field::RACE => Some(&self.race),
            field::WORKCLASS => Some(&self.workclass),
            field::EDUCATION => Some(&self.education),
            field::MARITAL_STATUS => Some(&self.marital_status),
            _ => None,
        }
    }

    /// Looks up a numeric column by its wire name.
    ///
    /// Returns `None` for categorical columns and names outside the schema.
    #[must_use]
    pub fn numeric(&self, column: &str) -> Option<i64> {
        match column {
            field::AGE => Some(self.age),
            field::CAPITAL_GAIN => Some(self.capital_gain),
            field::CAPITAL_LOSS => Some(self.capital_loss),
            field::HOURS_PER_WEEK => Some(self.hours_per_week),
            _ => None,
        }
    }
}
