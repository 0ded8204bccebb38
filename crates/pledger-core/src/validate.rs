//! Request validation.
//!
//! Validation is an ordered chain of independent checks over the raw JSON
//! request, short-circuiting on the first failure: envelope, column set,
//! categorical domains, then each numeric column (age, capital-gain,
//! capital-loss, hours-per-week). The order is part of the observable
//! contract; for a multiply-invalid input, callers see the error from the
//! earliest failing check.
//!
//! Every function here is pure: identical input always yields the
//! identical outcome, and nothing is mutated.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::observation::{self, Observation, field};

/// A rejected request, carrying enough context to name the field, the
/// offending value, and (for categoricals) the allowed set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required envelope field is absent.
    #[error("field `{field}` missing from request")]
    MissingField {
        /// Name of the missing envelope field.
        field: &'static str,
    },

    /// The observation identifier is present but unusable.
    #[error("field `observation_id` must be a non-empty string")]
    InvalidObservationId,

    /// The `data` field is present but not an observation mapping.
    #[error("field `data` must be an object")]
    InvalidPayload,

    /// The payload lacks one or more required columns.
    #[error("missing columns: {}", .columns.join(", "))]
    MissingColumns {
        /// The absent columns, in schema order.
        columns: Vec<String>,
    },

    /// The payload carries columns outside the schema.
    #[error("unrecognized columns provided: {}", .columns.join(", "))]
    UnrecognizedColumns {
        /// The unexpected columns.
        columns: Vec<String>,
    },

    /// A categorical column holds a value outside its domain.
    #[error(
        "invalid value provided for {field}: {value}. Allowed values are: {}",
        .allowed.join(", ")
    )]
    InvalidCategoricalValue {
        /// The offending column.
        field: &'static str,
        /// The rejected value, rendered as JSON.
        value: String,
        /// The column's domain.
        allowed: &'static [&'static str],
    },

    /// A numeric column holds something other than an integer.
    #[error("field `{field}` is not an integer: `{field}` is {value}")]
    WrongType {
        /// The offending column.
        field: &'static str,
        /// The rejected value, rendered as JSON.
        value: String,
    },

    /// A numeric column falls outside its inclusive bounds.
    #[error("field `{field}` is not between {min} and {max}: `{field}` is {value}")]
    OutOfRange {
        /// The offending column.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Lower inclusive bound.
        min: i64,
        /// Upper inclusive bound.
        max: i64,
    },

    /// A numeric column that must be non-negative is negative.
    #[error("field `{field}` is not a non-negative integer: `{field}` is {value}")]
    Negative {
        /// The offending column.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },
}

/// Splits the request envelope into the observation identifier and the
/// data payload.
///
/// The envelope must carry a non-empty string `observation_id` and an
/// object-valued `data`. Checked in that order.
///
/// # Errors
///
/// Returns the first failing envelope check.
pub fn parse_envelope(raw: &Value) -> Result<(String, &Map<String, Value>), ValidationError> {
    let envelope = raw.as_object();

    let id = envelope
        .and_then(|m| m.get("observation_id"))
        .ok_or(ValidationError::MissingField {
            field: "observation_id",
        })?;
    let id = id
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::InvalidObservationId)?;

    let data = envelope
        .and_then(|m| m.get("data"))
        .ok_or(ValidationError::MissingField { field: "data" })?;
    let payload = data.as_object().ok_or(ValidationError::InvalidPayload)?;

    Ok((id.to_string(), payload))
}

/// Validates a data payload against the observation schema.
///
/// Runs the full check chain and, on success, returns the typed
/// observation. Check order: column set, categorical domains (sex, race,
/// workclass, education, marital-status), then age, capital-gain,
/// capital-loss, and hours-per-week.
///
/// # Errors
///
/// Returns the error from the first failing check.
pub fn validate(payload: &Map<String, Value>) -> Result<Observation, ValidationError> {
    check_column_set(payload)?;

    let sex = check_categorical(payload, field::SEX, &observation::SEX_VALUES)?;
    let race = check_categorical(payload, field::RACE, &observation::RACE_VALUES)?;
    let workclass = check_categorical(payload, field::WORKCLASS, &observation::WORKCLASS_VALUES)?;
    let education = check_categorical(payload, field::EDUCATION, &observation::EDUCATION_VALUES)?;
    let marital_status = check_categorical(
        payload,
        field::MARITAL_STATUS,
        &observation::MARITAL_STATUS_VALUES,
    )?;

    let (age_min, age_max) = observation::AGE_RANGE;
    let age = check_bounded_integer(payload, field::AGE, age_min, age_max)?;
    let capital_gain = check_non_negative_integer(payload, field::CAPITAL_GAIN)?;
    let capital_loss = check_non_negative_integer(payload, field::CAPITAL_LOSS)?;
    let (hours_min, hours_max) = observation::HOURS_PER_WEEK_RANGE;
    let hours_per_week = check_bounded_integer(payload, field::HOURS_PER_WEEK, hours_min, hours_max)?;

    Ok(Observation {
        age,
        sex: sex.to_string(),
        race: race.to_string(),
        workclass: workclass.to_string(),
        education: education.to_string(),
        marital_status: marital_status.to_string(),
        capital_gain,
        capital_loss,
        hours_per_week,
    })
}

/// The payload's key set must equal the schema's column set exactly.
/// Missing columns are reported before unrecognized ones.
fn check_column_set(payload: &Map<String, Value>) -> Result<(), ValidationError> {
    let missing: Vec<String> = observation::COLUMNS
        .iter()
        .filter(|column| !payload.contains_key(**column))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing });
    }

    let unrecognized: Vec<String> = payload
        .keys()
        .filter(|key| !observation::COLUMNS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unrecognized.is_empty() {
        return Err(ValidationError::UnrecognizedColumns {
            columns: unrecognized,
        });
    }

    Ok(())
}

fn check_categorical<'a>(
    payload: &'a Map<String, Value>,
    field: &'static str,
    allowed: &'static [&'static str],
) -> Result<&'a str, ValidationError> {
    let value = payload
        .get(field)
        .ok_or(ValidationError::MissingField { field })?;

    let text = value
        .as_str()
        .ok_or_else(|| ValidationError::InvalidCategoricalValue {
            field,
            value: value.to_string(),
            allowed,
        })?;

    if allowed.contains(&text) {
        Ok(text)
    } else {
        Err(ValidationError::InvalidCategoricalValue {
            field,
            value: text.to_string(),
            allowed,
        })
    }
}

/// A numeric column must be present and hold a JSON integer. Floats
/// (including whole-valued ones), strings, booleans, and null are all
/// `WrongType`; JSON cannot encode NaN or infinities, so those are
/// unrepresentable here by construction.
fn check_integer(payload: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let value = payload
        .get(field)
        .ok_or(ValidationError::MissingField { field })?;

    value.as_i64().ok_or_else(|| ValidationError::WrongType {
        field,
        value: value.to_string(),
    })
}

fn check_bounded_integer(
    payload: &Map<String, Value>,
    field: &'static str,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    let value = check_integer(payload, field)?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn check_non_negative_integer(
    payload: &Map<String, Value>,
    field: &'static str,
) -> Result<i64, ValidationError> {
    let value = check_integer(payload, field)?;
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}
