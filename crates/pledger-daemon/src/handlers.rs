//! HTTP request handlers.
//!
//! The service always responds: validation failures, duplicate
//! identifiers, and unknown identifiers are converted to structured
//! error payloads instead of transport-level failures, and keep HTTP
//! 200; existing clients detect failures by inspecting the body, not
//! the status code. The two exceptions are artifact/schema drift and
//! storage faults, which are server defects and answer 500 (still with
//! a JSON error body).

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pledger_core::ledger::{LedgerError, PredictionRecord};
use pledger_core::validate;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::state::SharedState;

/// Builds the service router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/update", post(update))
        .route("/list-db-contents", get(list_db_contents))
        .route("/metrics", get(export_metrics))
        .with_state(state)
}

/// `POST /predict` - validate, score, and record an observation.
///
/// On a duplicate identifier the freshly computed score is still
/// returned alongside the error; it just is not persisted.
async fn predict(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let (observation_id, observation) = {
        let (observation_id, payload) = match validate::parse_envelope(&body) {
            Ok(parts) => parts,
            Err(e) => {
                state.metrics.observe_request("predict", "rejected");
                return payload_error(e.to_string());
            },
        };

        match validate::validate(payload) {
            Ok(observation) => (observation_id, observation),
            Err(e) => {
                warn!(observation_id = %observation_id, error = %e, "rejected observation");
                state.metrics.observe_request("predict", "rejected");
                return payload_error(e.to_string());
            },
        }
    };

    let started = Instant::now();
    let scoring = match state.classifier.score(&observation) {
        Ok(scoring) => scoring,
        Err(e) => {
            // Deployment defect: the artifact and schema have drifted
            // apart. Every request will hit this until one is fixed.
            error!(observation_id = %observation_id, error = %e, "classifier rejected a valid observation");
            state.metrics.observe_request("predict", "artifact_fault");
            return server_error(e.to_string());
        },
    };
    state
        .metrics
        .observe_scoring_seconds(started.elapsed().as_secs_f64());

    let record = PredictionRecord {
        observation_id: observation_id.clone(),
        observation: body.to_string(),
        proba: scoring.probability,
        true_class: None,
    };

    let mut response = json!({
        "prediction": scoring.decision,
        "probability": scoring.probability,
    });

    match state.ledger.insert(&record) {
        Ok(()) => {
            info!(
                observation_id = %observation_id,
                probability = scoring.probability,
                prediction = scoring.decision,
                "scored observation"
            );
            state.metrics.observe_request("predict", "scored");
        },
        Err(e @ LedgerError::DuplicateId { .. }) => {
            warn!(observation_id = %observation_id, "duplicate observation id");
            state.metrics.observe_request("predict", "duplicate");
            response["error"] = Value::String(e.to_string());
        },
        Err(e) => {
            error!(observation_id = %observation_id, error = %e, "failed to persist prediction");
            state.metrics.observe_request("predict", "storage_fault");
            return server_error(e.to_string());
        },
    }

    (StatusCode::OK, Json(response)).into_response()
}

/// `POST /update` - attach a ground-truth label to a scored observation.
async fn update(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let Some(observation_id) = body.get("observation_id").and_then(Value::as_str) else {
        state.metrics.observe_request("update", "rejected");
        return payload_error("field `observation_id` missing from request".to_string());
    };
    let Some(true_class) = body.get("true_class").and_then(Value::as_i64) else {
        state.metrics.observe_request("update", "rejected");
        return payload_error("field `true_class` missing from request".to_string());
    };

    match state.ledger.update_label(observation_id, true_class) {
        Ok(record) => {
            info!(observation_id, true_class, "attached ground-truth label");
            state.metrics.observe_request("update", "updated");
            (StatusCode::OK, Json(record)).into_response()
        },
        Err(e @ LedgerError::NotFound { .. }) => {
            warn!(observation_id, "label update for unknown observation id");
            state.metrics.observe_request("update", "unknown_id");
            payload_error(e.to_string())
        },
        Err(e) => {
            error!(observation_id, error = %e, "failed to update label");
            state.metrics.observe_request("update", "storage_fault");
            server_error(e.to_string())
        },
    }
}

/// `GET /list-db-contents` - every stored record, as field mappings.
async fn list_db_contents(State(state): State<SharedState>) -> Response {
    match state.ledger.list_all() {
        Ok(records) => {
            state.metrics.observe_request("list-db-contents", "listed");
            (StatusCode::OK, Json(records)).into_response()
        },
        Err(e) => {
            error!(error = %e, "failed to list ledger contents");
            state
                .metrics
                .observe_request("list-db-contents", "storage_fault");
            server_error(e.to_string())
        },
    }
}

/// `GET /metrics` - Prometheus text exposition.
async fn export_metrics(State(state): State<SharedState>) -> Response {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            server_error(e.to_string())
        },
    }
}

/// Domain failure: HTTP 200 with the error embedded in the body.
fn payload_error(message: String) -> Response {
    (StatusCode::OK, Json(json!({ "error": message }))).into_response()
}

/// Server defect: HTTP 500, still a JSON body.
fn server_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
