//! HTTP request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::prediction::FeatureImportance;
use crate::request::{CustomerProfile, CATEGORICAL_FIELDS, UNCOLLECTED_DEFAULTS};

use super::error::{DashboardError, Result};
use super::state::AppState;
use super::view::{default_profile, render_page, Outcome};

/// Empty form with default values
pub async fn serve_index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let contract = &state.predictor.artifacts().encoding;
    Ok(Html(render_page(contract, &default_profile(contract), None, None)?))
}

/// Form submission: re-render the form with the gauge and importance chart,
/// or with an error banner when the input is rejected
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<CustomerProfile>, FormRejection>,
) -> Result<Response> {
    let contract = &state.predictor.artifacts().encoding;

    // unparseable fields (empty, non-integer) get the same banner as range errors
    let profile = match form {
        Ok(Form(profile)) => profile,
        Err(rejection) => {
            debug!(detail = %rejection.body_text(), "Rejected form body");
            let page = render_page(contract, &default_profile(contract), None, Some(&rejection.body_text()))?;
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
    };

    match state.predictor.predict(&profile) {
        Ok(prediction) => {
            let importances = state.predictor.explain()?;
            info!(
                probability = prediction.probability,
                potential = prediction.potential.label(),
                "Form prediction"
            );
            let outcome = Outcome {
                prediction: &prediction,
                importances: &importances,
            };
            let page = render_page(contract, &profile, Some(&outcome), None)?;
            Ok(Html(page).into_response())
        }
        Err(e) if e.is_input_error() => {
            let page = render_page(contract, &profile, None, Some(&e.to_string()))?;
            Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
        }
        Err(e) => Err(DashboardError::from(e)),
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub probability: f64,
    pub label: &'static str,
    pub confidence: f64,
    pub message: String,
    /// Global importances, ascending
    pub top_features: Vec<FeatureImportance>,
}

/// JSON prediction for programmatic clients
pub async fn predict_api(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CustomerProfile>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(profile) = body.map_err(|rejection| DashboardError::Rejected(rejection.body_text()))?;
    let prediction = state.predictor.predict(&profile)?;
    let top_features = state.predictor.explain()?;

    info!(probability = prediction.probability, "API prediction");

    Ok(Json(PredictResponse {
        probability: prediction.probability,
        label: prediction.potential.label(),
        confidence: prediction.confidence,
        message: prediction.message(),
        top_features,
    }))
}

/// Feature order and selector options of the loaded model
pub async fn features(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let artifacts = state.predictor.artifacts();

    let mut options = BTreeMap::new();
    for field in CATEGORICAL_FIELDS {
        options.insert(field, artifacts.encoding.labels(field)?);
    }
    let uncollected: BTreeMap<&str, f64> = UNCOLLECTED_DEFAULTS.into_iter().collect();

    Ok(Json(json!({
        "features": artifacts.features.names(),
        "categorical": options,
        "uncollected_defaults": uncollected,
        "encoding_version": artifacts.encoding.version(),
    })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let artifacts = state.predictor.artifacts();
    Json(json!({
        "status": "ok",
        "trees": artifacts.model.n_trees(),
        "features": artifacts.features.len(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
