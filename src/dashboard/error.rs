//! Error responses for the dashboard

use crate::error::PredictorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Predictor(#[from] PredictorError),

    /// Request body that could not be decoded into a customer profile
    #[error("{0}")]
    Rejected(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Predictor(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            DashboardError::Predictor(PredictorError::RegistryUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Predictor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Rejected(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %message, "Prediction failed");
        } else {
            tracing::debug!(detail = %message, "Rejected customer input");
        }

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let input: DashboardError = PredictorError::OutOfRange {
            field: "Age".to_string(),
            value: 12.0,
            min: 18.0,
            max: 70.0,
        }
        .into();
        assert_eq!(input.status(), StatusCode::BAD_REQUEST);

        let registry: DashboardError = PredictorError::RegistryUnavailable {
            repo: "alice/m".to_string(),
            file: "model.bin".to_string(),
            reason: "HTTP 404".to_string(),
        }
        .into();
        assert_eq!(registry.status(), StatusCode::SERVICE_UNAVAILABLE);

        let schema: DashboardError = PredictorError::MissingFeature {
            feature: "NewSignal".to_string(),
            available: "Age".to_string(),
        }
        .into();
        assert_eq!(schema.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = DashboardError::Rejected("missing field `age`".to_string());
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
