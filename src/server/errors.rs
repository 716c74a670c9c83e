use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::llm::LlmError;
use crate::research::ResearchError;

use super::timestamp;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Error en la búsqueda: {0}")]
    Research(#[from] ResearchError),

    #[error("Error del modelo de lenguaje: {0}")]
    Model(#[from] LlmError),

    #[error("La solicitud superó el tiempo límite de {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Research(_) => StatusCode::BAD_GATEWAY,
            ApiError::Model(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::InvalidInput(_) => warn!(error = %self, "rejected request"),
            ApiError::Research(e) => {
                error!(error = %self, upstream_status = ?e.upstream_status(), "analysis failed")
            }
            _ => error!(error = %self, "analysis failed"),
        }

        let body = json!({
            "error": self.to_string(),
            "timestamp": timestamp(),
        });
        (status, Json(body)).into_response()
    }
}
