use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::{ApiError, AppState, timestamp};
use crate::agents::Transcript;
use crate::research::ResearchBundle;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    brand_task: Option<String>,
    user_task: Option<String>,
}

impl AnalyzeRequest {
    fn into_tasks(self) -> Result<(String, String), ApiError> {
        let field = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        match (field(self.brand_task), field(self.user_task)) {
            (Some(brand), Some(user)) => Ok((brand, user)),
            _ => Err(ApiError::InvalidInput("Faltan campos requeridos".into())),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeResponse {
    status: &'static str,
    brand_task: String,
    user_task: String,
    search_results: ResearchBundle,
    response: Transcript,
    timestamp: String,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        ApiError::InvalidInput(format!("La solicitud debe ser JSON ({})", e.body_text()))
    })?;
    let (brand_task, user_task) = request.into_tasks()?;
    info!(brand_task = %brand_task, user_task = %user_task, "analysis requested");

    let limit = state.inner.request_timeout;
    let (search_results, response) = tokio::time::timeout(limit, state.analyze(&brand_task, &user_task))
        .await
        .map_err(|_| ApiError::Timeout(limit))??;

    info!(rounds = response.rounds, "analysis complete");
    Ok(Json(AnalyzeResponse {
        status: "success",
        brand_task,
        user_task,
        search_results,
        response,
        timestamp: timestamp(),
    }))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
    }))
}
