use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ClassificationResult, Intent};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseEmailRequest {
    pub email: String,
    #[serde(default)]
    pub intent_hint: Option<Intent>,
}

// POST /ai/parse-email
pub async fn parse_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ParseEmailRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    if req.email.is_empty() {
        return Err(AppError::Validation("email content cannot be empty".to_string()));
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, "received parse-email request");

    let result = state
        .classifier
        .classify_with_hint(&req.email, req.intent_hint)
        .await?;

    tracing::info!(
        %request_id,
        intent = %result.intent(),
        tasks = result.well_formed_tasks().count(),
        "email classified"
    );
    Ok(Json(result))
}
