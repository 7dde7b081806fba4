use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let components = state.components().await?;

    let question = payload
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No query provided".to_string()))?;

    let answer = components.pipeline.answer(question).await?;

    state
        .history
        .append_exchange(question, answer.text.as_str())
        .await;

    Ok(Json(json!({
        "response": answer.text,
        "sources": answer.sources,
        "success": true,
    })))
}
