use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::history::ChatRole;
use crate::state::AppState;

pub async fn get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history = state.history.snapshot().await;
    Json(json!({ "history": history }))
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.history.clear().await;
    Json(json!({ "success": true }))
}

#[derive(Debug, Deserialize)]
pub struct SystemMessageRequest {
    #[serde(default)]
    pub message: String,
}

/// Append a system turn to the chat log (used by the chat page to show
/// out-of-band notices). Empty messages are ignored.
pub async fn add_system_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SystemMessageRequest>,
) -> impl IntoResponse {
    if !payload.message.is_empty() {
        state.history.append(ChatRole::System, payload.message).await;
    }
    Json(json!({ "success": true }))
}
