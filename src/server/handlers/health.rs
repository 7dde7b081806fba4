use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.readiness();
    Json(json!({
        "status": "ok",
        "initialized": readiness.is_ready(),
        "message": readiness.message(),
    }))
}
