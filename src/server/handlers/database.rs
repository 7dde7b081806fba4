use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::commands::{dispatch, Command};
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = dispatch(&state, Command::ShowStats).await?;
    Ok(Json(json!({
        "success": true,
        "stats": outcome.detail["stats"],
    })))
}

/// Clear every stored capture, then immediately re-create the (now empty)
/// collection so the store stays usable.
pub async fn clear_database(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = dispatch(&state, Command::ClearDatabase).await?;
    Ok(Json(json!({
        "success": outcome.success,
        "message": outcome.message,
    })))
}
