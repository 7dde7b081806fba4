use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::capture::CaptureRegion;
use crate::commands::{dispatch, Command, CommandOutcome};
use crate::core::errors::ApiError;
use crate::state::AppState;

/// Flatten a capture outcome; `text_length` only appears when something
/// was actually stored.
fn capture_response(outcome: CommandOutcome) -> Json<Value> {
    let mut body = json!({
        "success": outcome.success,
        "message": outcome.message,
    });
    if let Some(length) = outcome.detail.get("text_length") {
        body["text_length"] = length.clone();
    }
    Json(body)
}

pub async fn capture_full(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = dispatch(&state, Command::CaptureFullScreen).await?;
    Ok(capture_response(outcome))
}

pub async fn capture_region(
    State(state): State<Arc<AppState>>,
    Json(region): Json<CaptureRegion>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = dispatch(&state, Command::CaptureRegion(region)).await?;
    Ok(capture_response(outcome))
}
