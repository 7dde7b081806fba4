//! Command dispatcher.
//!
//! Maps command identifiers to handlers independently of any UI toolkit, so
//! the HTTP surface and a native menu host invoke the same code paths.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capture::CaptureRegion;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    CaptureFullScreen,
    CaptureRegion(CaptureRegion),
    ShowStats,
    ClearDatabase,
}

impl Command {
    pub fn id(&self) -> &'static str {
        match self {
            Command::CaptureFullScreen => "capture-full-screen",
            Command::CaptureRegion(_) => "capture-region",
            Command::ShowStats => "show-stats",
            Command::ClearDatabase => "clear-database",
        }
    }

    /// Resolve a command identifier; region-taking commands get their
    /// region from the caller.
    pub fn parse(id: &str, region: Option<CaptureRegion>) -> Option<Self> {
        match id {
            "capture-full-screen" => Some(Command::CaptureFullScreen),
            "capture-region" => region.map(Command::CaptureRegion),
            "show-stats" => Some(Command::ShowStats),
            "clear-database" => Some(Command::ClearDatabase),
            _ => None,
        }
    }
}

/// What a command produced, in a shape both HTTP handlers and native
/// notifications can render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

impl CommandOutcome {
    fn ok(message: impl Into<String>, detail: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            detail,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            detail: Value::Null,
        }
    }
}

/// Run a command against the initialized components. `NotReady` when
/// initialization has not completed; upstream failures propagate as errors
/// for the caller to render.
pub async fn dispatch(state: &AppState, command: Command) -> Result<CommandOutcome, ApiError> {
    let components = state.components().await?;

    match command {
        Command::CaptureFullScreen => {
            capture_and_store(state, &components, None, "screenshot_full").await
        }
        Command::CaptureRegion(region) => {
            capture_and_store(state, &components, Some(region), "screenshot_region").await
        }
        Command::ShowStats => {
            let stats = components.store.stats().await?;
            Ok(CommandOutcome::ok(
                format!("{} captures stored", stats.total_points),
                json!({ "stats": stats }),
            ))
        }
        Command::ClearDatabase => {
            components.store.delete_collection().await?;
            components.store.ensure_collection().await?;
            Ok(CommandOutcome::ok("Database cleared", Value::Null))
        }
    }
}

async fn capture_and_store(
    state: &AppState,
    components: &crate::state::Components,
    region: Option<CaptureRegion>,
    source: &str,
) -> Result<CommandOutcome, ApiError> {
    let capture = components
        .capture
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("capture is unavailable on this host".to_string()))?;

    let text = capture.capture_text(region).await?;
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < state.config.capture.min_chars {
        return Ok(CommandOutcome::rejected("No meaningful text found"));
    }

    components
        .store
        .add_text(&text, Some(json!({ "source": source })))
        .await?;

    // Characters, not bytes: OCR output is not always ASCII.
    let length = text.chars().count();
    Ok(CommandOutcome::ok(
        format!("Captured {} characters", length),
        json!({ "text_length": length }),
    ))
}
