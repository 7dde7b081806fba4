use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

const CHAT_PAGE: &str = include_str!("../../../assets/chat.html");

pub async fn chat_page() -> impl IntoResponse {
    Html(CHAT_PAGE)
}

/// Empty favicon so browsers stop asking.
pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
