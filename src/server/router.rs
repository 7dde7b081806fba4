use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{capture, database, health, history, query, ui};
use crate::state::AppState;

/// The full application router: the chat page, the API surface from the
/// original backend, CORS for local origins, and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ui::chat_page))
        .route("/favicon.ico", get(ui::favicon))
        .route("/api/health", get(health::health))
        .route("/api/query", post(query::query))
        .route("/api/capture/full", post(capture::capture_full))
        .route("/api/capture/region", post(capture::capture_region))
        .route("/api/stats", get(database::get_stats))
        .route(
            "/api/history",
            get(history::get_history).delete(history::clear_history),
        )
        .route("/api/history/system", post(history::add_system_message))
        .route("/api/database", delete(database::clear_database))
        .with_state(state)
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer() -> CorsLayer {
    let origins = default_local_origins()
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<&'static str> {
    vec![
        "http://localhost",
        "http://localhost:5555",
        "http://127.0.0.1",
        "http://127.0.0.1:5555",
    ]
}
