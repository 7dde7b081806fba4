use anyhow::Context;
use tokio::net::TcpListener;

use second_brain::config::AppConfig;
use second_brain::server::router::router;
use second_brain::state::AppState;
use second_brain::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_dir);

    let bind_addr = config.bind_addr();
    let state = AppState::new(config);

    // One-shot component initialization runs in the background so the
    // server can answer health checks immediately.
    state.spawn_bootstrap();

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on http://{}", addr);

    let app = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
