use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rdv_voice_backend::config::Config;
use rdv_voice_backend::routes;
use rdv_voice_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("rdv_voice_backend=debug,tower_http=debug")
        .init();

    let config = Config::resolve()?;
    let state = AppState::new(config);

    let app = Router::new()
        .merge(routes::create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.system.host, state.config.system.port
    )
    .parse()?;
    info!("Mock n8n webhook server listening on http://{}", addr);
    for path in &state.config.system.webhook_paths {
        info!("  POST {}", path);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
