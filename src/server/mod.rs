mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/imei/{imei}", get(handlers::imei))
        .route("/api/locations/search", get(handlers::search))
        .route("/api/locations/suggest", get(handlers::suggest))
        .route("/api/locations/reverse", get(handlers::reverse))
        .route("/api/locations/random", get(handlers::random))
        .route("/api/cities", get(handlers::city_list))
        .route("/api/cities/{name}/districts", get(handlers::district_list))
        .route("/api/reports/validate", post(handlers::validate_report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(Arc::clone(&state));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Trackzer API listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.resolver.close();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
