use crate::config::AppConfig;
use crate::stats::{self, Summary};
use crate::types::{Dataset, DeathRecord, PumpRecord};
use anyhow::Result;
use axum::{extract::State, response::Json, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

/// Shared request state: the finished dataset and its precomputed summary.
/// Both are immutable after startup, so handlers need no locking.
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub summary: Summary,
}

pub async fn start_server(config: AppConfig, dataset: Arc<Dataset>) -> Result<()> {
    let summary = stats::summarize(&dataset);
    let state = Arc::new(AppState { dataset, summary });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));

    let mut router = Router::new()
        .route("/api/deaths", get(deaths_handler))
        .route("/api/pumps", get(pumps_handler))
        .route("/api/summary", get(summary_handler))
        .layer(CorsLayer::permissive());

    if let Some(static_dir) = &config.server.static_dir {
        router = router.nest_service("/", ServeDir::new(static_dir));
    }

    let app = router.with_state(state);

    info!("serving dashboard API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn deaths_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DeathRecord>> {
    Json(state.dataset.deaths.clone())
}

async fn pumps_handler(State(state): State<Arc<AppState>>) -> Json<Vec<PumpRecord>> {
    Json(state.dataset.pumps.clone())
}

async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.summary.clone())
}
