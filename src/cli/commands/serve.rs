//! HTTP API server for integration with other systems.
//!
//! Every `/ask` request loads the index snapshot afresh, so a re-ingest is
//! picked up without restarting the server.

use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{handle_query, QueryResult};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    settings: Settings,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let app = router(settings);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vedabot API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(settings: Settings) -> Router {
    let state = Arc::new(AppState { settings });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Json<QueryResult> {
    info!("POST /ask ({} chars)", req.question.len());
    Json(handle_query(&state.settings, &req.question).await)
}
