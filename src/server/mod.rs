// Server module
// HTTP endpoint exposing raw embedding computation


use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::Result;
use crate::embeddings::Embedder;

const MISSING_TEXT: &str = "Missing 'text' in request body";

/// Shared handler state; the model is loaded once and reused by every request
#[derive(Clone)]
struct AppState {
    embedder: Arc<dyn Embedder>,
}

#[derive(Debug, Serialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    model: &'a str,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Pull the `text` field out of a JSON body, if it is present and a string
fn request_text(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("text")?.as_str().map(str::to_string)
}

async fn embed(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(text) = request_text(&body) else {
        debug!("Rejecting embed request without text");
        return error_response(StatusCode::BAD_REQUEST, MISSING_TEXT);
    };

    let embedder = Arc::clone(&state.embedder);
    match tokio::task::spawn_blocking(move || embedder.embed(&text)).await {
        Ok(Ok(embedding)) => (StatusCode::OK, Json(EmbedResponse { embedding })).into_response(),
        Ok(Err(e)) => {
            error!("Embedding failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!("Embedding task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    Json(HealthResponse {
        status: "ok",
        model: state.embedder.model_name(),
    })
    .into_response()
}

/// Routes for `POST /embed` and `GET /health`
#[inline]
pub fn router(embedder: Arc<dyn Embedder>) -> Router {
    Router::new()
        .route("/embed", post(embed))
        .route("/health", get(health))
        .with_state(AppState { embedder })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

/// Serve the embedding endpoint until interrupted
#[inline]
pub async fn serve(addr: SocketAddr, embedder: Arc<dyn Embedder>) -> Result<()> {
    let model = embedder.model_name().to_string();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Embedding server for {} listening on http://{}", model, addr);

    axum::serve(listener, router(embedder))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Embedding server shut down");
    Ok(())
}
