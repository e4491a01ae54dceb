//! HTTP service over the retrieval pipeline and hosted chat models.
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use routes::{sanitize_filename, store_upload};
pub use state::{AppState, PipelineLoader};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let body_limit = state.settings().server.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health))
        .route("/upload", post(routes::upload))
        .route("/ask_rag", post(routes::ask_rag))
        .route("/chat", post(routes::chat))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build the pipeline in the background so the first upload does not pay for
/// loading the model. A failure is logged and retried on the next upload.
pub fn spawn_warmup(state: &AppState) -> tokio::task::JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        match state.pipeline().await {
            Ok(p) => tracing::info!(embedder = p.embedder().id(), "retrieval pipeline ready"),
            Err(e) => tracing::error!(detail = %e.detail, "retrieval pipeline failed to initialize"),
        }
    })
}
