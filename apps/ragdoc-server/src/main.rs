use std::net::SocketAddr;

use anyhow::Context;
use ragdoc_core::config::Config;
use ragdoc_server::{router, spawn_warmup, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let settings = config.settings().clone();
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", settings.server.host, settings.server.port))?;

    tracing::info!(chunk_words = settings.rag.chunk_words, top_k = settings.rag.top_k, "configuration loaded");
    let state = AppState::from_settings(settings)?;
    tracing::info!(upload_dir = %state.upload_dir().display(), "uploads directory");
    spawn_warmup(&state);

    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, router(state)).await.context("server error")?;
    Ok(())
}
