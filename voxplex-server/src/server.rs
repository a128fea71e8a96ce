use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use voxplex_core::session::SessionManager;

use crate::chatbot::ChatSession;
use crate::handlers::{
    get_status, get_transcript, health, index, submit_chat, submit_credential, submit_voice,
};
use crate::state::AppState;

/// Longest gap between idle-session sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/credential", post(submit_credential))
        .route("/chat", post(submit_chat))
        .route("/voice", post(submit_voice))
        .route("/api/transcript", get(get_transcript))
        .route("/api/status", get(get_status))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop sessions idle for longer than `ttl`
pub fn spawn_session_sweeper(
    sessions: Arc<SessionManager<ChatSession>>,
    ttl: Duration,
) -> JoinHandle<()> {
    let period = ttl.min(MAX_SWEEP_INTERVAL).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(ttl);
            if evicted > 0 {
                tracing::info!("Evicted {} idle session(s)", evicted);
            }
        }
    })
}

pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let sweeper = spawn_session_sweeper(state.sessions.clone(), state.idle_ttl);
    tracing::info!(
        "Voice input {}",
        if state.voice_available() { "available" } else { "unavailable" }
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Server shutting down signal received");
        })
        .await;

    sweeper.abort();
    result?;
    Ok(())
}
