use crate::server::ChatServer;
use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use super::handler::websocket_handler;
use super::login::login_handler;

/// Live counters exposed on `/stats`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub sessions: usize,
    pub pending_credentials: usize,
}

/// Create the Axum router with WebSocket support
pub fn create_router(cors_origins: &str) -> axum::Router<Arc<ChatServer>> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    // Parse CORS origins
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    axum::Router::new()
        .route("/ws", get(websocket_handler))
        .route("/login", post(login_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .fallback(|| async { "Chatroom relay. POST /login for a one-time token, then connect to /ws?name=..&otp=.." })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn stats(State(server): State<Arc<ChatServer>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        sessions: server.session_count(),
        pending_credentials: server.pending_credentials(),
    })
}

/// Serve `server` on `addr` until the listener fails.
///
/// Starts the credential sweeper for the lifetime of the call.
pub async fn run_server(
    addr: SocketAddr,
    server: Arc<ChatServer>,
    cors_origins: &str,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, server, cors_origins).await
}

/// Serve on an already-bound listener. Tests bind to port 0 and read the
/// local address back before handing the listener over.
pub async fn serve(
    listener: tokio::net::TcpListener,
    server: Arc<ChatServer>,
    cors_origins: &str,
) -> anyhow::Result<()> {
    let sweeper = server.start_credential_sweeper();
    let app = create_router(cors_origins).with_state(server);

    tracing::info!(addr = %listener.local_addr()?, %cors_origins, "Chatroom relay listening");
    let result = axum::serve(listener, app).await;
    sweeper.abort();
    result?;

    Ok(())
}
