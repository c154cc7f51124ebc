use crate::server::ChatServer;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use super::connection::handle_socket;

/// Query parameters carried by the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub name: Option<String>,
    pub otp: Option<String>,
}

/// WebSocket gateway.
///
/// Refuses the upgrade unless a display name is present and the one-time
/// credential is currently valid. The credential is only probed here; it is
/// consumed by admission once the socket is open.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(server): State<Arc<ChatServer>>,
) -> Response {
    let name = params
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let (Some(name), Some(otp)) = (name, params.otp) else {
        tracing::warn!("Rejected upgrade: missing name or otp");
        return (StatusCode::BAD_REQUEST, "name and otp are required").into_response();
    };

    if !server.check_credential(&otp) {
        tracing::warn!(%name, "Rejected upgrade: invalid or expired otp");
        return (StatusCode::UNAUTHORIZED, "Invalid OTP").into_response();
    }

    ws.max_message_size(server.config().max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, server, name, otp))
}
