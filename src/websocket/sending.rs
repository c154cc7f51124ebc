use crate::protocol::{ServerEvent, SessionId};
use crate::server::{DisconnectReason, Outbound};
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

pub(super) type WsSink = SplitSink<WebSocket, Message>;

/// Write one queued frame. `Err` means the socket is gone.
pub(super) async fn send_outbound(
    sender: &mut WsSink,
    frame: Outbound,
    session_id: &SessionId,
) -> Result<(), ()> {
    let message = match frame {
        Outbound::Event(event) => match encode_event(&event) {
            Some(text) => Message::Text(text.into()),
            None => return Ok(()),
        },
        Outbound::Ping => Message::Ping(Vec::new().into()),
    };

    if let Err(err) = sender.send(message).await {
        tracing::warn!(%session_id, error = %err, "Failed to write frame, connection closed");
        return Err(());
    }

    Ok(())
}

fn encode_event(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize server event");
            None
        }
    }
}

/// Close frame sent when a session is torn down from the server side.
pub(super) fn close_frame_for(reason: Option<DisconnectReason>) -> CloseFrame {
    match reason {
        Some(DisconnectReason::LivenessTimeout) => CloseFrame {
            code: close_code::AWAY,
            reason: "liveness timeout".into(),
        },
        _ => CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        },
    }
}

/// Close frame for a connection that failed admission after the upgrade.
pub(super) fn policy_violation(reason: String) -> CloseFrame {
    CloseFrame {
        code: close_code::POLICY,
        reason: reason.into(),
    }
}

pub(super) async fn send_close(sender: &mut WsSink, frame: CloseFrame) {
    if let Err(err) = sender.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %err, "Failed to send close frame");
    }
    let _ = sender.close().await;
}
