use crate::server::{ChatServer, Inbound, Outbound, Session, SessionTransport};
use axum::extract::ws::{Message, WebSocket};
use futures_util::StreamExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use super::sending::{close_frame_for, policy_violation, send_close, send_outbound};

/// How long the writer may spend delivering the close frame to a peer.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);
/// How long teardown waits for the writer before aborting it.
const WRITER_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Bridge an upgraded socket to a chat session.
///
/// The writer task drains the session's outbound queue; this task reads
/// frames into the inbound queue. Either side ending tears the session down.
pub(super) async fn handle_socket(
    socket: WebSocket,
    server: Arc<ChatServer>,
    name: String,
    otp: String,
) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(server.config().outbound_queue_capacity);
    let (in_tx, in_rx) = mpsc::channel::<Inbound>(server.config().inbound_queue_capacity);

    let session = match server.admit(
        &name,
        &otp,
        SessionTransport {
            outbound: out_tx,
            inbound: in_rx,
        },
    ) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(%name, error = %err, "Closing connection that failed admission");
            let _ = timeout(
                CLOSE_FRAME_TIMEOUT,
                send_close(&mut sender, policy_violation(err.to_string())),
            )
            .await;
            return;
        }
    };
    let session_id = session.id();
    tracing::info!(%session_id, %name, "WebSocket connection established");

    let writer_session = session.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = writer_session.closed() => break,
                frame = out_rx.recv() => {
                    let Some(frame) = frame else { break };
                    // A peer that stops reading stalls the write; teardown must not wait on it.
                    tokio::select! {
                        () = writer_session.closed() => break,
                        written = send_outbound(&mut sender, frame, &session_id) => {
                            if written.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        if writer_session.is_closed() {
            let frame = close_frame_for(writer_session.disconnect_reason());
            if timeout(CLOSE_FRAME_TIMEOUT, send_close(&mut sender, frame))
                .await
                .is_err()
            {
                tracing::debug!(%session_id, "Peer did not accept close frame in time");
            }
        }
    });

    loop {
        let msg = tokio::select! {
            () = session.closed() => break,
            msg = receiver.next() => msg,
        };

        let flow = match msg {
            Some(Ok(msg)) => forward_frame(&session, &in_tx, msg).await,
            Some(Err(err)) => {
                tracing::warn!(%session_id, error = %err, "WebSocket error");
                ControlFlow::Break(())
            }
            None => ControlFlow::Break(()),
        };

        if flow.is_break() {
            break;
        }
    }

    // Dropping the inbound sender lets the event loop notice a vanished peer.
    drop(in_tx);
    server.remove(&session_id);

    match timeout(WRITER_SHUTDOWN_GRACE, &mut send_task).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::debug!(%session_id, error = %err, "Writer task ended abnormally");
        }
        Err(_) => {
            tracing::warn!(%session_id, "Writer task did not stop in time, aborting");
            send_task.abort();
        }
    }
    tracing::info!(%session_id, "WebSocket connection finished");
}

/// Hand one frame read from the socket to the session.
///
/// Pongs are recorded on the session directly so a backed-up inbound queue
/// never delays the liveness reply.
async fn forward_frame(
    session: &Session,
    inbound: &mpsc::Sender<Inbound>,
    msg: Message,
) -> ControlFlow<()> {
    let session_id = session.id();
    match msg {
        Message::Text(text) => {
            if inbound.send(Inbound::Text(text.to_string())).await.is_err() {
                return ControlFlow::Break(());
            }
        }
        Message::Pong(_) => session.mark_alive(),
        Message::Close(frame) => {
            tracing::info!(%session_id, ?frame, "WebSocket connection closed by peer");
            let _ = inbound.send(Inbound::Closed).await;
            return ControlFlow::Break(());
        }
        Message::Binary(payload) => {
            tracing::warn!(%session_id, size = payload.len(), "Ignoring binary frame");
        }
        // Pings are answered by the WebSocket layer itself.
        Message::Ping(_) => {}
    }
    ControlFlow::Continue(())
}
