use std::sync::Arc;

use chrono::Utc;

use crate::protocol::{NewMessagePayload, SendMessagePayload, ServerEvent};

use super::session::Session;
use super::ChatServer;

impl ChatServer {
    /// Relay a chat message to everyone else in the sender's room.
    pub(crate) fn handle_send_message(
        &self,
        origin: &Arc<Session>,
        payload: SendMessagePayload,
    ) -> usize {
        if let Some(claimed) = payload.from.as_deref() {
            if claimed != origin.name() {
                tracing::debug!(
                    session_id = %origin.id(),
                    name = %origin.name(),
                    %claimed,
                    "Ignoring client-supplied sender name"
                );
            }
        }

        let event = ServerEvent::NewMessage(NewMessagePayload {
            message: payload.message,
            from: origin.name().to_string(),
            sent: Utc::now(),
        });

        let room = origin.room();
        self.broadcast_to_room(&room, Arc::new(event), Some(origin))
    }

    /// Deliver `event` to every session in `room`, skipping `exclude`.
    ///
    /// Works on a snapshot of the membership taken up front. Delivery is
    /// non-blocking per recipient; failures are logged and do not stop the
    /// loop. Returns the number of sessions the event was queued for.
    pub fn broadcast_to_room(
        &self,
        room: &str,
        event: Arc<ServerEvent>,
        exclude: Option<&Arc<Session>>,
    ) -> usize {
        let excluded = exclude.map(|session| session.id());
        let recipients: Vec<Arc<Session>> = self
            .sessions_in_room(room)
            .into_iter()
            .filter(|session| Some(session.id()) != excluded)
            .collect();

        let mut delivered = 0;
        for recipient in &recipients {
            match recipient.deliver(event.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        session_id = %recipient.id(),
                        name = %recipient.name(),
                        %room,
                        error = %err,
                        "Failed to deliver broadcast"
                    );
                }
            }
        }

        tracing::debug!(%room, recipients = recipients.len(), delivered, "Broadcast complete");
        delivered
    }
}
