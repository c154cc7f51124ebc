use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{ClientEvent, EventError, RawEvent, SessionId};

use super::session::Session;
use super::ChatServer;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("session {0} is no longer registered")]
    SessionNotRegistered(SessionId),
}

impl ChatServer {
    /// Dispatch one inbound event from `origin`.
    ///
    /// Failures are logged and swallowed: a bad event never takes the
    /// session, or anybody else, down with it.
    pub fn route(&self, event: RawEvent, origin: &Arc<Session>) {
        let kind = event.kind.clone();
        if let Err(err) = self.try_route(event, origin) {
            tracing::warn!(
                session_id = %origin.id(),
                name = %origin.name(),
                event_type = %kind,
                error = %err,
                "Failed to handle event"
            );
        }
    }

    pub(crate) fn try_route(&self, event: RawEvent, origin: &Arc<Session>) -> Result<(), RouteError> {
        let event = ClientEvent::try_from(event)?;

        // Events still queued when a session is torn down are dropped.
        if origin.is_closed() || !self.sessions.contains_key(&origin.id()) {
            return Err(RouteError::SessionNotRegistered(origin.id()));
        }

        match event {
            ClientEvent::SendMessage(payload) => {
                self.handle_send_message(origin, payload);
            }
            ClientEvent::ChangeChatroom(payload) => {
                self.handle_change_chatroom(origin, payload);
            }
        }

        Ok(())
    }
}
