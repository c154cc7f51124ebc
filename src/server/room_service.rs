use std::sync::Arc;

use crate::protocol::ChangeChatroomPayload;

use super::session::Session;
use super::ChatServer;

impl ChatServer {
    /// Move `origin` to the requested room. Rooms are implicit, so any name is
    /// accepted and nobody is notified.
    pub(crate) fn handle_change_chatroom(
        &self,
        origin: &Arc<Session>,
        payload: ChangeChatroomPayload,
    ) {
        let previous = origin.set_room(payload.name);
        tracing::info!(
            session_id = %origin.id(),
            name = %origin.name(),
            from_room = %previous,
            to_room = %origin.room(),
            "Session changed chatroom"
        );
    }
}
