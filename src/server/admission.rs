use std::sync::{Arc, Weak};

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::protocol::{RawEvent, SessionId};

use super::session::{DisconnectReason, Inbound, Session, SessionTransport};
use super::ChatServer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmitError {
    #[error("Missing name")]
    MissingName,
    #[error("Name too long ({length}/{limit})")]
    NameTooLong { length: usize, limit: usize },
    #[error("Invalid OTP")]
    InvalidCredential,
}

impl ChatServer {
    /// Check a username/password pair and hand out a one-time credential.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        match self.authenticator.authenticate(username, password) {
            Ok(()) => {
                let token = self.credentials.issue();
                tracing::info!(%username, "Login succeeded, credential issued");
                Ok(token)
            }
            Err(err) => {
                tracing::warn!(%username, error = %err, "Login rejected");
                Err(err)
            }
        }
    }

    /// Non-consuming probe used by the gateway before accepting an upgrade.
    pub fn check_credential(&self, token: &str) -> bool {
        self.credentials.check(token)
    }

    /// Admit a verified connection as a new session in the default room.
    ///
    /// Consumes `token`. On success the session is registered and its event
    /// loop and liveness monitor are running. The name is validated before the
    /// token is touched, so a rejected name does not burn a credential.
    pub fn admit(
        self: &Arc<Self>,
        name: &str,
        token: &str,
        transport: SessionTransport,
    ) -> Result<Arc<Session>, AdmitError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdmitError::MissingName);
        }
        let length = name.chars().count();
        if length > self.config.max_name_length {
            return Err(AdmitError::NameTooLong {
                length,
                limit: self.config.max_name_length,
            });
        }

        if !self.credentials.verify(token) {
            tracing::warn!(%name, "Admission rejected: invalid or expired credential");
            return Err(AdmitError::InvalidCredential);
        }

        let SessionTransport { outbound, inbound } = transport;
        let session = Arc::new(Session::new(
            Uuid::new_v4(),
            name.to_string(),
            self.config.default_room.clone(),
            outbound,
        ));
        self.sessions.insert(session.id(), session.clone());

        tracing::info!(
            session_id = %session.id(),
            %name,
            room = %self.config.default_room,
            total = self.sessions.len(),
            "Session admitted"
        );

        spawn_event_loop(Arc::downgrade(self), session.clone(), inbound);
        self.start_liveness_monitor(&session);

        Ok(session)
    }

    /// Remove a session. Safe to call from every teardown path; only the first
    /// call for a given session does anything.
    pub fn remove(&self, session_id: &SessionId) -> bool {
        self.remove_with_reason(session_id, DisconnectReason::Removed)
    }

    pub(crate) fn remove_with_reason(
        &self,
        session_id: &SessionId,
        reason: DisconnectReason,
    ) -> bool {
        let Some((_, session)) = self.sessions.remove(session_id) else {
            return false;
        };

        session.close(reason);
        tracing::info!(
            %session_id,
            name = %session.name(),
            ?reason,
            total = self.sessions.len(),
            "Session removed"
        );
        true
    }
}

/// Feed inbound frames into the router until the peer goes away or the
/// session is closed from elsewhere.
fn spawn_event_loop(
    server: Weak<ChatServer>,
    session: Arc<Session>,
    mut inbound: mpsc::Receiver<Inbound>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            let frame = tokio::select! {
                () = session.closed() => return,
                frame = inbound.recv() => frame,
            };

            match frame {
                Some(Inbound::Text(text)) => {
                    let Some(server) = server.upgrade() else {
                        return;
                    };
                    match RawEvent::parse(&text) {
                        Ok(event) => server.route(event, &session),
                        Err(err) => {
                            tracing::warn!(
                                session_id = %session.id(),
                                name = %session.name(),
                                error = %err,
                                "Dropping unparseable event"
                            );
                        }
                    }
                }
                Some(Inbound::Pong) => {
                    tracing::trace!(session_id = %session.id(), "Liveness reply received");
                    session.mark_alive();
                }
                Some(Inbound::Closed) => break DisconnectReason::ClientClosed,
                None => break DisconnectReason::TransportError,
            }
        };

        if let Some(server) = server.upgrade() {
            server.remove_with_reason(&session.id(), reason);
        }
    })
}
