use crate::auth::{Authenticator, CredentialStore};
use crate::protocol::{RoomName, SessionId, DEFAULT_MAX_NAME_LENGTH, DEFAULT_ROOM};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::Duration;

mod admission;
mod heartbeat;
mod maintenance;
mod message_router;
mod messaging;
mod room_service;
mod session;

pub use admission::AdmitError;
pub use message_router::RouteError;
pub use session::{
    DeliveryError, DisconnectReason, Inbound, LivenessTick, Outbound, Session, SessionTransport,
};

/// Connection registry and event router for the chat relay.
///
/// Owns the membership set and the one-time credential store. Sessions only
/// ever reach back here through a `Weak` handle.
pub struct ChatServer {
    /// Live sessions keyed by their connection id
    sessions: DashMap<SessionId, Arc<Session>>,
    /// One-time credentials issued by `/login`
    credentials: Arc<CredentialStore>,
    /// Login check guarding credential issuance
    authenticator: Authenticator,
    /// Server configuration
    config: ServerConfig,
}

/// Runtime settings for [`ChatServer`].
///
/// `ping_interval` and `credential_sweep_interval` must be non-zero; a zero
/// value is replaced by its default when the server is built.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub default_room: RoomName,
    pub ping_interval: Duration,
    pub credential_retention: Duration,
    pub credential_sweep_interval: Duration,
    pub outbound_queue_capacity: usize,
    pub inbound_queue_capacity: usize,
    pub max_name_length: usize,
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_room: DEFAULT_ROOM.to_string(),
            ping_interval: Duration::from_secs(9),
            credential_retention: Duration::from_secs(30),
            credential_sweep_interval: Duration::from_millis(400),
            outbound_queue_capacity: 64,
            inbound_queue_capacity: 32,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_message_size: 65536,
        }
    }
}

impl ServerConfig {
    /// Runtime settings derived from the loaded configuration document.
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            default_room: cfg.server.default_room.clone(),
            ping_interval: Duration::from_secs(cfg.server.ping_interval_secs),
            credential_retention: Duration::from_secs(cfg.server.credential_retention_secs),
            credential_sweep_interval: Duration::from_millis(
                cfg.server.credential_sweep_interval_ms,
            ),
            outbound_queue_capacity: cfg.server.outbound_queue_capacity,
            inbound_queue_capacity: cfg.server.inbound_queue_capacity,
            max_name_length: cfg.server.max_name_length,
            max_message_size: cfg.security.max_message_size,
        }
    }

    /// Replace zero timer periods with their defaults. Tokio interval timers
    /// panic on a zero period.
    fn with_nonzero_intervals(mut self) -> Self {
        let defaults = Self::default();
        if self.ping_interval.is_zero() {
            tracing::warn!(
                default_ms = defaults.ping_interval.as_millis() as u64,
                "Zero ping interval configured, using default"
            );
            self.ping_interval = defaults.ping_interval;
        }
        if self.credential_sweep_interval.is_zero() {
            tracing::warn!(
                default_ms = defaults.credential_sweep_interval.as_millis() as u64,
                "Zero credential sweep interval configured, using default"
            );
            self.credential_sweep_interval = defaults.credential_sweep_interval;
        }
        self
    }
}

impl ChatServer {
    pub fn new(config: ServerConfig, authenticator: Authenticator) -> Arc<Self> {
        let config = config.with_nonzero_intervals();
        let credentials = Arc::new(CredentialStore::new(config.credential_retention));
        tracing::info!(
            default_room = %config.default_room,
            ping_interval_ms = config.ping_interval.as_millis() as u64,
            credential_retention_ms = config.credential_retention.as_millis() as u64,
            "Chat server initialized"
        );
        Arc::new(Self {
            sessions: DashMap::new(),
            credentials,
            authenticator,
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Snapshot of the sessions currently in `room`.
    pub fn sessions_in_room(&self, room: &str) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().in_room(room))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Credentials issued and not yet consumed or swept.
    pub fn pending_credentials(&self) -> usize {
        self.credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_timer_periods_fall_back_to_defaults() {
        let server = ChatServer::new(
            ServerConfig {
                ping_interval: Duration::ZERO,
                credential_sweep_interval: Duration::ZERO,
                ..ServerConfig::default()
            },
            Authenticator::new(["alice"], "secret"),
        );
        assert_eq!(server.config().ping_interval, Duration::from_secs(9));
        assert_eq!(
            server.config().credential_sweep_interval,
            Duration::from_millis(400)
        );

        // Both timers start without panicking.
        let sweeper = server.start_credential_sweeper();
        let (out_tx, _out_rx) = tokio::sync::mpsc::channel(4);
        let (_in_tx, in_rx) = tokio::sync::mpsc::channel(4);
        let token = server.login("alice", "secret").unwrap();
        let session = server
            .admit(
                "alice",
                &token,
                SessionTransport {
                    outbound: out_tx,
                    inbound: in_rx,
                },
            )
            .unwrap();
        tokio::task::yield_now().await;

        assert!(!session.is_closed());
        assert!(!sweeper.is_finished());
        sweeper.abort();
    }
}
