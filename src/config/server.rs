//! Chat server behavior configuration types.

use super::defaults::{
    default_credential_retention_secs, default_credential_sweep_interval_ms,
    default_inbound_queue_capacity, default_max_name_length, default_outbound_queue_capacity,
    default_ping_interval_secs, default_room,
};
use serde::{Deserialize, Serialize};

/// Server configuration for sessions, liveness and credentials.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Room every session joins on admission
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Interval between liveness probes (seconds). A session that misses one
    /// full interval without replying is evicted on the next tick.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// How long an issued one-time credential stays valid (seconds)
    #[serde(default = "default_credential_retention_secs")]
    pub credential_retention_secs: u64,
    /// Interval of the expired-credential sweep (milliseconds)
    #[serde(default = "default_credential_sweep_interval_ms")]
    pub credential_sweep_interval_ms: u64,
    /// Per-session queue of frames waiting to be written to the socket.
    /// Broadcasts to a session whose queue is full are dropped for that session.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Per-session queue of frames read from the socket and not yet routed
    #[serde(default = "default_inbound_queue_capacity")]
    pub inbound_queue_capacity: usize,
    /// Maximum display name length in characters
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_room: default_room(),
            ping_interval_secs: default_ping_interval_secs(),
            credential_retention_secs: default_credential_retention_secs(),
            credential_sweep_interval_ms: default_credential_sweep_interval_ms(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            inbound_queue_capacity: default_inbound_queue_capacity(),
            max_name_length: default_max_name_length(),
        }
    }
}
