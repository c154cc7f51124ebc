//! Security and login configuration types.

use super::defaults::{
    default_allowed_users, default_cors_origins, default_max_message_size, default_shared_secret,
};
use serde::{Deserialize, Serialize};

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origins (comma-separated, or "*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Usernames accepted by `/login`
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,
    /// Password shared by every allowed user
    #[serde(default = "default_shared_secret")]
    pub shared_secret: String,
    /// Maximum WebSocket message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            allowed_users: default_allowed_users(),
            shared_secret: default_shared_secret(),
            max_message_size: default_max_message_size(),
        }
    }
}
