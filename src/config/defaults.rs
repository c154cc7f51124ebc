//! Default value functions for configuration fields.
//!
//! This module contains all the default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system. Functions are organized by category for
//! easier maintenance.

use super::logging::LogFormat;
use crate::protocol::{DEFAULT_MAX_NAME_LENGTH, DEFAULT_ROOM};

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    8080
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

pub const fn default_ping_interval_secs() -> u64 {
    9
}

pub const fn default_credential_retention_secs() -> u64 {
    30
}

pub const fn default_credential_sweep_interval_ms() -> u64 {
    400
}

pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub const fn default_inbound_queue_capacity() -> usize {
    32
}

pub const fn default_max_name_length() -> usize {
    DEFAULT_MAX_NAME_LENGTH
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "chatroom.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Text
}

// =============================================================================
// Security Defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub fn default_allowed_users() -> Vec<String> {
    ["balu", "yaswanth", "person1", "person2"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn default_shared_secret() -> String {
    DEFAULT_SHARED_SECRET.to_string()
}

/// Development secret; production deployments are warned when it is left in place.
pub const DEFAULT_SHARED_SECRET: &str = "123";

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}
