//! Configuration module for the chatroom relay.
//!
//! This module provides configuration management with support for:
//! - JSON configuration files
//! - Environment variable overrides
//! - Sensible defaults
//!
//! # Module Structure
//!
//! - [`crate::config::types`]: Root `Config` struct
//! - [`server`]: Session, liveness and credential timing
//! - [`security`]: Login allow-list, shared secret, CORS and frame limits
//! - [`logging`]: Logging configuration
//! - [`crate::config::loader`]: Configuration loading functions
//! - [`crate::config::validation`]: Configuration validation functions
//! - [`crate::config::defaults`]: Default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::load;

pub use logging::{LogFormat, LogLevel, LoggingConfig};

pub use security::SecurityConfig;

pub use server::ServerConfig;

pub use types::Config;

pub use validation::{is_production_mode, validate_config};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.port, 8080);
        assert_eq!(config.server.default_room, "general");
        assert_eq!(config.server.ping_interval_secs, 9);
        assert_eq!(config.server.credential_retention_secs, 30);
        assert_eq!(config.server.credential_sweep_interval_ms, 400);
        assert_eq!(config.server.max_name_length, 32);

        assert_eq!(
            config.security.allowed_users,
            vec!["balu", "yaswanth", "person1", "person2"]
        );
        assert_eq!(config.security.shared_secret, "123");
        assert_eq!(config.security.cors_origins, "*");
        assert_eq!(config.security.max_message_size, 65536);

        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.rotation, "daily");
        assert!(!config.logging.enable_file_logging);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.port, deserialized.port);
        assert_eq!(
            config.server.ping_interval_secs,
            deserialized.server.ping_interval_secs
        );
        assert_eq!(
            config.security.allowed_users,
            deserialized.security.allowed_users
        );
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"server": {"ping_interval_secs": 3}, "logging": {"level": "WARNING"}}"#)
                .unwrap();
        assert_eq!(config.server.ping_interval_secs, 3);
        assert_eq!(config.server.default_room, "general");
        assert_eq!(config.logging.level, Some(LogLevel::Warn));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_log_level_falls_back() {
        let config: Config = serde_json::from_str(r#"{"logging": {"level": "loud"}}"#).unwrap();
        assert_eq!(config.logging.level, None);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_timing() {
        let mut config = Config::default();
        config.server.ping_interval_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.server.credential_retention_secs = 1;
        config.server.credential_sweep_interval_ms = 1000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_login_setup() {
        let mut config = Config::default();
        config.security.allowed_users.clear();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.security.shared_secret.clear();
        assert!(validate_config(&config).is_err());
    }
}
