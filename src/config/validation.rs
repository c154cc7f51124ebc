//! Configuration validation functions.

use super::defaults::DEFAULT_SHARED_SECRET;
use super::Config;

/// Reject configurations the relay cannot run with and warn about weak ones.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let server = &config.server;

    if server.ping_interval_secs == 0 {
        anyhow::bail!("server.ping_interval_secs must be greater than zero");
    }
    if server.credential_retention_secs == 0 {
        anyhow::bail!("server.credential_retention_secs must be greater than zero");
    }
    if server.credential_sweep_interval_ms == 0 {
        anyhow::bail!("server.credential_sweep_interval_ms must be greater than zero");
    }
    if server.credential_sweep_interval_ms >= server.credential_retention_secs.saturating_mul(1000)
    {
        anyhow::bail!(
            "server.credential_sweep_interval_ms ({}) must be shorter than the credential retention ({}s)",
            server.credential_sweep_interval_ms,
            server.credential_retention_secs
        );
    }
    if server.outbound_queue_capacity == 0 || server.inbound_queue_capacity == 0 {
        anyhow::bail!("server queue capacities must be greater than zero");
    }
    if server.max_name_length == 0 {
        anyhow::bail!("server.max_name_length must be greater than zero");
    }
    if server.default_room.trim().is_empty() {
        anyhow::bail!("server.default_room must not be empty");
    }

    let security = &config.security;
    if security.allowed_users.iter().all(|user| user.trim().is_empty()) {
        anyhow::bail!("security.allowed_users must list at least one user");
    }
    if security.shared_secret.is_empty() {
        anyhow::bail!("security.shared_secret must not be empty");
    }
    if security.max_message_size == 0 {
        anyhow::bail!("security.max_message_size must be greater than zero");
    }

    if security.shared_secret == DEFAULT_SHARED_SECRET && is_production_mode() {
        eprintln!(
            "\nSECURITY WARNING: Default Login Secret in Production!\n\
             ===================================================================\n\
             Every allowed user can log in with the built-in development secret.\n\
             \n\
             Set a real secret:\n\
             export CHATROOM__SECURITY__SHARED_SECRET=\"$(openssl rand -hex 16)\"\n\
             ===================================================================\n"
        );
    }

    Ok(())
}

/// Detect if we're running in production mode.
///
/// Checks for `CHATROOM__ENVIRONMENT` or generic `PRODUCTION` / `PROD` environment variables.
pub fn is_production_mode() -> bool {
    use std::env;

    if let Ok(mode) = env::var("CHATROOM__ENVIRONMENT") {
        return mode.to_lowercase() == "production" || mode.to_lowercase() == "prod";
    }

    env::var("PRODUCTION").is_ok() || env::var("PROD").is_ok()
}
