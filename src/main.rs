#![cfg_attr(not(test), deny(clippy::panic))]

use chatroom_relay::auth::Authenticator;
use chatroom_relay::config;
use chatroom_relay::logging;
use chatroom_relay::server::{ChatServer, ServerConfig};
use chatroom_relay::websocket;
use clap::Parser;
use std::net::SocketAddr;

/// Chatroom relay -- in-memory WebSocket chat with one-time connection tokens
#[derive(Parser, Debug)]
#[command(name = "chatroom-relay")]
#[command(about = "An in-memory WebSocket chat relay with room-scoped broadcast")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Default room: {}", cfg.server.default_room);
                println!("  Ping interval: {}s", cfg.server.ping_interval_secs);
                println!(
                    "  Credential retention: {}s",
                    cfg.server.credential_retention_secs
                );
                println!("  Allowed users: {}", cfg.security.allowed_users.len());
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    // Held until exit so the file appender flushes.
    let _log_guard = logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let server = ChatServer::new(
        ServerConfig::from_config(&cfg),
        Authenticator::from_config(&cfg.security),
    );

    tracing::info!(%addr, "Starting chatroom relay");
    websocket::run_server(addr, server, &cfg.security.cors_origins).await
}
