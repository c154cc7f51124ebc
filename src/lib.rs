#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Chatroom Relay
//!
//! A small in-memory WebSocket chat relay. Clients trade a username and the
//! shared secret for a one-time token, connect with it, and exchange messages
//! with everyone else in the same named room.
//!
//! Nothing is persisted: sessions, rooms and tokens live only in memory.

/// Login checks and one-time connection credentials
pub mod auth;

/// Server configuration and environment variables
pub mod config;

/// Structured logging configuration
pub mod logging;

/// Wire events exchanged with clients
pub mod protocol;

/// Session registry, event routing and liveness
pub mod server;

/// HTTP and WebSocket surface
pub mod websocket;
