// WebSocket module - organized into focused submodules
//
// - handler: connection gateway (query checks + upgrade)
// - connection: per-socket reader/writer tasks bridging to the session queues
// - sending: frame encoding for outbound session traffic
// - login: credential issuance endpoint
// - routes: HTTP route setup (ws, login, health, stats)

mod connection;
mod handler;
mod login;
mod routes;
mod sending;

pub use handler::{websocket_handler, ConnectParams};
pub use login::{login_handler, LoginRequest, LoginResponse};
pub use routes::{create_router, run_server, serve, StatsResponse};
