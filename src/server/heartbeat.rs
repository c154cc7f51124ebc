use std::sync::{Arc, Weak};

use tokio::time::{Instant, MissedTickBehavior};

use super::session::{DisconnectReason, LivenessTick, Session};
use super::ChatServer;

impl ChatServer {
    /// Start the probe/evict cycle for `session`. At most one monitor runs per
    /// session; later calls are ignored.
    pub(crate) fn start_liveness_monitor(self: &Arc<Self>, session: &Arc<Session>) {
        if !session.claim_monitor() {
            tracing::debug!(session_id = %session.id(), "Liveness monitor already running");
            return;
        }

        tokio::spawn(run_liveness_monitor(
            Arc::downgrade(self),
            session.clone(),
            self.config.ping_interval,
        ));
    }
}

/// Each tick either evicts a session that never answered the previous probe or
/// sends a new one. Replies are recorded by the event loop as they arrive.
async fn run_liveness_monitor(
    server: Weak<ChatServer>,
    session: Arc<Session>,
    period: tokio::time::Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = session.closed() => return,
            _ = ticker.tick() => {}
        }

        match session.liveness_tick() {
            LivenessTick::Expired => {
                tracing::info!(
                    session_id = %session.id(),
                    name = %session.name(),
                    "Session not responding to probes, evicting"
                );
                if let Some(server) = server.upgrade() {
                    server.remove_with_reason(&session.id(), DisconnectReason::LivenessTimeout);
                }
                return;
            }
            LivenessTick::Probe => {
                // A failed probe is only logged; the missed reply evicts on the next tick.
                match session.send_probe() {
                    Ok(()) => tracing::trace!(session_id = %session.id(), "Probe sent"),
                    Err(err) => tracing::warn!(
                        session_id = %session.id(),
                        error = %err,
                        "Failed to queue liveness probe"
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Authenticator;
    use crate::server::{ChatServer, Inbound, Outbound, ServerConfig, SessionTransport};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout, Duration};

    const PING: Duration = Duration::from_millis(50);

    fn create_test_server() -> Arc<ChatServer> {
        ChatServer::new(
            ServerConfig {
                ping_interval: PING,
                ..ServerConfig::default()
            },
            Authenticator::new(["alice"], "secret"),
        )
    }

    #[tokio::test]
    async fn silent_session_is_probed_then_evicted() {
        let server = create_test_server();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (_in_tx, in_rx) = mpsc::channel(8);
        let token = server.credentials().issue();
        let session = server
            .admit(
                "alice",
                &token,
                SessionTransport {
                    outbound: out_tx,
                    inbound: in_rx,
                },
            )
            .expect("admission succeeds");

        let probe = timeout(PING * 3, out_rx.recv())
            .await
            .expect("probe within one interval")
            .expect("queue open");
        assert_eq!(probe, Outbound::Ping);

        timeout(PING * 4, session.closed())
            .await
            .expect("session evicted within two intervals of the last reply");
        assert_eq!(server.session_count(), 0);
        assert_eq!(
            session.disconnect_reason(),
            Some(crate::server::DisconnectReason::LivenessTimeout)
        );
    }

    #[tokio::test]
    async fn answering_probes_keeps_session_alive() {
        let server = create_test_server();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (in_tx, in_rx) = mpsc::channel(8);
        let token = server.credentials().issue();
        let session = server
            .admit(
                "alice",
                &token,
                SessionTransport {
                    outbound: out_tx,
                    inbound: in_rx,
                },
            )
            .expect("admission succeeds");

        // Reply to every probe for several intervals.
        let responder = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if frame == Outbound::Ping && in_tx.send(Inbound::Pong).await.is_err() {
                    break;
                }
            }
        });

        sleep(PING * 6).await;
        assert!(!session.is_closed());
        assert_eq!(server.session_count(), 1);

        server.remove(&session.id());
        responder.abort();
    }

    #[tokio::test]
    async fn monitor_stops_after_removal() {
        let server = create_test_server();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (_in_tx, in_rx) = mpsc::channel(8);
        let token = server.credentials().issue();
        let session = server
            .admit(
                "alice",
                &token,
                SessionTransport {
                    outbound: out_tx,
                    inbound: in_rx,
                },
            )
            .expect("admission succeeds");

        assert!(server.remove(&session.id()));
        sleep(PING * 3).await;
        assert!(
            out_rx.try_recv().is_err(),
            "no probes after the session is removed"
        );
    }

    #[tokio::test]
    async fn second_monitor_start_is_ignored() {
        let server = create_test_server();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (_in_tx, in_rx) = mpsc::channel(8);
        let token = server.credentials().issue();
        let session = server
            .admit(
                "alice",
                &token,
                SessionTransport {
                    outbound: out_tx,
                    inbound: in_rx,
                },
            )
            .expect("admission succeeds");

        server.start_liveness_monitor(&session);

        // With a single monitor exactly one probe is sent in the first interval.
        sleep(PING + PING / 2).await;
        assert_eq!(out_rx.try_recv(), Ok(Outbound::Ping));
        assert!(out_rx.try_recv().is_err());
        server.remove(&session.id());
    }
}
