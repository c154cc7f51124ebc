use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::protocol::{RoomName, ServerEvent, SessionId};

/// Frames queued for the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(Arc<ServerEvent>),
    /// Liveness probe
    Ping,
}

/// What the transport reader hands to the session's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// Liveness reply
    Pong,
    /// The peer went away (close frame, read error or EOF).
    Closed,
}

/// The two queues that connect a session to its socket.
#[derive(Debug)]
pub struct SessionTransport {
    pub outbound: mpsc::Sender<Outbound>,
    pub inbound: mpsc::Receiver<Inbound>,
}

/// Why a session was torn down. The transport writer picks its close frame from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    ClientClosed,
    TransportError,
    LivenessTimeout,
    Removed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue full")]
    QueueFull,
    #[error("session closed")]
    Closed,
}

impl<T> From<TrySendError<T>> for DeliveryError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::QueueFull,
            TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Result of one liveness tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessTick {
    /// A reply arrived since the last tick; a new probe is due.
    Probe,
    /// No reply since the last probe.
    Expired,
}

/// Server-side representative of one connected, authenticated client.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: String,
    room: RwLock<RoomName>,
    alive: AtomicBool,
    monitor_started: AtomicBool,
    closed: AtomicBool,
    disconnect_reason: OnceLock<DisconnectReason>,
    outbound: mpsc::Sender<Outbound>,
    shutdown: CancellationToken,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        name: String,
        room: RoomName,
        outbound: mpsc::Sender<Outbound>,
    ) -> Self {
        Self {
            id,
            name,
            room: RwLock::new(room),
            alive: AtomicBool::new(true),
            monitor_started: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            disconnect_reason: OnceLock::new(),
            outbound,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display identity, fixed at admission.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room(&self) -> RoomName {
        self.room
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn in_room(&self, room: &str) -> bool {
        *self.room.read().unwrap_or_else(PoisonError::into_inner) == room
    }

    /// Move to `room`, returning the previous one.
    pub(crate) fn set_room(&self, room: RoomName) -> RoomName {
        let mut guard = self.room.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, room)
    }

    /// Queue an event without waiting. A slow peer loses the event instead of
    /// stalling the caller.
    pub fn deliver(&self, event: Arc<ServerEvent>) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.outbound.try_send(Outbound::Event(event))?;
        Ok(())
    }

    /// Record a liveness reply.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Advance the liveness state machine by one tick: ALIVE moves to
    /// AWAITING_PONG, AWAITING_PONG means the peer is gone.
    pub(crate) fn liveness_tick(&self) -> LivenessTick {
        if self.alive.swap(false, Ordering::AcqRel) {
            LivenessTick::Probe
        } else {
            LivenessTick::Expired
        }
    }

    pub(crate) fn send_probe(&self) -> Result<(), DeliveryError> {
        self.outbound.try_send(Outbound::Ping)?;
        Ok(())
    }

    /// Claim the right to run the liveness monitor. Only the first call wins.
    pub(crate) fn claim_monitor(&self) -> bool {
        !self.monitor_started.swap(true, Ordering::AcqRel)
    }

    /// Tear the session down. Returns `false` if it was already closed.
    pub(crate) fn close(&self, reason: DisconnectReason) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.disconnect_reason.set(reason);
        self.shutdown.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.disconnect_reason.get().copied()
    }

    /// Resolves once the session has been closed.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }

    /// Token cancelled on teardown, for tasks that do not hold the session.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NewMessagePayload;
    use uuid::Uuid;

    fn session(capacity: usize) -> (Arc<Session>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        let session = Session::new(Uuid::new_v4(), "alice".into(), "general".into(), tx);
        (Arc::new(session), rx)
    }

    fn event() -> Arc<ServerEvent> {
        Arc::new(ServerEvent::NewMessage(NewMessagePayload {
            message: "hi".into(),
            from: "bob".into(),
            sent: chrono::Utc::now(),
        }))
    }

    #[test]
    fn liveness_cycles_between_probe_and_expiry() {
        let (session, _rx) = session(4);
        assert_eq!(session.liveness_tick(), LivenessTick::Probe);
        assert_eq!(session.liveness_tick(), LivenessTick::Expired);

        session.mark_alive();
        assert_eq!(session.liveness_tick(), LivenessTick::Probe);
    }

    #[test]
    fn close_is_single_flight() {
        let (session, _rx) = session(4);
        assert!(session.close(DisconnectReason::LivenessTimeout));
        assert!(!session.close(DisconnectReason::ClientClosed));
        assert_eq!(
            session.disconnect_reason(),
            Some(DisconnectReason::LivenessTimeout)
        );
        assert!(session.shutdown_token().is_cancelled());
    }

    #[test]
    fn monitor_can_only_be_claimed_once() {
        let (session, _rx) = session(4);
        assert!(session.claim_monitor());
        assert!(!session.claim_monitor());
    }

    #[test]
    fn full_queue_reports_instead_of_blocking() {
        let (session, _rx) = session(1);
        assert_eq!(session.deliver(event()), Ok(()));
        assert_eq!(session.deliver(event()), Err(DeliveryError::QueueFull));
    }

    #[test]
    fn closed_session_rejects_delivery() {
        let (session, rx) = session(4);
        drop(rx);
        assert_eq!(session.deliver(event()), Err(DeliveryError::Closed));

        let (session, _rx) = self::session(4);
        session.close(DisconnectReason::Removed);
        assert_eq!(session.deliver(event()), Err(DeliveryError::Closed));
    }

    #[test]
    fn set_room_returns_previous() {
        let (session, _rx) = session(4);
        assert_eq!(session.set_room("x".into()), "general");
        assert!(session.in_room("x"));
        assert_eq!(session.room(), "x");
    }
}
