use uuid::Uuid;

/// Room every session joins when it is admitted.
pub const DEFAULT_ROOM: &str = "general";

/// Default upper bound on display name length (can be overridden by config)
pub const DEFAULT_MAX_NAME_LENGTH: usize = 32;

/// Unique identifier for an admitted session
pub type SessionId = Uuid;

/// Rooms are implicit: a room exists as long as some session names it.
pub type RoomName = String;
