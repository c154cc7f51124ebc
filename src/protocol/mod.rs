// Protocol module: wire events and shared identifiers

pub mod events;
pub mod types;

pub use events::{
    ChangeChatroomPayload, ClientEvent, EventError, NewMessagePayload, RawEvent,
    SendMessagePayload, ServerEvent, CHANGE_CHATROOM, NEW_MESSAGE, SEND_MESSAGE,
};
pub use types::{RoomName, SessionId, DEFAULT_MAX_NAME_LENGTH, DEFAULT_ROOM};
