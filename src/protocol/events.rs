use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire tag for [`ClientEvent::SendMessage`].
pub const SEND_MESSAGE: &str = "send-message";
/// Wire tag for [`ClientEvent::ChangeChatroom`].
pub const CHANGE_CHATROOM: &str = "change-chatroom";
/// Wire tag for [`ServerEvent::NewMessage`].
pub const NEW_MESSAGE: &str = "new-message";

/// Envelope of every inbound text frame: `{ "type": ..., "payload": ... }`.
///
/// The payload is kept untyped until the router has matched the tag, so an
/// unknown tag and a bad payload are reported as different failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RawEvent {
    pub fn parse(text: &str) -> Result<Self, EventError> {
        serde_json::from_str(text).map_err(EventError::Malformed)
    }
}

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Broadcast a chat message to the sender's current room
    SendMessage(SendMessagePayload),
    /// Move the sender to another room
    ChangeChatroom(ChangeChatroomPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub message: String,
    /// Sender name as claimed by the client. The relay stamps the session
    /// identity on outgoing messages instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeChatroomPayload {
    pub name: String,
}

impl TryFrom<RawEvent> for ClientEvent {
    type Error = EventError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let kind = raw.kind.as_str();
        match kind {
            SEND_MESSAGE => serde_json::from_value(raw.payload)
                .map(ClientEvent::SendMessage)
                .map_err(|source| EventError::InvalidPayload {
                    kind: SEND_MESSAGE,
                    source,
                }),
            CHANGE_CHATROOM => serde_json::from_value(raw.payload)
                .map(ClientEvent::ChangeChatroom)
                .map_err(|source| EventError::InvalidPayload {
                    kind: CHANGE_CHATROOM,
                    source,
                }),
            _ => Err(EventError::UnknownType(raw.kind)),
        }
    }
}

impl ClientEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => SEND_MESSAGE,
            Self::ChangeChatroom(_) => CHANGE_CHATROOM,
        }
    }
}

/// Events the relay emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage(NewMessagePayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessagePayload {
    pub message: String,
    pub from: String,
    #[serde(with = "iso8601_millis")]
    pub sent: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("no handler for event type `{0}`")]
    UnknownType(String),
    #[error("invalid payload for `{kind}`: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// `2026-01-02T03:04:05.678Z`, the shape browsers produce with `toISOString`.
mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
