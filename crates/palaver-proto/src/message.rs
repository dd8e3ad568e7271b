//! Chat messages and the tagged wire envelope.

use serde::{Deserialize, Serialize};

use crate::{UserId, WireError};

/// Exact payload sent as the keepalive reply.
///
/// The server matches this compact literal, so [`WireMessage::Pong`] must
/// always encode to it byte-for-byte.
pub const PONG_WIRE: &str = r#"{"type":"pong"}"#;

/// Delivery targeting for a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    /// Deliver to every connected client, regardless of `users`.
    pub all: bool,

    /// Explicit recipient list, honored only when `all` is false.
    #[serde(default)]
    pub users: Vec<UserId>,
}

impl Recipients {
    /// Targeting for a broadcast: `{all: true, users: []}`.
    pub fn broadcast() -> Self {
        Self { all: true, users: Vec::new() }
    }

    /// Targeting restricted to an explicit list of identities.
    pub fn users(users: Vec<UserId>) -> Self {
        Self { all: false, users }
    }

    /// True when delivery is restricted to the listed identities.
    ///
    /// An empty list with `all: false` counts as a broadcast; there is no
    /// way to address a message to nobody.
    pub fn is_targeted(&self) -> bool {
        !self.all && !self.users.is_empty()
    }
}

/// A user-visible chat message.
///
/// Only `from` is required on the wire. The server guarantees `id` and
/// `timestamp` on echoed messages but older payloads in the history ring
/// may predate either field, so everything else defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender identity.
    pub from: UserId,

    /// Delivery targeting; absent means broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Recipients>,

    /// Sender display name at the time of sending.
    #[serde(default)]
    pub name: String,

    /// Message body.
    #[serde(default)]
    pub data: String,

    /// Server-assigned sequence id; clients send 0.
    #[serde(default)]
    pub id: u64,

    /// Unix timestamp in seconds; the server stamps it when absent.
    #[serde(default)]
    pub timestamp: u64,
}

/// Wire envelope, tagged by the JSON `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    /// A chat message (fields flattened beside the tag).
    Text(ChatMessage),

    /// Server-to-client keepalive probe.
    Ping,

    /// Client-to-server keepalive reply.
    Pong,
}

impl WireMessage {
    /// Decode a wire payload.
    ///
    /// Unknown `type` values and non-JSON payloads are errors; the caller
    /// logs and drops them.
    pub fn decode(payload: &str) -> Result<Self, WireError> {
        serde_json::from_str(payload).map_err(WireError::Decode)
    }

    /// Encode to the compact JSON wire form.
    pub fn encode(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(byte: u8) -> UserId {
        UserId::from_random_bytes([byte; 16])
    }

    #[test]
    fn pong_encodes_to_exact_literal() {
        assert_eq!(WireMessage::Pong.encode().unwrap(), PONG_WIRE);
    }

    #[test]
    fn ping_decodes_from_bare_object() {
        let msg = WireMessage::decode(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, WireMessage::Ping);
    }

    #[test]
    fn text_round_trips_with_targeting() {
        let original = WireMessage::Text(ChatMessage {
            from: user(1),
            to: Some(Recipients::users(vec![user(2), user(3)])),
            name: "alice".into(),
            data: "psst".into(),
            id: 7,
            timestamp: 1_700_000_000,
        });
        let decoded = WireMessage::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn outgoing_broadcast_has_expected_shape() {
        let from = user(0xA1);
        let msg = WireMessage::Text(ChatMessage {
            from,
            to: Some(Recipients::broadcast()),
            name: "alice".into(),
            data: "hi".into(),
            id: 0,
            timestamp: 1_700_000_123,
        });
        let expected = format!(
            "{{\"type\":\"text\",\"from\":\"{from}\",\"to\":{{\"all\":true,\"users\":[]}},\
             \"name\":\"alice\",\"data\":\"hi\",\"id\":0,\"timestamp\":1700000123}}"
        );
        assert_eq!(msg.encode().unwrap(), expected);
    }

    #[test]
    fn missing_optional_fields_default() {
        let from = user(9);
        let payload = format!("{{\"type\":\"text\",\"from\":\"{from}\"}}");
        let WireMessage::Text(msg) = WireMessage::decode(&payload).unwrap() else {
            panic!("expected a text message");
        };
        assert_eq!(msg.from, from);
        assert_eq!(msg.to, None);
        assert_eq!(msg.name, "");
        assert_eq!(msg.data, "");
        assert_eq!(msg.id, 0);
        assert_eq!(msg.timestamp, 0);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(WireMessage::decode(r#"{"type":"presence"}"#).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(WireMessage::decode("not json at all").is_err());
        assert!(WireMessage::decode("").is_err());
        assert!(WireMessage::decode("[1,2,3]").is_err());
    }

    #[test]
    fn empty_user_list_is_not_targeted() {
        assert!(!Recipients { all: false, users: Vec::new() }.is_targeted());
        assert!(!Recipients::broadcast().is_targeted());
        assert!(Recipients::users(vec![user(4)]).is_targeted());
    }

    #[test]
    fn all_flag_overrides_user_list() {
        let to = Recipients { all: true, users: vec![user(5)] };
        assert!(!to.is_targeted());
    }
}
