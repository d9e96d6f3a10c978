//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire.
//! Every request carries a `request_id`; the reply echoes it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vibechat_core::{ChatId, ChatPage, ErrorKind, MessageId, UserProfile};

/// Gateway protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Client asks for the signed-in user
    FetchCurrentUser { request_id: Uuid },

    /// Client asks for a page of a chat
    FetchChatPage {
        request_id: Uuid,
        chat_id: ChatId,
        limit: u32,
        #[serde(default)]
        before: Option<MessageId>,
    },

    /// Reply to `FetchCurrentUser`
    User {
        request_id: Uuid,
        profile: UserProfile,
    },

    /// Reply to `FetchChatPage`
    Page { request_id: Uuid, page: ChatPage },

    /// Any request failed
    Failure {
        request_id: Uuid,
        kind: ErrorKind,
        reason: String,
    },

    /// Liveness check
    Ping { request_id: Uuid },

    /// Reply to `Ping`
    Pong { request_id: Uuid },
}

impl WireMessage {
    pub fn request_id(&self) -> Uuid {
        match self {
            WireMessage::FetchCurrentUser { request_id }
            | WireMessage::FetchChatPage { request_id, .. }
            | WireMessage::User { request_id, .. }
            | WireMessage::Page { request_id, .. }
            | WireMessage::Failure { request_id, .. }
            | WireMessage::Ping { request_id }
            | WireMessage::Pong { request_id } => *request_id,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            WireMessage::FetchCurrentUser { .. } => "FetchCurrentUser",
            WireMessage::FetchChatPage { .. } => "FetchChatPage",
            WireMessage::User { .. } => "User",
            WireMessage::Page { .. } => "Page",
            WireMessage::Failure { .. } => "Failure",
            WireMessage::Ping { .. } => "Ping",
            WireMessage::Pong { .. } => "Pong",
        }
    }

    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibechat_core::{Message, UserId};

    #[test]
    fn test_page_reply_roundtrip() {
        let request_id = Uuid::new_v4();
        let msg = WireMessage::Page {
            request_id,
            page: ChatPage {
                messages: vec![Message::text(UserId::from("u1"), "Ada", "Hello")],
                has_more: true,
            },
        };

        let bytes = msg.to_bytes().unwrap();
        let decoded = WireMessage::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.request_id(), request_id);
        match decoded {
            WireMessage::Page { page, .. } => {
                assert!(page.has_more);
                assert_eq!(page.messages[0].content, "Hello");
            }
            other => panic!("Wrong message type: {}", other.name()),
        }
    }

    #[test]
    fn test_request_without_cursor() {
        let json = format!(
            r#"{{"type":"FetchChatPage","request_id":"{}","chat_id":"c1","limit":50}}"#,
            Uuid::nil()
        );
        match WireMessage::from_bytes(json.as_bytes()).unwrap() {
            WireMessage::FetchChatPage { before, limit, .. } => {
                assert!(before.is_none());
                assert_eq!(limit, 50);
            }
            other => panic!("Wrong message type: {}", other.name()),
        }
    }
}
