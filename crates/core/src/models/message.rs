//! Chat message and page models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MessageId, UserId};

/// What a message's `content` holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    /// `content` is a media reference
    Image,
    /// `content` is a media reference
    Voice,
}

/// A single chat item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_title: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub time: DateTime<Utc>,
}

impl Message {
    pub fn text(sender_id: UserId, sender_title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id,
            sender_title: sender_title.into(),
            kind: MessageKind::Text,
            content: content.into(),
            time: Utc::now(),
        }
    }

    pub fn format_timestamp(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    pub fn format_date(&self) -> String {
        self.time.format("%Y-%m-%d").to_string()
    }
}

/// One page returned by the gateway, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    pub messages: Vec<Message>,
    /// Whether older messages exist beyond this page
    pub has_more: bool,
}

/// Backward pagination request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    /// Only messages older than this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<MessageId>,
}

impl PageRequest {
    pub fn latest(limit: u32) -> Self {
        Self { limit, before: None }
    }

    pub fn before(limit: u32, cursor: MessageId) -> Self {
        Self {
            limit,
            before: Some(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let json = r#"{
            "id": "m1",
            "senderId": "u1",
            "senderTitle": "Ada",
            "type": "voice",
            "content": "https://cdn/voice/1.m4a",
            "time": "2024-03-01T10:00:00Z"
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_str(), "m1");
        assert_eq!(msg.kind, MessageKind::Voice);
        assert_eq!(msg.format_date(), "2024-03-01");
        assert_eq!(msg.format_timestamp(), "10:00");

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "voice");
        assert_eq!(value["senderTitle"], "Ada");
    }

    #[test]
    fn test_page_request_omits_missing_cursor() {
        let value = serde_json::to_value(PageRequest::latest(50)).unwrap();
        assert!(value.get("before").is_none());
    }
}
