//! Chat view model
//!
//! Turns a timeline snapshot into display rows.

use chrono::{DateTime, Duration, Utc};
use vibechat_core::{ChatSnapshot, LoadPhase, MessageKind, Treatment, UserId};

/// Messages are grouped when same sender AND within 5 minutes
const GROUP_THRESHOLD_MINUTES: i64 = 5;

/// One rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub sender_name: String,
    pub body: String,
    pub timestamp: String,
    pub is_group_start: bool,
    pub is_own: bool,
}

pub fn build_rows(snapshot: &ChatSnapshot) -> Vec<MessageRow> {
    let group_threshold = Duration::minutes(GROUP_THRESHOLD_MINUTES);
    let mut rows = Vec::with_capacity(snapshot.messages.len());
    let mut prev: Option<(&UserId, DateTime<Utc>)> = None;

    for m in &snapshot.messages {
        let is_group_start = match prev {
            Some((sender, ts)) => {
                sender != &m.sender_id || m.time.signed_duration_since(ts) > group_threshold
            }
            None => true,
        };

        let is_own = snapshot
            .current_user_id
            .as_ref()
            .map(|uid| uid == &m.sender_id)
            .unwrap_or(false);

        let body = match m.kind {
            MessageKind::Text => m.content.clone(),
            MessageKind::Image => format!("[image] {}", m.content),
            MessageKind::Voice => format!("[voice] {}", m.content),
        };

        rows.push(MessageRow {
            id: m.id.to_string(),
            sender_name: m.sender_title.clone(),
            body,
            timestamp: m.format_timestamp(),
            is_group_start,
            is_own,
        });

        prev = Some((&m.sender_id, m.time));
    }

    rows
}

/// Status line for the current phase, if any
pub fn status_line(phase: LoadPhase) -> Option<String> {
    let text = match phase {
        LoadPhase::Idle | LoadPhase::Ready { has_more: true } => return None,
        LoadPhase::InitialLoading => "Loading chat...".to_string(),
        LoadPhase::FetchingOlder => "Loading older messages...".to_string(),
        LoadPhase::Ready { has_more: false } => "Beginning of conversation".to_string(),
        LoadPhase::Unavailable => "This chat is no longer available".to_string(),
        LoadPhase::Failed { scope, .. } => {
            let prefix = match phase.treatment() {
                Some(Treatment::FullScreen) => "!!",
                _ => "!",
            };
            format!("{} {}", prefix, scope.notice_text())
        }
    };
    Some(text)
}

/// Plain-text lines for a terminal
pub fn render_lines(rows: &[MessageRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let marker = if row.is_own { ">" } else { " " };
            if row.is_group_start {
                format!("{} [{}] {}: {}", marker, row.timestamp, row.sender_name, row.body)
            } else {
                format!("{}         {}", marker, row.body)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vibechat_core::{ChatId, ErrorKind, LoadScope, Message, MessageId};

    fn msg(id: &str, sender: &str, minutes: i64, kind: MessageKind) -> Message {
        Message {
            id: MessageId::from(id),
            sender_id: UserId::from(sender),
            sender_title: sender.to_uppercase(),
            kind,
            content: id.to_string(),
            time: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_grouping_and_ownership() {
        let mut snapshot = ChatSnapshot::empty(ChatId::from("c1"));
        snapshot.current_user_id = Some(UserId::from("ada"));
        snapshot.messages = vec![
            msg("a", "ada", 0, MessageKind::Text),
            msg("b", "ada", 2, MessageKind::Image),
            msg("c", "ada", 20, MessageKind::Text),
            msg("d", "bob", 21, MessageKind::Voice),
        ];

        let rows = build_rows(&snapshot);
        let starts: Vec<bool> = rows.iter().map(|r| r.is_group_start).collect();
        assert_eq!(starts, vec![true, false, true, true]);
        assert!(rows[0].is_own);
        assert!(!rows[3].is_own);
        assert_eq!(rows[1].body, "[image] b");
        assert_eq!(rows[3].body, "[voice] d");
        assert_eq!(rows[0].timestamp, "10:00");
    }

    #[test]
    fn test_render_lines() {
        let mut snapshot = ChatSnapshot::empty(ChatId::from("c1"));
        snapshot.messages = vec![
            msg("a", "bob", 0, MessageKind::Text),
            msg("b", "bob", 1, MessageKind::Text),
        ];

        let lines = render_lines(&build_rows(&snapshot));
        assert_eq!(lines[0], "  [10:00] BOB: a");
        assert_eq!(lines[1], "          b");
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(LoadPhase::Ready { has_more: true }), None);
        assert_eq!(
            status_line(LoadPhase::Failed {
                scope: LoadScope::Older,
                kind: ErrorKind::Network
            }),
            Some("! Failed to load more messages".to_string())
        );
        assert_eq!(
            status_line(LoadPhase::Failed {
                scope: LoadScope::Initial,
                kind: ErrorKind::Network
            }),
            Some("!! Failed to load chat".to_string())
        );
    }
}
