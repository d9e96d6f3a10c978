//! Merge rules for loaded message sequences
//!
//! All functions keep a sequence non-decreasing by time with unique ids.

use std::collections::HashSet;

use crate::models::{Message, MessageId};

/// Result of inserting a live message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted { index: usize },
    /// Already loaded; nothing changed
    Duplicate,
    /// Older than the loaded window while older history remains unloaded;
    /// pagination will deliver it
    BeyondHistory,
}

/// Stable-sort by time and drop repeated ids (first occurrence wins)
pub fn normalize(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| a.time.cmp(&b.time));
    let mut seen = HashSet::with_capacity(messages.len());
    messages.retain(|m| seen.insert(m.id.clone()));
    messages
}

/// Build the sequence for a fresh first page, keeping live messages that
/// arrived while the page was in flight and are not older than it
pub fn merge_initial(page: Vec<Message>, live: Vec<Message>) -> Vec<Message> {
    let mut merged = normalize(page);
    let newest = merged.last().map(|m| m.time);
    let ids: HashSet<MessageId> = merged.iter().map(|m| m.id.clone()).collect();

    let carried: Vec<Message> = live
        .into_iter()
        .filter(|m| !ids.contains(&m.id) && newest.map_or(true, |t| m.time >= t))
        .collect();

    merged.extend(carried);
    normalize(merged)
}

/// Prepend an older page. Messages already loaded, or newer than the current
/// oldest message, are dropped. Returns how many messages were added.
pub fn prepend_older(existing: &mut Vec<Message>, page: Vec<Message>) -> usize {
    let oldest = existing.first().map(|m| m.time);
    let ids: HashSet<&MessageId> = existing.iter().map(|m| &m.id).collect();

    let older: Vec<Message> = normalize(page)
        .into_iter()
        .filter(|m| !ids.contains(&m.id) && oldest.map_or(true, |t| m.time <= t))
        .collect();

    let added = older.len();
    existing.splice(0..0, older);
    added
}

/// Insert a live message at its time position (after equal timestamps)
pub fn insert_live(existing: &mut Vec<Message>, message: Message, has_more: bool) -> Insertion {
    if existing.iter().any(|m| m.id == message.id) {
        return Insertion::Duplicate;
    }

    if has_more {
        if let Some(oldest) = existing.first() {
            if message.time < oldest.time {
                return Insertion::BeyondHistory;
            }
        }
    }

    let index = existing.partition_point(|m| m.time <= message.time);
    existing.insert(index, message);
    Insertion::Inserted { index }
}
