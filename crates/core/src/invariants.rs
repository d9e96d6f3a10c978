//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible timeline states during
//! development. These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{ChatId, Message};

/// Messages are non-decreasing by time
pub fn is_chronological(messages: &[Message]) -> bool {
    messages.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

/// No message id appears twice
pub fn has_unique_ids(messages: &[Message]) -> bool {
    let mut seen = HashSet::with_capacity(messages.len());
    messages.iter().all(|m| seen.insert(&m.id))
}

/// Validate a loaded message sequence for one chat
pub fn assert_sequence_invariants(chat_id: &ChatId, messages: &[Message]) {
    debug_assert!(
        is_chronological(messages),
        "Chat {} has messages out of time order",
        chat_id
    );

    debug_assert!(
        has_unique_ids(messages),
        "Chat {} has duplicate message ids",
        chat_id
    );
}

/// Validate loading flags: the initial load and pagination never overlap
pub fn assert_flag_invariants(chat_id: &ChatId, loading: bool, loading_more: bool) {
    debug_assert!(
        !(loading && loading_more),
        "Chat {} is loading and paginating at the same time",
        chat_id
    );
}
