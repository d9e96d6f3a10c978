//! Chat timeline
//!
//! A per-chat paginated message store, its merge rules, and the load-state
//! presenter the rendering layer reads.
//!
//! # Usage
//!
//! ```ignore
//! let store = MessageStore::new(gateway, chat_id, TimelineConfig::default());
//! let mut events = store.subscribe();
//!
//! store.load_initial().await;
//! if LoadPhase::derive(&store.snapshot()).can_load_older() {
//!     store.load_older().await;
//! }
//! ```

pub mod merge;
mod presenter;
mod store;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::models::{ChatId, Message, UserId, UserProfile};

pub use merge::Insertion;
pub use presenter::{LoadPhase, Treatment};
pub use store::MessageStore;

/// Shown when the first page of a chat cannot be loaded
pub const NOTICE_LOAD_FAILED: &str = "Failed to load chat";

/// Shown when an older page cannot be loaded
pub const NOTICE_LOAD_MORE_FAILED: &str = "Failed to load more messages";

/// Which command a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadScope {
    Initial,
    Older,
}

impl LoadScope {
    pub fn notice_text(self) -> &'static str {
        match self {
            LoadScope::Initial => NOTICE_LOAD_FAILED,
            LoadScope::Older => NOTICE_LOAD_MORE_FAILED,
        }
    }
}

/// Last load failure kept in the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub scope: LoadScope,
    pub kind: ErrorKind,
    pub reason: String,
}

/// User-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub scope: LoadScope,
    pub text: String,
}

/// Events published by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// Snapshot changed
    Updated,
    Notice(Notice),
    /// The gateway rejected the session; hand off to session handling
    SessionExpired,
    /// Viewing user resolved by the initial load
    CurrentUser(UserProfile),
}

/// Result of a load command. Errors never escape the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Response applied to state
    Applied,
    /// Preconditions not met; no request issued
    Ignored,
    /// Response arrived for a chat or generation no longer bound
    Stale,
    Failed(ErrorKind),
}

/// Result of delivering a live message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted { index: usize },
    Duplicate,
    BeyondHistory,
    /// Addressed to another chat, or the store is closed
    WrongChat,
}

impl From<Insertion> for AppendOutcome {
    fn from(insertion: Insertion) -> Self {
        match insertion {
            Insertion::Inserted { index } => AppendOutcome::Inserted { index },
            Insertion::Duplicate => AppendOutcome::Duplicate,
            Insertion::BeyondHistory => AppendOutcome::BeyondHistory,
        }
    }
}

/// Read-only view of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub chat_id: ChatId,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub loading_more: bool,
    pub has_more: bool,
    /// An initial load has been applied for the bound chat
    pub loaded: bool,
    pub current_user_id: Option<UserId>,
    pub error: Option<LoadError>,
}

impl ChatSnapshot {
    pub fn empty(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            messages: Vec::new(),
            loading: false,
            loading_more: false,
            has_more: true,
            loaded: false,
            current_user_id: None,
            error: None,
        }
    }
}
