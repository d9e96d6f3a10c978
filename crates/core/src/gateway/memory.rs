//! In-memory gateway
//!
//! Serves chats from a map. Used by tests and by the demo server.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{Error, ErrorKind, Result};
use crate::models::{ChatId, ChatPage, Message, PageRequest, UserProfile};

use super::ChatGateway;

#[derive(Default)]
struct MemoryState {
    user: Option<UserProfile>,
    chats: HashMap<ChatId, Vec<Message>>,
    page_failures: VecDeque<ErrorKind>,
    user_failures: VecDeque<ErrorKind>,
    page_calls: usize,
    user_calls: usize,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        self.state.lock().unwrap().user = Some(user);
        self
    }

    /// Replace a chat's history. Messages are kept sorted by time.
    pub fn insert_chat(&self, chat_id: ChatId, mut messages: Vec<Message>) {
        messages.sort_by(|a, b| a.time.cmp(&b.time));
        self.state.lock().unwrap().chats.insert(chat_id, messages);
    }

    /// Append a message to a chat, creating the chat if needed
    pub fn push_message(&self, chat_id: ChatId, message: Message) {
        let mut state = self.state.lock().unwrap();
        let history = state.chats.entry(chat_id).or_default();
        let pos = history.partition_point(|m| m.time <= message.time);
        history.insert(pos, message);
    }

    /// Make the next page fetch fail with `kind`
    pub fn fail_next_page(&self, kind: ErrorKind) {
        self.state.lock().unwrap().page_failures.push_back(kind);
    }

    /// Make the next user fetch fail with `kind`
    pub fn fail_next_user(&self, kind: ErrorKind) {
        self.state.lock().unwrap().user_failures.push_back(kind);
    }

    pub fn page_calls(&self) -> usize {
        self.state.lock().unwrap().page_calls
    }

    pub fn user_calls(&self) -> usize {
        self.state.lock().unwrap().user_calls
    }

    fn page(&self, chat_id: &ChatId, request: &PageRequest) -> Result<ChatPage> {
        let mut state = self.state.lock().unwrap();
        state.page_calls += 1;

        if let Some(kind) = state.page_failures.pop_front() {
            return Err(Error::from_kind(kind, "injected page failure"));
        }

        let history = state
            .chats
            .get(chat_id)
            .ok_or_else(|| Error::NotFound(format!("chat {}", chat_id)))?;

        let end = match &request.before {
            Some(cursor) => history
                .iter()
                .position(|m| &m.id == cursor)
                .ok_or_else(|| Error::Protocol(format!("unknown cursor {}", cursor)))?,
            None => history.len(),
        };
        let start = end.saturating_sub(request.limit as usize);

        Ok(ChatPage {
            messages: history[start..end].to_vec(),
            has_more: start > 0,
        })
    }

    fn user(&self) -> Result<UserProfile> {
        let mut state = self.state.lock().unwrap();
        state.user_calls += 1;

        if let Some(kind) = state.user_failures.pop_front() {
            return Err(Error::from_kind(kind, "injected user failure"));
        }

        state
            .user
            .clone()
            .ok_or_else(|| Error::Authentication("no active session".into()))
    }
}

impl ChatGateway for MemoryGateway {
    async fn fetch_current_user(&self) -> Result<UserProfile> {
        self.user()
    }

    async fn fetch_chat_page(&self, chat_id: &ChatId, request: PageRequest) -> Result<ChatPage> {
        self.page(chat_id, &request)
    }
}
