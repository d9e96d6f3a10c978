//! Remote chat gateway interface
//!
//! The gateway is the source of truth for chat history. The timeline only
//! describes how it calls the gateway and how failures are interpreted;
//! transports live elsewhere (`vibechat-net`, or the in-memory gateway).

mod memory;

use std::future::Future;

use crate::error::Result;
use crate::models::{ChatId, ChatPage, PageRequest, UserProfile};

pub use memory::MemoryGateway;

/// Operations the client core needs from the remote side
pub trait ChatGateway: Send + Sync {
    /// Profile of the signed-in user. Fails with `Authentication` when the
    /// session is invalid.
    fn fetch_current_user(&self) -> impl Future<Output = Result<UserProfile>> + Send;

    /// Up to `request.limit` messages of `chat_id`, oldest first, older than
    /// `request.before` when given. Fails with `Network` or `NotFound`.
    fn fetch_chat_page(
        &self,
        chat_id: &ChatId,
        request: PageRequest,
    ) -> impl Future<Output = Result<ChatPage>> + Send;
}
