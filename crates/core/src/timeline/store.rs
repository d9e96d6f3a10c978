//! Paginated message store
//!
//! One instance per open chat. State sits behind a std mutex that is never
//! held across an await; every fetch carries a ticket taken at issue time
//! and its response is dropped if the ticket no longer matches.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::TimelineConfig;
use crate::error::{Error, ErrorKind};
use crate::gateway::ChatGateway;
use crate::invariants::{assert_flag_invariants, assert_sequence_invariants};
use crate::models::{ChatId, Message, PageRequest, UserId};

use super::merge;
use super::presenter::LoadPhase;
use super::{
    AppendOutcome, ChatSnapshot, LoadError, LoadOutcome, LoadScope, Notice, TimelineEvent,
};

const EVENT_CAPACITY: usize = 64;

/// Identifies the binding a request was issued for
#[derive(Debug, Clone)]
struct Ticket {
    chat_id: ChatId,
    generation: u64,
}

struct TimelineState {
    chat_id: ChatId,
    /// Bumped on bind, close, and each initial load
    generation: u64,
    closed: bool,
    messages: Vec<Message>,
    has_more: bool,
    loading: bool,
    loading_more: bool,
    loaded: bool,
    current_user_id: Option<UserId>,
    error: Option<LoadError>,
    /// Consecutive older pages that added nothing but claimed `has_more`
    empty_pages: u32,
}

impl TimelineState {
    fn new(chat_id: ChatId, generation: u64) -> Self {
        Self {
            chat_id,
            generation,
            closed: false,
            messages: Vec::new(),
            has_more: true,
            loading: false,
            loading_more: false,
            loaded: false,
            current_user_id: None,
            error: None,
            empty_pages: 0,
        }
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            chat_id: self.chat_id.clone(),
            generation: self.generation,
        }
    }

    fn accepts(&self, ticket: &Ticket) -> bool {
        !self.closed && self.generation == ticket.generation && self.chat_id == ticket.chat_id
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            chat_id: self.chat_id.clone(),
            messages: self.messages.clone(),
            loading: self.loading,
            loading_more: self.loading_more,
            has_more: self.has_more,
            loaded: self.loaded,
            current_user_id: self.current_user_id.clone(),
            error: self.error.clone(),
        }
    }

    fn check_invariants(&self) {
        assert_sequence_invariants(&self.chat_id, &self.messages);
        assert_flag_invariants(&self.chat_id, self.loading, self.loading_more);
    }
}

/// Message store for one open chat
pub struct MessageStore<G> {
    gateway: Arc<G>,
    config: TimelineConfig,
    state: Mutex<TimelineState>,
    events: broadcast::Sender<TimelineEvent>,
}

impl<G: ChatGateway> MessageStore<G> {
    pub fn new(gateway: Arc<G>, chat_id: ChatId, config: TimelineConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            config,
            state: Mutex::new(TimelineState::new(chat_id, 0)),
            events,
        }
    }

    /// Subscribe to updates, notices, and session events
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.lock().unwrap().snapshot()
    }

    pub fn phase(&self) -> LoadPhase {
        LoadPhase::derive(&self.snapshot())
    }

    pub fn chat_id(&self) -> ChatId {
        self.state.lock().unwrap().chat_id.clone()
    }

    /// Rebind to another chat. In-flight responses for the previous chat
    /// are discarded when they arrive.
    pub fn bind(&self, chat_id: ChatId) {
        {
            let mut state = self.state.lock().unwrap();
            let generation = state.generation + 1;
            info!(from = %state.chat_id, to = %chat_id, "Switching chat");
            *state = TimelineState::new(chat_id, generation);
        }
        self.emit(TimelineEvent::Updated);
    }

    /// Tear down. Nothing mutates state afterwards.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.generation += 1;
        state.loading = false;
        state.loading_more = false;
        state.messages.clear();
        debug!(chat_id = %state.chat_id, "Closed chat store");
    }

    /// Fetch the current user and the most recent page of the bound chat
    pub async fn load_initial(&self) -> LoadOutcome {
        let (ticket, request) = {
            let mut state = self.state.lock().unwrap();
            if state.closed || state.loading {
                debug!(chat_id = %state.chat_id, "Initial load already in flight");
                return LoadOutcome::Ignored;
            }
            state.generation += 1;
            state.loading = true;
            state.loading_more = false;
            state.error = None;
            (state.ticket(), PageRequest::latest(self.config.initial_page_size))
        };
        self.emit(TimelineEvent::Updated);

        let (user, page) = tokio::join!(
            self.gateway.fetch_current_user(),
            self.gateway.fetch_chat_page(&ticket.chat_id, request),
        );

        let mut state = self.state.lock().unwrap();
        if !state.accepts(&ticket) {
            debug!(chat_id = %ticket.chat_id, "Discarding stale initial page");
            return LoadOutcome::Stale;
        }
        state.loading = false;

        let (user, page) = match (user, page) {
            (Ok(user), Ok(page)) => (user, page),
            (Err(e), _) | (_, Err(e)) => {
                state.messages.clear();
                state.loaded = false;
                state.has_more = true;
                state.current_user_id = None;
                state.empty_pages = 0;
                let kind = self.record_failure(&mut state, LoadScope::Initial, e);
                drop(state);
                self.notify_failure(LoadScope::Initial, kind);
                return LoadOutcome::Failed(kind);
            }
        };

        let live = std::mem::take(&mut state.messages);
        state.messages = merge::merge_initial(page.messages, live);
        state.has_more = page.has_more;
        state.current_user_id = Some(user.id.clone());
        state.loaded = true;
        state.empty_pages = 0;
        state.check_invariants();

        info!(
            chat_id = %state.chat_id,
            count = state.messages.len(),
            has_more = state.has_more,
            "Loaded chat"
        );
        drop(state);

        self.emit(TimelineEvent::CurrentUser(user));
        self.emit(TimelineEvent::Updated);
        LoadOutcome::Applied
    }

    /// Fetch the page before the oldest loaded message and prepend it
    pub async fn load_older(&self) -> LoadOutcome {
        let (ticket, request) = {
            let mut state = self.state.lock().unwrap();
            if state.closed
                || !state.loaded
                || state.loading
                || state.loading_more
                || !state.has_more
            {
                return LoadOutcome::Ignored;
            }
            let Some(oldest) = state.messages.first() else {
                return LoadOutcome::Ignored;
            };
            let request = PageRequest::before(self.config.older_page_size, oldest.id.clone());
            state.loading_more = true;
            (state.ticket(), request)
        };
        self.emit(TimelineEvent::Updated);

        let result = self
            .gateway
            .fetch_chat_page(&ticket.chat_id, request)
            .await;

        let mut state = self.state.lock().unwrap();
        if !state.accepts(&ticket) {
            debug!(chat_id = %ticket.chat_id, "Discarding stale older page");
            return LoadOutcome::Stale;
        }
        state.loading_more = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                let kind = self.record_failure(&mut state, LoadScope::Older, e);
                drop(state);
                self.notify_failure(LoadScope::Older, kind);
                return LoadOutcome::Failed(kind);
            }
        };

        let added = merge::prepend_older(&mut state.messages, page.messages);
        if added == 0 && page.has_more {
            state.empty_pages += 1;
            if state.empty_pages >= self.config.max_empty_pages {
                warn!(
                    chat_id = %state.chat_id,
                    empty_pages = state.empty_pages,
                    "Gateway keeps returning empty pages, stopping pagination"
                );
                state.has_more = false;
            }
        } else {
            state.empty_pages = 0;
            state.has_more = page.has_more;
        }
        state.error = None;
        state.check_invariants();

        debug!(
            chat_id = %state.chat_id,
            added,
            total = state.messages.len(),
            has_more = state.has_more,
            "Loaded older messages"
        );
        drop(state);

        self.emit(TimelineEvent::Updated);
        LoadOutcome::Applied
    }

    /// Deliver a message received outside pagination (push or poll)
    pub fn append_incoming(&self, chat_id: &ChatId, message: Message) -> AppendOutcome {
        let mut state = self.state.lock().unwrap();
        if state.closed || &state.chat_id != chat_id {
            debug!(chat_id = %chat_id, "Dropping message for unbound chat");
            return AppendOutcome::WrongChat;
        }

        let has_more = state.has_more;
        let outcome: AppendOutcome = merge::insert_live(&mut state.messages, message, has_more).into();
        state.check_invariants();
        drop(state);

        if matches!(outcome, AppendOutcome::Inserted { .. }) {
            self.emit(TimelineEvent::Updated);
        }
        outcome
    }

    fn record_failure(&self, state: &mut TimelineState, scope: LoadScope, error: Error) -> ErrorKind {
        let kind = error.kind();
        warn!(chat_id = %state.chat_id, ?scope, error = %error, "Chat load failed");
        state.error = Some(LoadError {
            scope,
            kind,
            reason: error.to_string(),
        });
        kind
    }

    fn notify_failure(&self, scope: LoadScope, kind: ErrorKind) {
        self.emit(TimelineEvent::Notice(Notice {
            scope,
            text: scope.notice_text().to_string(),
        }));
        if kind == ErrorKind::Auth {
            self.emit(TimelineEvent::SessionExpired);
        }
        self.emit(TimelineEvent::Updated);
    }

    fn emit(&self, event: TimelineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
