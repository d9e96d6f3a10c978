//! Application state management

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vibechat_core::slices::UserAction;
use vibechat_core::{
    AppStore, ChatGateway, ChatId, LoadOutcome, MessageStore, Notice, TimelineConfig,
    TimelineEvent,
};

/// Main application state
pub struct AppState<G> {
    pub store: Arc<AppStore>,
    pub timeline: Arc<MessageStore<G>>,
    /// User-visible notices, newest last
    pub notices: Arc<Mutex<Vec<Notice>>>,
}

impl<G: ChatGateway + 'static> AppState<G> {
    pub fn new(gateway: Arc<G>, chat_id: ChatId, config: TimelineConfig) -> Self {
        Self {
            store: Arc::new(AppStore::new()),
            timeline: Arc::new(MessageStore::new(gateway, chat_id, config)),
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Route timeline events into the shared slices and the notice list.
    /// Ends when the timeline is dropped.
    pub fn spawn_event_forwarder(&self) -> JoinHandle<()> {
        let mut events = self.timeline.subscribe();
        let store = self.store.clone();
        let notices = self.notices.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(TimelineEvent::CurrentUser(profile)) => {
                        store.user.dispatch(UserAction::SignedIn(profile));
                    }
                    Ok(TimelineEvent::SessionExpired) => {
                        warn!("Session expired");
                        store.user.dispatch(UserAction::SessionExpired);
                    }
                    Ok(TimelineEvent::Notice(notice)) => {
                        warn!(text = %notice.text, "Notice");
                        notices.lock().unwrap().push(notice);
                    }
                    Ok(TimelineEvent::Updated) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Bind the timeline to `chat_id` (if different) and load its first page
    pub async fn open_chat(&self, chat_id: ChatId) -> LoadOutcome {
        if self.timeline.chat_id() != chat_id || self.timeline.snapshot().error.is_some() {
            self.timeline.bind(chat_id);
        }
        let outcome = self.timeline.load_initial().await;
        info!(?outcome, "Opened chat");
        outcome
    }

    /// Fetch one older page; false once nothing more can be loaded
    pub async fn load_older(&self) -> bool {
        if !self.timeline.phase().can_load_older() {
            return false;
        }
        matches!(self.timeline.load_older().await, LoadOutcome::Applied)
    }

    /// Take and clear pending notices
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap())
    }
}
