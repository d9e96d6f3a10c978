//! Shared application state slices
//!
//! Each slice is a typed container with a pure reducer. Mutation happens
//! only through `dispatch`; observers subscribe through a watch channel.
//! An `AppStore` is created once and passed by reference.

mod contacts;
mod theme;
mod user;

use tokio::sync::watch;

pub use contacts::{sync_contacts, ContactSource, ContactsAction, ContactsState};
pub use theme::{ThemeAction, ThemeMode, ThemeState};
pub use user::{SessionStatus, UserAction, UserState};

/// Pure state transition
pub trait Reducer: Clone + Send + Sync + 'static {
    type Action;

    fn reduce(&mut self, action: Self::Action);
}

/// Observable container for one reducer state
pub struct Slice<S: Reducer> {
    tx: watch::Sender<S>,
}

impl<S: Reducer> Slice<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Apply an action and notify subscribers
    pub fn dispatch(&self, action: S::Action) {
        self.tx.send_modify(|state| state.reduce(action));
    }

    pub fn get(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read without cloning
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Reducer + Default> Default for Slice<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Process-wide shared state
#[derive(Default)]
pub struct AppStore {
    pub contacts: Slice<ContactsState>,
    pub user: Slice<UserState>,
    pub theme: Slice<ThemeState>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserId, UserProfile};

    #[tokio::test]
    async fn test_subscriber_sees_dispatch() {
        let store = AppStore::new();
        let mut rx = store.user.subscribe();

        store
            .user
            .dispatch(UserAction::SignedIn(UserProfile::new(UserId::from("u1"), "Ada")));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().session, SessionStatus::Active);
        assert_eq!(store.user.with(|s| s.user_id()), Some(UserId::from("u1")));
    }

    #[test]
    fn test_slices_are_independent() {
        let store = AppStore::new();
        store.theme.dispatch(ThemeAction::SetMode(ThemeMode::Dark));

        assert!(store.theme.get().is_dark());
        assert_eq!(store.user.get(), UserState::default());
        assert_eq!(store.contacts.get(), ContactsState::default());
    }
}
