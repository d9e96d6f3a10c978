//! Contacts slice and sync
//!
//! The device address book sits behind `ContactSource`; permission dialogs
//! and matching against registered users are the source's business.

use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Contact, PermissionStatus, UserId};

use super::{Reducer, Slice};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactsState {
    pub permission: PermissionStatus,
    /// Sorted by display name, unique by id
    pub contacts: Vec<Contact>,
    pub syncing: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ContactsAction {
    PermissionResolved(PermissionStatus),
    /// Ignored unless permission is granted
    SyncStarted,
    SyncCompleted {
        contacts: Vec<Contact>,
        at: DateTime<Utc>,
    },
    SyncFailed(String),
    ContactRemoved(UserId),
}

impl Reducer for ContactsState {
    type Action = ContactsAction;

    fn reduce(&mut self, action: ContactsAction) {
        match action {
            ContactsAction::PermissionResolved(status) => {
                self.permission = status;
                if status == PermissionStatus::Denied {
                    self.syncing = false;
                }
            }
            ContactsAction::SyncStarted => {
                if self.permission == PermissionStatus::Granted {
                    self.syncing = true;
                    self.error = None;
                }
            }
            ContactsAction::SyncCompleted { contacts, at } => {
                let mut seen = HashSet::new();
                let mut contacts: Vec<Contact> = contacts
                    .into_iter()
                    .filter(|c| seen.insert(c.id.clone()))
                    .collect();
                contacts.sort_by(|a, b| {
                    a.display_name
                        .to_lowercase()
                        .cmp(&b.display_name.to_lowercase())
                });

                self.contacts = contacts;
                self.syncing = false;
                self.last_synced = Some(at);
                self.error = None;
            }
            ContactsAction::SyncFailed(reason) => {
                self.syncing = false;
                self.error = Some(reason);
            }
            ContactsAction::ContactRemoved(id) => {
                self.contacts.retain(|c| c.id != id);
            }
        }
    }
}

/// Device contacts behind the platform permission prompt
pub trait ContactSource: Send + Sync {
    /// Ask for (or look up) address book access
    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// Contacts that are registered users
    fn fetch_contacts(&self) -> impl Future<Output = Result<Vec<Contact>>> + Send;
}

/// Resolve permission if needed, then refresh the contacts slice.
/// Returns the number of contacts stored.
pub async fn sync_contacts<S: ContactSource>(
    slice: &Slice<ContactsState>,
    source: &S,
) -> Result<usize> {
    let (permission, syncing) = slice.with(|s| (s.permission, s.syncing));
    if syncing {
        return Err(Error::InvalidOperation("contacts sync already running".into()));
    }

    let permission = match permission {
        PermissionStatus::Unknown => {
            let status = source.request_permission().await;
            slice.dispatch(ContactsAction::PermissionResolved(status));
            status
        }
        status => status,
    };

    if permission != PermissionStatus::Granted {
        info!("Contacts permission not granted, skipping sync");
        return Err(Error::PermissionDenied("contacts".into()));
    }

    slice.dispatch(ContactsAction::SyncStarted);

    match source.fetch_contacts().await {
        Ok(contacts) => {
            slice.dispatch(ContactsAction::SyncCompleted {
                contacts,
                at: Utc::now(),
            });
            let count = slice.with(|s| s.contacts.len());
            info!(count, "Synced contacts");
            Ok(count)
        }
        Err(e) => {
            warn!(error = %e, "Contacts sync failed");
            slice.dispatch(ContactsAction::SyncFailed(e.to_string()));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: UserId::from(id),
            display_name: name.to_string(),
            phone: None,
        }
    }

    struct FakeSource {
        permission: PermissionStatus,
        fail: bool,
        prompts: AtomicUsize,
    }

    impl FakeSource {
        fn new(permission: PermissionStatus) -> Self {
            Self {
                permission,
                fail: false,
                prompts: AtomicUsize::new(0),
            }
        }
    }

    impl ContactSource for FakeSource {
        async fn request_permission(&self) -> PermissionStatus {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.permission
        }

        async fn fetch_contacts(&self) -> Result<Vec<Contact>> {
            if self.fail {
                return Err(Error::Network("offline".into()));
            }
            Ok(vec![
                contact("u3", "carol"),
                contact("u1", "Alice"),
                contact("u2", "bob"),
                contact("u1", "Alice (dup)"),
            ])
        }
    }

    #[test]
    fn test_sync_started_requires_permission() {
        let mut state = ContactsState::default();
        state.reduce(ContactsAction::SyncStarted);
        assert!(!state.syncing);

        state.reduce(ContactsAction::PermissionResolved(PermissionStatus::Granted));
        state.reduce(ContactsAction::SyncStarted);
        assert!(state.syncing);
    }

    #[test]
    fn test_completed_sorts_and_dedups() {
        let mut state = ContactsState::default();
        state.reduce(ContactsAction::SyncCompleted {
            contacts: vec![contact("b", "bob"), contact("a", "Alice"), contact("b", "Bobby")],
            at: Utc::now(),
        });

        let names: Vec<_> = state.contacts.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "bob"]);

        state.reduce(ContactsAction::ContactRemoved(UserId::from("a")));
        assert_eq!(state.contacts.len(), 1);
    }

    #[tokio::test]
    async fn test_sync_prompts_once_then_stores() {
        let slice = Slice::new(ContactsState::default());
        let source = FakeSource::new(PermissionStatus::Granted);

        assert_eq!(sync_contacts(&slice, &source).await.unwrap(), 3);
        assert_eq!(sync_contacts(&slice, &source).await.unwrap(), 3);
        assert_eq!(source.prompts.load(Ordering::SeqCst), 1);

        let state = slice.get();
        assert_eq!(state.contacts[0].display_name, "Alice");
        assert!(state.last_synced.is_some());
        assert!(!state.syncing);
    }

    #[tokio::test]
    async fn test_sync_denied() {
        let slice = Slice::new(ContactsState::default());
        let source = FakeSource::new(PermissionStatus::Denied);

        let err = sync_contacts(&slice, &source).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert_eq!(slice.get().permission, PermissionStatus::Denied);
        assert!(slice.get().contacts.is_empty());
    }

    #[tokio::test]
    async fn test_sync_failure_recorded() {
        let slice = Slice::new(ContactsState::default());
        let mut source = FakeSource::new(PermissionStatus::Granted);
        source.fail = true;

        assert!(sync_contacts(&slice, &source).await.is_err());
        let state = slice.get();
        assert!(!state.syncing);
        assert!(state.error.is_some());
    }
}
