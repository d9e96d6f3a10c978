//! Signed-in user slice

use crate::models::{UserId, UserProfile};

use super::Reducer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    SignedOut,
    Active,
    /// The gateway rejected the session
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserState {
    pub profile: Option<UserProfile>,
    pub session: SessionStatus,
}

impl UserState {
    pub fn user_id(&self) -> Option<UserId> {
        self.profile.as_ref().map(|p| p.id.clone())
    }
}

#[derive(Debug, Clone)]
pub enum UserAction {
    SignedIn(UserProfile),
    /// Ignored unless it is the signed-in user's profile
    ProfileUpdated(UserProfile),
    SessionExpired,
    SignedOut,
}

impl Reducer for UserState {
    type Action = UserAction;

    fn reduce(&mut self, action: UserAction) {
        match action {
            UserAction::SignedIn(profile) => {
                self.profile = Some(profile);
                self.session = SessionStatus::Active;
            }
            UserAction::ProfileUpdated(profile) => {
                if self.profile.as_ref().map(|p| &p.id) == Some(&profile.id) {
                    self.profile = Some(profile);
                }
            }
            UserAction::SessionExpired => {
                if self.session == SessionStatus::Active {
                    self.session = SessionStatus::Expired;
                }
            }
            UserAction::SignedOut => {
                *self = UserState::default();
            }
        }
    }
}
