//! Load state presenter
//!
//! Folds a snapshot's flags into the phase a rendering layer draws:
//!
//! ```text
//! Idle -> InitialLoading -> Ready <-> FetchingOlder
//!               |              |
//!               v              v
//!        Failed{Initial}  Failed{Older}   (recoverable by retrying)
//!        Unavailable                      (chat not found, terminal)
//! ```

use crate::error::ErrorKind;

use super::{ChatSnapshot, LoadScope};

/// How a failure should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Nothing to show behind the error
    FullScreen,
    /// Loaded messages stay visible
    InlineBanner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    InitialLoading,
    Ready { has_more: bool },
    FetchingOlder,
    Failed { scope: LoadScope, kind: ErrorKind },
    Unavailable,
}

impl LoadPhase {
    pub fn derive(snapshot: &ChatSnapshot) -> Self {
        if snapshot.loading {
            return LoadPhase::InitialLoading;
        }
        if snapshot.loading_more {
            return LoadPhase::FetchingOlder;
        }

        match &snapshot.error {
            Some(error) if error.scope == LoadScope::Initial && error.kind == ErrorKind::NotFound => {
                LoadPhase::Unavailable
            }
            Some(error) => LoadPhase::Failed {
                scope: error.scope,
                kind: error.kind,
            },
            // Older pages are fetched before the oldest message, so an
            // empty timeline has nothing to page from
            None if snapshot.loaded => LoadPhase::Ready {
                has_more: snapshot.has_more && !snapshot.messages.is_empty(),
            },
            None => LoadPhase::Idle,
        }
    }

    pub fn treatment(self) -> Option<Treatment> {
        match self {
            LoadPhase::Failed {
                scope: LoadScope::Initial,
                ..
            }
            | LoadPhase::Unavailable => Some(Treatment::FullScreen),
            LoadPhase::Failed {
                scope: LoadScope::Older,
                ..
            } => Some(Treatment::InlineBanner),
            _ => None,
        }
    }

    /// Whether a scroll-to-top should trigger `load_older`
    pub fn can_load_older(self) -> bool {
        matches!(
            self,
            LoadPhase::Ready { has_more: true }
                | LoadPhase::Failed {
                    scope: LoadScope::Older,
                    ..
                }
        )
    }

    pub fn is_busy(self) -> bool {
        matches!(self, LoadPhase::InitialLoading | LoadPhase::FetchingOlder)
    }
}
