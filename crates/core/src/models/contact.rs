//! Contact model

use serde::{Deserialize, Serialize};

use super::UserId;

/// A contact matched against the user's device address book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Device contacts permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    #[default]
    Unknown,
    Granted,
    Denied,
}
