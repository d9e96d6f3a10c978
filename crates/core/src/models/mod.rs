//! Data models for Vibechat

mod contact;
mod ids;
mod message;
mod user;

pub use contact::*;
pub use ids::*;
pub use message::*;
pub use user::*;
