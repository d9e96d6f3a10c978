//! Vibechat Core Library
//!
//! Models, gateway interface, the paginated chat timeline, and shared state
//! slices for the Vibechat client.

pub mod config;
pub mod error;
pub mod gateway;
pub mod invariants;
pub mod models;
pub mod slices;
pub mod timeline;

pub use config::{AppConfig, GatewayConfig, LogConfig, TimelineConfig};
pub use error::{Error, ErrorKind, Result};
pub use gateway::{ChatGateway, MemoryGateway};
pub use models::*;
pub use slices::{AppStore, Reducer, Slice};
pub use timeline::{
    AppendOutcome, ChatSnapshot, LoadOutcome, LoadPhase, LoadScope, MessageStore, Notice,
    TimelineEvent, Treatment,
};
