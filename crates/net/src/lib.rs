//! Vibechat Network Library
//!
//! TCP transport for the remote chat gateway.
//!
//! # Architecture
//!
//! - **Client**: `GatewayClient` implements `ChatGateway` over a single
//!   connection; concurrent requests are matched to replies by request id
//! - **Server**: `GatewayServer` exposes any `ChatGateway` to clients
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! let server = GatewayServer::start("127.0.0.1:0", Arc::new(MemoryGateway::new())).await?;
//!
//! let client = GatewayClient::connect(&server.addr().to_string(), Duration::from_secs(5)).await?;
//! let page = client.fetch_chat_page(&chat_id, PageRequest::latest(50)).await?;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod protocol;
pub mod server;

pub use client::{ConnectionState, GatewayClient};
pub use error::{Error, Result};
pub use protocol::WireMessage;
pub use server::GatewayServer;

/// Default port for Vibechat gateways
pub const DEFAULT_PORT: u16 = 7440;
