//! TCP client for a chat gateway
//!
//! One connection, many requests in flight. A reader task resolves pending
//! requests by request id; a writer task drains the outgoing queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;
use vibechat_core::{ChatGateway, ChatId, ChatPage, PageRequest, UserProfile};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::WireMessage;

/// Requests awaiting a reply. Once `closed` is set no new request is accepted.
#[derive(Default)]
struct PendingRequests {
    closed: bool,
    waiters: HashMap<Uuid, oneshot::Sender<WireMessage>>,
}

type Pending = Arc<StdMutex<PendingRequests>>;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

enum ClientCommand {
    Send(WireMessage),
    Disconnect,
}

/// Gateway client handle
pub struct GatewayClient {
    state: Arc<RwLock<ConnectionState>>,
    pending: Pending,
    cmd_tx: mpsc::Sender<ClientCommand>,
    request_timeout: Duration,
}

impl GatewayClient {
    /// Connect to a gateway at `addr` (`host:port`)
    pub async fn connect(addr: &str, request_timeout: Duration) -> Result<Self> {
        info!(addr = %addr, "Connecting to gateway");

        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = tokio::io::split(stream);

        let state = Arc::new(RwLock::new(ConnectionState::Connected));
        let pending: Pending = Arc::new(StdMutex::new(PendingRequests::default()));
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        tokio::spawn(reader_task(reader, pending.clone(), state.clone(), cmd_tx.downgrade()));
        tokio::spawn(writer_task(writer, cmd_rx));

        Ok(GatewayClient {
            state,
            pending,
            cmd_tx,
            request_timeout,
        })
    }

    /// Get current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Round-trip a ping
    pub async fn ping(&self) -> Result<Duration> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        match self.request(WireMessage::Ping { request_id }).await? {
            WireMessage::Pong { .. } => Ok(started.elapsed()),
            other => Err(unexpected(&other)),
        }
    }

    /// Close the connection. Pending requests fail with `ConnectionClosed`.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    async fn request(&self, message: WireMessage) -> Result<WireMessage> {
        let request_id = message.request_id();
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap();
            if pending.closed {
                return Err(Error::NotConnected);
            }
            pending.waiters.insert(request_id, reply_tx);
        }

        debug!(request_id = %request_id, kind = message.name(), "Sending request");
        if self.cmd_tx.send(ClientCommand::Send(message)).await.is_err() {
            self.pending.lock().unwrap().waiters.remove(&request_id);
            return Err(Error::NotConnected);
        }

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.pending.lock().unwrap().waiters.remove(&request_id);
                warn!(request_id = %request_id, "Request timed out");
                Err(Error::Timeout)
            }
        }
    }
}

fn unexpected(reply: &WireMessage) -> Error {
    Error::Protocol(format!("Unexpected reply {}", reply.name()))
}

fn failure(kind: vibechat_core::ErrorKind, reason: String) -> vibechat_core::Error {
    vibechat_core::Error::from_kind(kind, reason)
}

impl ChatGateway for GatewayClient {
    async fn fetch_current_user(&self) -> vibechat_core::Result<UserProfile> {
        let request_id = Uuid::new_v4();
        match self.request(WireMessage::FetchCurrentUser { request_id }).await? {
            WireMessage::User { profile, .. } => Ok(profile),
            WireMessage::Failure { kind, reason, .. } => Err(failure(kind, reason)),
            other => Err(unexpected(&other).into()),
        }
    }

    async fn fetch_chat_page(
        &self,
        chat_id: &ChatId,
        request: PageRequest,
    ) -> vibechat_core::Result<ChatPage> {
        let message = WireMessage::FetchChatPage {
            request_id: Uuid::new_v4(),
            chat_id: chat_id.clone(),
            limit: request.limit,
            before: request.before,
        };
        match self.request(message).await? {
            WireMessage::Page { page, .. } => Ok(page),
            WireMessage::Failure { kind, reason, .. } => Err(failure(kind, reason)),
            other => Err(unexpected(&other).into()),
        }
    }
}

/// Resolve pending requests as replies arrive
async fn reader_task(
    mut reader: ReadHalf<TcpStream>,
    pending: Pending,
    state: Arc<RwLock<ConnectionState>>,
    cmd_tx: mpsc::WeakSender<ClientCommand>,
) {
    loop {
        match read_frame::<_, WireMessage>(&mut reader).await {
            Ok(reply) => {
                let request_id = reply.request_id();
                let waiter = pending.lock().unwrap().waiters.remove(&request_id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(reply);
                    }
                    None => debug!(request_id = %request_id, "Reply for unknown or expired request"),
                }
            }
            Err(Error::ConnectionClosed) => {
                debug!("Gateway closed connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Read error");
                break;
            }
        }
    }

    // Dropping the senders fails every outstanding request
    let orphaned = {
        let mut pending = pending.lock().unwrap();
        pending.closed = true;
        std::mem::take(&mut pending.waiters)
    };
    if !orphaned.is_empty() {
        warn!(count = orphaned.len(), "Failing requests after disconnect");
    }
    drop(orphaned);
    *state.write().await = ConnectionState::Disconnected;

    // Stop the writer; later requests fail with NotConnected
    if let Some(cmd_tx) = cmd_tx.upgrade() {
        let _ = cmd_tx.send(ClientCommand::Disconnect).await;
    }
    info!("Disconnected from gateway");
}

async fn writer_task(mut writer: WriteHalf<TcpStream>, mut cmd_rx: mpsc::Receiver<ClientCommand>) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            ClientCommand::Send(msg) => {
                if let Err(e) = write_frame(&mut writer, &msg).await {
                    warn!(error = %e, "Write error");
                    break;
                }
            }
            ClientCommand::Disconnect => {
                debug!("Disconnect requested");
                break;
            }
        }
    }

    let _ = tokio::io::AsyncWriteExt::shutdown(&mut writer).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::GatewayServer;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use vibechat_core::{
        ErrorKind, LoadOutcome, MemoryGateway, Message, MessageId, MessageKind, MessageStore,
        TimelineConfig, UserId,
    };

    fn seeded(n: usize) -> MemoryGateway {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let gateway = MemoryGateway::new().with_user(UserProfile::new(UserId::from("u1"), "Ada"));
        gateway.insert_chat(
            ChatId::from("c1"),
            (0..n)
                .map(|i| Message {
                    id: MessageId::new(format!("m{}", i)),
                    sender_id: UserId::from("u2"),
                    sender_title: "Bob".to_string(),
                    kind: MessageKind::Text,
                    content: format!("hello {}", i),
                    time: base + ChronoDuration::minutes(i as i64),
                })
                .collect(),
        );
        gateway
    }

    async fn start(gateway: MemoryGateway) -> (GatewayServer, GatewayClient) {
        let server = GatewayServer::start("127.0.0.1:0", Arc::new(gateway))
            .await
            .unwrap();
        let client = GatewayClient::connect(&server.addr().to_string(), Duration::from_secs(5))
            .await
            .unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_fetch_over_tcp() {
        let (server, client) = start(seeded(40)).await;

        client.ping().await.unwrap();
        let user = client.fetch_current_user().await.unwrap();
        assert_eq!(user.display_name, "Ada");

        let page = client
            .fetch_chat_page(&ChatId::from("c1"), PageRequest::latest(25))
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 25);
        assert_eq!(page.messages[0].id.as_str(), "m15");
        assert!(page.has_more);

        client.disconnect().await;
        server.shutdown();
    }

    #[tokio::test]
    async fn test_not_found_crosses_wire() {
        let (server, client) = start(seeded(1)).await;

        let err = client
            .fetch_chat_page(&ChatId::from("missing"), PageRequest::latest(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_store_over_tcp() {
        let (server, client) = start(seeded(80)).await;
        let store = MessageStore::new(
            Arc::new(client),
            ChatId::from("c1"),
            TimelineConfig::default(),
        );

        assert_eq!(store.load_initial().await, LoadOutcome::Applied);
        assert_eq!(store.load_older().await, LoadOutcome::Applied);

        let snap = store.snapshot();
        assert_eq!(snap.messages.len(), 80);
        assert!(!snap.has_more);
        assert_eq!(snap.current_user_id, Some(UserId::from("u1")));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_requests_fail_fast_after_server_shutdown() {
        let (server, client) = start(seeded(1)).await;
        client.ping().await.unwrap();
        server.shutdown();

        tokio::time::timeout(Duration::from_secs(2), async {
            while client.connection_state().await == ConnectionState::Connected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(1), client.fetch_current_user())
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_requests_fail_after_disconnect() {
        let (server, client) = start(seeded(1)).await;
        client.disconnect().await;

        let err = client.fetch_current_user().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        server.shutdown();
    }
}
