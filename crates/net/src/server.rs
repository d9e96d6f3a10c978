//! TCP server exposing a chat gateway
//!
//! Each connection gets a writer task; every request is answered on its own
//! task so a slow page fetch does not hold up other requests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use vibechat_core::{ChatGateway, ErrorKind, PageRequest};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::WireMessage;

/// Gateway server handle
pub struct GatewayServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl GatewayServer {
    /// Bind `addr` (port 0 for an ephemeral port) and start serving
    pub async fn start<G>(addr: &str, gateway: Arc<G>) -> Result<Self>
    where
        G: ChatGateway + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Gateway server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        tokio::spawn(accept_loop(listener, gateway, shutdown_tx.subscribe()));

        Ok(GatewayServer {
            addr: bound_addr,
            shutdown_tx,
        })
    }

    /// Get the bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting and close open connections
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn accept_loop<G: ChatGateway + 'static>(
    listener: TcpListener,
    gateway: Arc<G>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "Accepted connection");
                        let _ = stream.set_nodelay(true);
                        let (reader, writer) = tokio::io::split(stream);
                        tokio::spawn(handle_connection(
                            reader,
                            writer,
                            peer,
                            gateway.clone(),
                            shutdown_rx.resubscribe(),
                        ));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept error");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Gateway server shutting down");
                break;
            }
        }
    }
}

async fn handle_connection<G: ChatGateway + 'static>(
    mut reader: ReadHalf<TcpStream>,
    writer: WriteHalf<TcpStream>,
    peer: SocketAddr,
    gateway: Arc<G>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (reply_tx, reply_rx) = mpsc::channel::<WireMessage>(64);
    let writer_handle = tokio::spawn(write_replies(writer, reply_rx));

    loop {
        // read_frame is not cancel safe; only shutdown may interrupt it,
        // and the connection is dropped right after
        tokio::select! {
            result = read_frame::<_, WireMessage>(&mut reader) => {
                match result {
                    Ok(request) => {
                        let gateway = gateway.clone();
                        let reply_tx = reply_tx.clone();
                        tokio::spawn(async move {
                            let reply = answer(gateway.as_ref(), request).await;
                            let _ = reply_tx.send(reply).await;
                        });
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!(peer = %peer, "Client closed connection");
                        break;
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Dropping connection");
                        break;
                    }
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    drop(reply_tx);
    writer_handle.abort();
}

async fn write_replies(mut writer: WriteHalf<TcpStream>, mut reply_rx: mpsc::Receiver<WireMessage>) {
    while let Some(reply) = reply_rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &reply).await {
            warn!(error = %e, "Write error");
            break;
        }
    }
}

/// Turn one request into its reply
async fn answer<G: ChatGateway>(gateway: &G, request: WireMessage) -> WireMessage {
    let request_id = request.request_id();
    let fail = |e: vibechat_core::Error| WireMessage::Failure {
        request_id,
        kind: e.kind(),
        reason: e.to_string(),
    };

    match request {
        WireMessage::Ping { request_id } => WireMessage::Pong { request_id },
        WireMessage::FetchCurrentUser { request_id } => match gateway.fetch_current_user().await {
            Ok(profile) => WireMessage::User { request_id, profile },
            Err(e) => fail(e),
        },
        WireMessage::FetchChatPage {
            request_id,
            chat_id,
            limit,
            before,
        } => {
            let page_request = PageRequest { limit, before };
            match gateway.fetch_chat_page(&chat_id, page_request).await {
                Ok(page) => WireMessage::Page { request_id, page },
                Err(e) => fail(e),
            }
        }
        other => {
            debug!(kind = other.name(), "Client sent a reply message");
            WireMessage::Failure {
                request_id,
                kind: ErrorKind::Other,
                reason: format!("{} is not a request", other.name()),
            }
        }
    }
}
