//! Vibechat - headless chat timeline client
//!
//! Connects to a chat gateway, opens one chat, pages through its history,
//! and prints the timeline.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vibechat_core::{AppConfig, ChatId};
use vibechat_net::GatewayClient;

mod cli;
mod demo;
mod state;
mod viewmodel;

use state::AppState;
use viewmodel::chat::{build_rows, render_lines, status_line};

fn main() {
    let args = cli::Args::parse();

    // Config first: it carries the default log filter
    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.as_str()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting Vibechat");

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    if let Err(e) = runtime.block_on(run(args, config)) {
        tracing::error!("Vibechat failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: cli::Args, config: AppConfig) -> vibechat_core::Result<()> {
    // Keep the demo server alive for the whole session
    let demo_server = if args.demo {
        Some(demo::start_server().await?)
    } else {
        None
    };
    let addr = match &demo_server {
        Some(server) => server.addr().to_string(),
        None => config.gateway.addr.clone(),
    };

    let client = GatewayClient::connect(
        &addr,
        Duration::from_millis(config.gateway.request_timeout_ms),
    )
    .await?;
    let rtt = client.ping().await?;
    info!(addr = %addr, rtt_ms = rtt.as_millis() as u64, "Gateway reachable");

    let chat_id = ChatId::new(args.chat);
    let app = AppState::new(Arc::new(client), chat_id.clone(), config.timeline);
    let forwarder = app.spawn_event_forwarder();

    app.open_chat(chat_id).await;
    for _ in 0..args.older {
        if !app.load_older().await {
            break;
        }
    }

    let snapshot = app.timeline.snapshot();
    for line in render_lines(&build_rows(&snapshot)) {
        println!("{}", line);
    }
    if let Some(status) = status_line(app.timeline.phase()) {
        println!("-- {}", status);
    }

    if let Some(user) = app.store.user.get().profile {
        info!(user = %user.display_name, count = snapshot.messages.len(), "Done");
    }

    app.timeline.close();
    drop(app);
    let _ = forwarder.await;
    if let Some(server) = demo_server {
        server.shutdown();
    }
    Ok(())
}
