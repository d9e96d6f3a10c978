//! Seeded demo gateway

use std::sync::Arc;

use chrono::{Duration, Utc};
use vibechat_core::{ChatId, MemoryGateway, Message, MessageId, MessageKind, UserId, UserProfile};
use vibechat_net::GatewayServer;

/// Chat seeded by `seed_gateway`
pub const DEMO_CHAT: &str = "lobby";

const DEMO_MESSAGES: usize = 120;

pub fn seed_gateway() -> MemoryGateway {
    let me = UserProfile::new(UserId::from("demo-ada"), "Ada");
    let gateway = MemoryGateway::new().with_user(me);

    let start = Utc::now() - Duration::minutes(DEMO_MESSAGES as i64 * 3);
    let messages = (0..DEMO_MESSAGES)
        .map(|i| {
            let (sender_id, sender_title) = if (i / 3) % 2 == 0 {
                ("demo-ada", "Ada")
            } else {
                ("demo-bob", "Bob")
            };
            let (kind, content) = match i {
                i if i % 11 == 0 => (MessageKind::Voice, format!("media://voice/{}.m4a", i)),
                i if i % 7 == 0 => (MessageKind::Image, format!("media://image/{}.jpg", i)),
                i => (MessageKind::Text, format!("Message number {}", i)),
            };
            Message {
                id: MessageId::new(format!("demo-{:04}", i)),
                sender_id: UserId::from(sender_id),
                sender_title: sender_title.to_string(),
                kind,
                content,
                // Gaps every ten messages exercise row grouping
                time: start + Duration::minutes(i as i64 * 2 + (i / 10) as i64 * 7),
            }
        })
        .collect();

    gateway.insert_chat(ChatId::from(DEMO_CHAT), messages);
    gateway
}

/// Serve the demo gateway on an ephemeral loopback port
pub async fn start_server() -> vibechat_net::Result<GatewayServer> {
    GatewayServer::start("127.0.0.1:0", Arc::new(seed_gateway())).await
}
