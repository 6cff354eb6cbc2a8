//! Realtime channel walkthrough.
//!
//! Subscribes to inserts and updates on a table, prints every change for a while, then
//! unsubscribes and disconnects.
//!
//! Run with tracing enabled:
//! ```sh
//! AERODB_URL=http://localhost:8000 AERODB_API_KEY=anon-key \
//!     RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,rustls=off \
//!     cargo run --example realtime --features tracing
//! ```

use std::time::Duration;

use aerodb_client_sdk::realtime::{Handler, HandlerResult, WILDCARD};
use aerodb_client_sdk::{API_KEY_VAR, Client, Config, URL_VAR};
use tracing::{info, warn};

const CHANNEL: &str = "public:messages";
const LISTEN_FOR: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::var(URL_VAR).unwrap_or_else(|_| "http://localhost:8000".to_owned());
    let config = Config::builder()
        .maybe_api_key(std::env::var(API_KEY_VAR).ok())
        .build();
    let client = Client::new(&url, config)?;

    let mut state = client.realtime().state_receiver();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            info!(state = ?*state.borrow(), "connection state changed");
        }
    });

    let channel = client.channel(CHANNEL);
    channel
        .on(
            "INSERT",
            Handler::sync(|payload| {
                info!(table = %payload.table, new = ?payload.new, "insert");
                Ok(())
            }),
        )
        .on(
            "UPDATE",
            Handler::new(|payload| async move {
                info!(table = %payload.table, old = ?payload.old, new = ?payload.new, "update");
                HandlerResult::Ok(())
            }),
        )
        .on(
            WILDCARD,
            Handler::sync(|payload| {
                info!(event = %payload.event_type, at = %payload.commit_timestamp, "change");
                Ok(())
            }),
        );

    match channel.subscribe().await {
        Ok(_) => info!(channel = CHANNEL, "subscribed"),
        Err(e) => {
            warn!(channel = CHANNEL, error = %e, "subscribe failed");
            return Err(e.into());
        }
    }

    tokio::time::sleep(LISTEN_FOR).await;

    channel.unsubscribe().await?;
    info!(
        channel = CHANNEL,
        remaining = client.realtime().channel_count(),
        "unsubscribed"
    );

    client.close().await;
    Ok(())
}
