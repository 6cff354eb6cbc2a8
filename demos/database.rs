//! Database query walkthrough.
//!
//! Signs in when credentials are provided, then inserts, reads, updates and deletes a
//! row in the `todos` table.
//!
//! Run with tracing enabled:
//! ```sh
//! AERODB_URL=http://localhost:8000 AERODB_API_KEY=anon-key \
//!     AERODB_EMAIL=ada@example.com AERODB_PASSWORD=secret \
//!     RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,rustls=off \
//!     cargo run --example database --features tracing
//! ```

use aerodb_client_sdk::auth::types::SignInRequest;
use aerodb_client_sdk::database::Direction;
use aerodb_client_sdk::{API_KEY_VAR, Client, Config, URL_VAR};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::var(URL_VAR).unwrap_or_else(|_| "http://localhost:8000".to_owned());
    let config = Config::builder()
        .maybe_api_key(std::env::var(API_KEY_VAR).ok())
        .build();
    let client = Client::new(&url, config)?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("AERODB_EMAIL"),
        std::env::var("AERODB_PASSWORD"),
    ) {
        let request = SignInRequest::builder()
            .email(email)
            .password(password)
            .build();
        match client.auth().sign_in(&request).await {
            Ok(data) => info!(endpoint = "sign_in", user = %data.user.id),
            Err(e) => error!(endpoint = "sign_in", error = %e),
        }
    }

    let created = client
        .table("todos")
        .returning::<Todo>()
        .insert(&json!({ "title": "Try the Rust SDK", "done": false }))
        .await?;
    info!(endpoint = "insert", rows = created.len());

    let Some(todo) = created.first() else {
        return Ok(());
    };

    let open = client
        .table("todos")
        .eq("done", false)
        .order("id", Direction::Desc)
        .limit(5)
        .returning::<Todo>()
        .execute()
        .await?;
    for item in &open {
        info!(endpoint = "select", id = item.id, title = %item.title, done = item.done);
    }

    let updated = client
        .table("todos")
        .eq("id", todo.id)
        .update(&json!({ "done": true }))
        .await?;
    info!(endpoint = "update", rows = updated.len());

    let deleted = client.table("todos").eq("id", todo.id).delete().await?;
    info!(endpoint = "delete", rows = deleted.len());

    client.auth().sign_out().await?;
    Ok(())
}
