//! Table queries against the AeroDB REST endpoint.
//!
//! **Feature flag:** `database` (enabled by default)
//!
//! ```no_run
//! use aerodb_client_sdk::{Client, Config};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("https://project.aerodb.dev", Config::default())?;
//!
//! let created = client
//!     .table("todos")
//!     .insert(&json!({ "title": "write docs", "done": false }))
//!     .await?;
//! let open = client.table("todos").eq("done", false).execute().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{Client, QueryBuilder};
pub use types::{Direction, FilterOperator, Nulls};
