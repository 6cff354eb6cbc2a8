//! Shared types and re-exports used across the SDK.
//!
//! These are re-exported here so users don't need to add the underlying crates to
//! their `Cargo.toml`.

/// Date and time types used for session expiry.
pub use chrono::{DateTime, Utc};
/// Secret string type that redacts values in debug output.
pub use secrecy::{ExposeSecret, SecretString};
/// Loosely typed JSON value, used for metadata and record snapshots.
pub use serde_json::Value;
/// URL type used for hosts and endpoints.
pub use url::Url;

/// A single table row or JSON record as returned by the REST endpoints.
pub type Row = serde_json::Map<String, Value>;
