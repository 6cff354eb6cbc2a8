//! Object storage: upload, download, list and delete files in buckets.
//!
//! **Feature flag:** `storage` (enabled by default)

pub mod client;
pub mod types;

pub use client::{Bucket, Client};
