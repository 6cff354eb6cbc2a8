//! Edge function invocation.
//!
//! **Feature flag:** `functions` (enabled by default)

pub mod client;
pub mod types;

pub use client::Client;
pub use types::{FunctionResponse, InvokeOptions};
