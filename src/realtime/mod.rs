//! Realtime change feeds over a single WebSocket connection.
//!
//! **Feature flag:** `realtime` (enabled by default)
//!
//! A [`Client`] manages the connection and a registry of named [`Channel`]s. Handlers
//! registered on a channel receive the [`RealtimePayload`] of every `event` frame the
//! server routes to that channel name.
//!
//! ## Wire format
//!
//! | Direction | Frame |
//! |-----------|-------|
//! | out | `{"type":"subscribe","channel":"<name>"}` |
//! | out | `{"type":"unsubscribe","channel":"<name>"}` |
//! | in  | `{"type":"event","channel":"<name>","payload":{…}}` |
//!
//! Frames that fail to decode, frames of other types and events for unregistered
//! channels are dropped. Handler failures are contained and logged with the `tracing`
//! feature.

pub mod channel;
pub mod client;
pub mod types;

pub use channel::{Channel, Handler, HandlerError, HandlerResult, WILDCARD};
pub use client::Client;
pub use types::RealtimePayload;

pub use crate::ws::ConnectionState;
