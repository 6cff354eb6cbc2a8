//! Core WebSocket infrastructure.
//!
//! # Architecture
//!
//! - [`Connector`]: Opens a [`Connection`] to an endpoint URL
//! - [`FrameSink`]: Outbound half of a connection
//! - [`Frame`]: Inbound text, binary, close and error items
//! - [`TungsteniteConnector`]: The production connector over `tokio-tungstenite`
//!
//! The realtime client only talks to these traits, so the transport can be swapped for
//! an in-memory one in tests.

pub mod connection;
pub mod error;
pub mod traits;

pub use connection::{ConnectionState, TungsteniteConnector};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use traits::*;
