//! Transport seam between the realtime client and a concrete WebSocket implementation.

use std::fmt;

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt as _};
use url::Url;

use crate::Result;

/// A single inbound item from the transport.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// The peer closed the connection.
    Close,
    /// The transport failed; no further frames follow.
    Error(String),
}

/// Outbound half of an open connection.
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send(&mut self, text: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens connections to a realtime endpoint.
///
/// [`crate::ws::TungsteniteConnector`] is the production implementation. Tests plug in
/// in-memory connectors to drive the realtime client without a socket.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn open(&self, url: &Url) -> Result<Connection>;
}

/// An open connection: a sink for outgoing text and a stream of inbound frames.
pub struct Connection {
    sink: Box<dyn FrameSink>,
    frames: BoxStream<'static, Frame>,
}

impl Connection {
    #[must_use]
    pub fn new<S, F>(sink: S, frames: F) -> Self
    where
        S: FrameSink,
        F: Stream<Item = Frame> + Send + 'static,
    {
        Self {
            sink: Box::new(sink),
            frames: frames.boxed(),
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (Box<dyn FrameSink>, BoxStream<'static, Frame>) {
        (self.sink, self.frames)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}
