#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::time::Instant;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

use super::error::WsError;
use super::traits::{Connection, Connector, Frame, FrameSink};
use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected {
        /// When the connection was established
        since: Instant,
    },
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// [`Connector`] backed by `tokio-tungstenite`, with TLS through rustls.
///
/// Ping and pong control frames are answered by tungstenite and never surface as
/// [`Frame`]s.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn open(&self, url: &Url) -> Result<Connection> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(WsError::Connection)?;

        let (write, read) = stream.split();
        let frames = read.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Frame::Text(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => Some(Frame::Binary(bytes.to_vec())),
                Ok(Message::Close(_)) => Some(Frame::Close),
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
                Err(e) => Some(Frame::Error(e.to_string())),
            }
        });

        Ok(Connection::new(TungsteniteSink(write), frames))
    }
}

struct TungsteniteSink(SplitSink<WsStream, Message>);

#[async_trait]
impl FrameSink for TungsteniteSink {
    async fn send(&mut self, text: String) -> Result<()> {
        self.0.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.0.close().await?;
        Ok(())
    }
}
