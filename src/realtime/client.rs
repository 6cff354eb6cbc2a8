use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures::StreamExt as _;
use futures::stream::BoxStream;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::channel::Channel;
use super::types::RealtimeMessage;
use crate::Result;
use crate::auth::TokenProvider;
use crate::ws::{Connector, Frame, FrameSink, TungsteniteConnector, WsError};
use crate::ws::connection::ConnectionState;

type Registry = DashMap<String, Arc<Channel>>;

/// Realtime connection manager.
///
/// Owns at most one WebSocket connection and the registry of named [`Channel`]s routed
/// over it. The connection is opened lazily by the first [`Channel::subscribe`] (or
/// explicitly with [`Client::connect`]) and is not re-established automatically: after a
/// dropped connection the next send reconnects, but server-side subscriptions are not
/// restored. Call [`Client::disconnect`] and re-subscribe fresh channels to recover.
///
/// # Example
///
/// ```rust, no_run
/// use aerodb_client_sdk::realtime::{Client, Handler};
/// use aerodb_client_sdk::types::Url;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Url::parse("wss://project.aerodb.dev/realtime/v1/websocket")?;
/// let client = Client::new(endpoint, None, Arc::new(None::<String>));
///
/// let channel = client.channel("public:messages");
/// channel
///     .on("INSERT", Handler::sync(|payload| {
///         println!("new row: {:?}", payload.new);
///         Ok(())
///     }))
///     .subscribe()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    endpoint: Url,
    api_key: Option<SecretString>,
    tokens: Arc<dyn TokenProvider>,
    connector: Arc<dyn Connector>,
    channels: Arc<Registry>,
    connection: Mutex<Option<ActiveConnection>>,
    state_tx: watch::Sender<ConnectionState>,
}

struct ActiveConnection {
    sink: Box<dyn FrameSink>,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Client {
    /// Creates a client that connects to `endpoint` over `tokio-tungstenite`.
    ///
    /// `api_key` and the token from `tokens` are appended to the endpoint as the
    /// `apikey` and `token` query parameters each time a connection is opened.
    #[must_use]
    pub fn new(
        endpoint: Url,
        api_key: Option<SecretString>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self::with_connector(endpoint, api_key, tokens, TungsteniteConnector)
    }

    /// Creates a client that opens connections through `connector`.
    #[must_use]
    pub fn with_connector<C: Connector>(
        endpoint: Url,
        api_key: Option<SecretString>,
        tokens: Arc<dyn TokenProvider>,
        connector: C,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                api_key,
                tokens,
                connector: Arc::new(connector),
                channels: Arc::new(DashMap::new()),
                connection: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Returns the channel registered under `name`, creating it if needed.
    ///
    /// Repeated calls return the same instance until the channel is unsubscribed or the
    /// client disconnects.
    #[must_use]
    pub fn channel<N: Into<String>>(&self, name: N) -> Arc<Channel> {
        let name = name.into();
        let entry = self
            .inner
            .channels
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Channel::new(name, Arc::downgrade(&self.inner))));

        Arc::clone(entry.value())
    }

    /// Opens the connection if it is not already open.
    pub async fn connect(&self) -> Result<()> {
        let mut connection = self.inner.connection.lock().await;
        self.inner.connect_locked(&mut connection).await
    }

    /// Closes the connection and clears the channel registry.
    ///
    /// No unsubscribe frames are sent. Every removed channel is detached: its handlers
    /// are dropped and it cannot be subscribed again. The connection is taken and the
    /// registry cleared under the connection lock, so a channel subscribed afterwards
    /// belongs to the next connection. Returns once the old receive loop has stopped.
    /// Must not be awaited from inside a handler.
    pub async fn disconnect(&self) {
        let active = {
            let mut connection = self.inner.connection.lock().await;
            let active = connection.take();
            self.inner.channels.retain(|_, channel| {
                channel.detach();
                false
            });
            self.inner.state_tx.send_replace(ConnectionState::Disconnected);
            active
        };

        if let Some(active) = active {
            active.shutdown().await;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.inner.endpoint, "realtime client disconnected");
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Number of channels currently in the registry.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.channels.len()
    }

    /// Endpoint without the `apikey`/`token` query parameters.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("state", &self.state())
            .field("channels", &self.channel_count())
            .finish_non_exhaustive()
    }
}

impl ClientInner {
    /// Serialises `message` for `channel` and writes it, connecting first if needed.
    ///
    /// The connection mutex is held for the whole call, so concurrent sends are written
    /// one at a time and at most one connect is in flight. Returns `false` without
    /// sending when `channel` was detached by a [`Client::disconnect`] that held the lock
    /// first.
    pub(crate) async fn send_message<M: Serialize + Sync>(
        &self,
        channel: &Channel,
        message: &M,
    ) -> Result<bool> {
        let text = serde_json::to_string(message)?;

        let mut connection = self.connection.lock().await;
        if channel.is_detached() {
            return Ok(false);
        }
        self.connect_locked(&mut connection).await?;

        let Some(active) = connection.as_mut() else {
            return Err(WsError::ConnectionClosed.into());
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(%text, "sending realtime frame");

        active.sink.send(text).await?;
        Ok(true)
    }

    pub(crate) fn on_subscribe(&self, channel: &Channel) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            endpoint = %self.endpoint,
            channel = %channel.name(),
            "realtime channel subscribed"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (self, channel);
    }

    /// Drops `channel` from the registry, unless the name now maps to another instance.
    pub(crate) fn on_unsubscribe(&self, channel: &Channel) {
        let removed = self.channels.remove_if(channel.name(), |_, registered| {
            std::ptr::eq(Arc::as_ptr(registered), channel)
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            channel = %channel.name(),
            removed = removed.is_some(),
            "realtime channel unsubscribed"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = removed;
    }

    async fn connect_locked(&self, connection: &mut Option<ActiveConnection>) -> Result<()> {
        if let Some(active) = connection.as_ref() {
            if !active.task.is_finished() {
                return Ok(());
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("realtime receive loop has ended, replacing connection");
            if let Some(stale) = connection.take() {
                stale.shutdown().await;
            }
        }

        self.state_tx.send_replace(ConnectionState::Connecting);

        let opened = match self.connector.open(&self.connection_url()).await {
            Ok(opened) => opened,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %self.endpoint, error = %e, "unable to open realtime connection");
                self.state_tx.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let (sink, frames) = opened.into_parts();
        let cancel = CancellationToken::new();

        self.state_tx.send_replace(ConnectionState::Connected {
            since: Instant::now(),
        });

        let task = tokio::spawn(receive_loop(
            frames,
            Arc::clone(&self.channels),
            self.state_tx.clone(),
            cancel.clone(),
        ));

        *connection = Some(ActiveConnection { sink, task, cancel });

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint, "realtime connection opened");

        Ok(())
    }

    /// Endpoint with `apikey` and `token` appended. The token is read on every call.
    fn connection_url(&self) -> Url {
        let mut params: Vec<(&str, SecretString)> = Vec::new();
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }
        if let Some(token) = self.tokens.token() {
            params.push(("token", token));
        }

        let mut url = self.endpoint.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                params
                    .iter()
                    .map(|(name, value)| (*name, value.expose_secret())),
            );
        }
        url
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(active) = self.connection.get_mut().take() {
            active.cancel.cancel();
        }
    }
}

impl ActiveConnection {
    async fn shutdown(mut self) {
        self.cancel.cancel();

        if let Err(e) = (&mut self.task).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "realtime receive loop terminated abnormally");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }

        if let Err(e) = self.sink.close().await {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "error closing realtime connection");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }
}

async fn receive_loop(
    mut frames: BoxStream<'static, Frame>,
    channels: Arc<Registry>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = frames.next() => frame,
        };

        match frame {
            Some(Frame::Text(text)) => route(&channels, &text).await,
            Some(Frame::Binary(bytes)) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(len = bytes.len(), "ignoring binary realtime frame");
                #[cfg(not(feature = "tracing"))]
                let _ = &bytes;
            }
            Some(Frame::Close) | None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("realtime connection closed by server");
                break;
            }
            Some(Frame::Error(reason)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%reason, "realtime connection failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &reason;
                break;
            }
        }
    }

    // A cancelled loop no longer owns the published state.
    if !cancel.is_cancelled() {
        state_tx.send_replace(ConnectionState::Disconnected);
    }
}

async fn route(channels: &Registry, text: &str) {
    let message = match serde_json::from_str::<RealtimeMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(%text, error = %e, "dropping undecodable realtime frame");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
            return;
        }
    };

    let RealtimeMessage::Event { channel, payload } = message else {
        return;
    };

    let target = channels.get(&channel).map(|entry| Arc::clone(entry.value()));
    match target {
        Some(target) => target.dispatch(payload).await,
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!(%channel, "dropping event for unknown channel");
        }
    }
}
