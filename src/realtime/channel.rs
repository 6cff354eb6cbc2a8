use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use futures::FutureExt as _;
use futures::future::{self, BoxFuture};

use super::client::ClientInner;
use super::types::{ControlMessage, RealtimePayload};
use crate::Result;
use crate::error::Error;

/// Event type whose handlers run for every payload, after the exact-match handlers.
pub const WILDCARD: &str = "*";

/// Error a handler may return. It is logged and otherwise ignored.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// Outcome of a single handler invocation.
pub type HandlerResult = std::result::Result<(), HandlerError>;

type HandlerFn = dyn Fn(RealtimePayload) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A reference-counted event callback.
///
/// Clones share identity: [`Channel::off`] removes every registration of the clone it
/// is given, and nothing else.
///
/// # Example
///
/// ```
/// use aerodb_client_sdk::realtime::Handler;
///
/// let on_insert = Handler::new(|payload| async move {
///     println!("inserted into {}: {:?}", payload.table, payload.new);
///     Ok(())
/// });
/// let on_any = Handler::sync(|payload| {
///     println!("{} event", payload.event_type);
///     Ok(())
/// });
/// # let _ = (on_insert, on_any);
/// ```
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wraps an async callback.
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(RealtimePayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |payload| callback(payload).boxed()))
    }

    /// Wraps a synchronous callback.
    pub fn sync<F>(callback: F) -> Self
    where
        F: Fn(RealtimePayload) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(move |payload| future::ready(callback(payload)).boxed()))
    }

    fn call(&self, payload: RealtimePayload) -> BoxFuture<'static, HandlerResult> {
        (self.0)(payload)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// A named subscription on the realtime connection.
///
/// Obtain channels through [`super::Client::channel`]; the same name yields the same
/// instance until the channel is unsubscribed or the client disconnects. After that the
/// channel is detached: it has no handlers, and subscribing it again is an error.
pub struct Channel {
    name: String,
    client: Weak<ClientInner>,
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
    subscribed: AtomicBool,
    detached: AtomicBool,
    transition: tokio::sync::Mutex<()>,
}

impl Channel {
    pub(crate) fn new(name: String, client: Weak<ClientInner>) -> Self {
        Self {
            name,
            client,
            handlers: RwLock::new(HashMap::new()),
            subscribed: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    /// Whether the channel has left its client's registry.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Number of registrations for `event_type`, counting duplicates.
    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Event types that currently have at least one handler.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Registers `handler` for `event_type`. Use [`WILDCARD`] to receive every event.
    pub fn on<E: Into<String>>(&self, event_type: E, handler: Handler) -> &Self {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.into())
            .or_default()
            .push(handler);
        self
    }

    /// Removes every registration of `handler` for `event_type`, or all handlers for
    /// `event_type` when `handler` is `None`.
    pub fn off(&self, event_type: &str, handler: Option<&Handler>) -> &Self {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match handler {
            None => {
                handlers.remove(event_type);
            }
            Some(handler) => {
                if let Some(list) = handlers.get_mut(event_type) {
                    list.retain(|registered| registered != handler);
                    if list.is_empty() {
                        handlers.remove(event_type);
                    }
                }
            }
        }

        self
    }

    /// Sends a subscribe frame, connecting first if needed.
    ///
    /// Subscribing an already subscribed channel does nothing.
    pub async fn subscribe(&self) -> Result<&Self> {
        let _transition = self.transition.lock().await;

        if self.is_detached() {
            return Err(Error::validation(format!(
                "channel {} has been removed from its client, request a new one",
                self.name
            )));
        }
        if self.is_subscribed() {
            return Ok(self);
        }

        let client = self
            .client
            .upgrade()
            .ok_or_else(|| Error::validation("realtime client has been dropped"))?;

        let sent = client
            .send_message(self, &ControlMessage::subscribe(&self.name))
            .await?;
        if !sent {
            return Err(Error::validation(format!(
                "channel {} was removed by a disconnect, request a new one",
                self.name
            )));
        }
        self.subscribed.store(true, Ordering::SeqCst);
        client.on_subscribe(self);

        Ok(self)
    }

    /// Sends an unsubscribe frame, drops every handler and removes the channel from its
    /// client. Unsubscribing a channel that is not subscribed does nothing.
    pub async fn unsubscribe(&self) -> Result<()> {
        let _transition = self.transition.lock().await;

        if !self.is_subscribed() {
            return Ok(());
        }

        let Some(client) = self.client.upgrade() else {
            self.detach();
            return Ok(());
        };

        let sent = client
            .send_message(self, &ControlMessage::unsubscribe(&self.name))
            .await?;
        if !sent {
            return Ok(());
        }
        self.detach();
        client.on_unsubscribe(self);

        Ok(())
    }

    /// Runs the handlers registered for `payload.event_type`, then the wildcard handlers.
    ///
    /// Handler errors and panics are logged and do not stop later handlers.
    pub async fn dispatch(&self, payload: RealtimePayload) {
        let handlers: Vec<Handler> = {
            let handlers = self
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            handlers
                .get(&payload.event_type)
                .into_iter()
                .chain(handlers.get(WILDCARD))
                .flatten()
                .cloned()
                .collect()
        };

        for handler in handlers {
            self.invoke(&handler, payload.clone()).await;
        }
    }

    async fn invoke(&self, handler: &Handler, payload: RealtimePayload) {
        #[cfg(feature = "tracing")]
        let event_type = payload.event_type.clone();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(payload))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(channel = %self.name, %event_type, error = %e, "realtime handler failed");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
            Err(panic) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    channel = %self.name,
                    %event_type,
                    panic = panic_message(panic.as_ref()),
                    "realtime handler panicked"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = &panic;
            }
        }
    }

    pub(crate) fn detach(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
        self.detached.store(true, Ordering::SeqCst);
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(feature = "tracing")]
fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("subscribed", &self.is_subscribed())
            .field("detached", &self.is_detached())
            .field("event_types", &self.event_types())
            .finish_non_exhaustive()
    }
}
