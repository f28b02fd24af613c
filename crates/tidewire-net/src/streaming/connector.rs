//! The channel connector: one streaming subscription and its two events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tidewire_core::logging::{perf_span, targets};
use tidewire_core::{ConnectionGuard, Signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::config::ConnectorConfig;
use super::credential::CredentialSource;
use super::event::{ConnectorEvent, ErrorPayload};
use super::state::ConnectionState;
use super::transport::{
    MessageListener, StreamingTransport, SubscriptionHandle, TransportFactory, TransportOptions,
};
use crate::error::NetworkError;

/// Step-level diagnostics, only emitted when the connector runs with `debug`.
macro_rules! diag {
    ($inner:expr, $($arg:tt)+) => {
        if $inner.config.debug {
            tracing::debug!(target: targets::STREAMING, channel = %$inner.config.channel, $($arg)+);
        }
    };
}

/// Why a connect run stopped early.
enum Abort {
    /// A step failed; the run reports it and returns to `Idle`.
    Failed(ErrorPayload),
    /// `disconnect()` or a newer run took over; the run exits silently.
    Superseded,
}

impl From<NetworkError> for Abort {
    fn from(err: NetworkError) -> Self {
        Self::Failed(ErrorPayload::from(&err))
    }
}

/// Mutable connection record. Only the connector touches it.
#[derive(Default)]
struct Session {
    state: ConnectionState,
    /// Bumped by every connect run and every teardown; a run whose
    /// generation is no longer current abandons itself.
    generation: u64,
    transport: Option<Arc<dyn StreamingTransport>>,
    subscription: Option<SubscriptionHandle>,
}

struct ConnectorInner {
    config: ConnectorConfig,
    credentials: Arc<dyn CredentialSource>,
    factory: Arc<dyn TransportFactory>,
    runtime_loaded: AtomicBool,
    session: Mutex<Session>,
    message: Signal<Value>,
    error: Signal<ErrorPayload>,
    state_changed: Signal<ConnectionState>,
}

/// Manages one streaming subscription and reports what happens to it.
///
/// A connect run loads the messaging runtime, fetches a session credential,
/// configures a transport client for `<origin>/cometd/<api_version>/` with the
/// credential as `Authorization` header (long-polling only), performs the
/// handshake and subscribes to the configured channel.
///
/// Nothing is returned to the caller: outcomes are delivered through signals.
///
/// # Signals
///
/// - [`message`](Self::message): every inbound channel message, unchanged
/// - [`error`](Self::error): runtime-load, credential, handshake and subscribe
///   failures, and rejected `connect()` calls
/// - [`state_changed`](Self::state_changed): every [`ConnectionState`] transition
///
/// Teardown failures are logged, never signalled.
///
/// `connect()` and `disconnect()` spawn onto the ambient tokio runtime and
/// must be called from within one.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tidewire_net::streaming::{ChannelConnector, ConnectorConfig, StaticCredential};
///
/// let connector = ChannelConnector::new(
///     ConnectorConfig::new(origin, "/topic/InvoiceUpdates"),
///     Arc::new(StaticCredential::new(token)?),
///     Arc::new(MyCometdFactory::default()),
/// );
///
/// connector.message().connect(|payload| println!("message: {payload}"));
/// connector.error().connect(|error| eprintln!("error: {error}"));
///
/// connector.connect();
/// // ...
/// connector.disconnect();
/// ```
#[derive(Clone)]
pub struct ChannelConnector {
    inner: Arc<ConnectorInner>,
}

impl ChannelConnector {
    /// Create a connector. No I/O happens until [`connect`](Self::connect).
    pub fn new(
        config: ConnectorConfig,
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectorInner {
                config,
                credentials,
                factory,
                runtime_loaded: AtomicBool::new(false),
                session: Mutex::new(Session::default()),
                message: Signal::new(),
                error: Signal::new(),
                state_changed: Signal::new(),
            }),
        }
    }

    /// Signal emitted with each inbound channel message.
    pub fn message(&self) -> &Signal<Value> {
        &self.inner.message
    }

    /// Signal emitted when something goes wrong.
    pub fn error(&self) -> &Signal<ErrorPayload> {
        &self.inner.error
    }

    /// Signal emitted on every state transition.
    pub fn state_changed(&self) -> &Signal<ConnectionState> {
        &self.inner.state_changed
    }

    /// The connector's configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    /// The configured channel name.
    pub fn channel(&self) -> &str {
        &self.inner.config.channel
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.session.lock().state
    }

    /// `true` iff a subscription handle is currently held.
    pub fn is_connected(&self) -> bool {
        self.inner.session.lock().subscription.is_some()
    }

    /// Start a connect run.
    ///
    /// Returns immediately; the returned handle may be awaited or dropped.
    /// While a subscription is held or another run is in flight the call is
    /// rejected with a [`NetworkError::AlreadyActive`] error event and the live
    /// connection is left alone.
    pub fn connect(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        match inner.begin_run() {
            Ok(generation) => tokio::spawn(inner.run(generation).instrument(perf_span("connect"))),
            Err(err) => {
                tracing::warn!(target: targets::STREAMING, channel = %inner.config.channel, "{}", err);
                tokio::spawn(async move { inner.error.emit(ErrorPayload::from(&err)) })
            }
        }
    }

    /// Tear the connection down.
    ///
    /// The subscription handle is dropped before this returns, so
    /// [`is_connected`](Self::is_connected) reports `false` immediately, and
    /// any connect run in flight abandons itself at its next step. Unsubscribe
    /// and (after a successful unsubscribe) disconnect are then issued in the
    /// background; their outcomes are logged only.
    ///
    /// Returns `None` when there was nothing to tear down.
    pub fn disconnect(&self) -> Option<JoinHandle<()>> {
        let inner = self.inner.clone();
        let (transport, subscription, generation, state) = {
            let mut session = inner.session.lock();
            if session.transport.is_none() && !session.state.is_connecting() {
                return None;
            }
            session.generation += 1;
            let subscription = session.subscription.take();
            let transport = session.transport.take();
            session.state = if transport.is_some() {
                ConnectionState::Disconnecting
            } else {
                ConnectionState::Idle
            };
            (transport, subscription, session.generation, session.state)
        };
        inner.notify_state(state);
        diag!(inner, generation, "disconnect requested");

        let transport = transport?;
        Some(tokio::spawn(async move {
            inner.teardown(transport, subscription, generation).await;
        }))
    }

    /// Bridge both events into an async receiver.
    ///
    /// The bridge disconnects from the connector's signals when dropped.
    pub fn events(&self) -> ConnectorEvents {
        let (tx, receiver) = mpsc::unbounded_channel();
        let message_tx = tx.clone();
        let message_guard = self.inner.message.connect_scoped(move |payload| {
            let _ = message_tx.send(ConnectorEvent::Message {
                payload: payload.clone(),
            });
        });
        let error_guard = self.inner.error.connect_scoped(move |error| {
            let _ = tx.send(ConnectorEvent::Error {
                error: error.clone(),
            });
        });
        ConnectorEvents {
            receiver,
            _guards: (message_guard, error_guard),
        }
    }
}

impl std::fmt::Debug for ChannelConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnector")
            .field("channel", &self.inner.config.channel)
            .field("state", &self.state())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ConnectorInner {
    /// Reserve the session for a new run, or explain why not.
    fn begin_run(&self) -> Result<u64, NetworkError> {
        let generation = {
            let mut session = self.session.lock();
            if session.subscription.is_some() {
                return Err(NetworkError::AlreadyActive(
                    "Subscription already exists.".into(),
                ));
            }
            if session.state.is_connecting() {
                return Err(NetworkError::AlreadyActive(
                    "Connection attempt already in progress.".into(),
                ));
            }
            session.generation += 1;
            session.state = ConnectionState::Loading;
            session.generation
        };
        self.notify_state(ConnectionState::Loading);
        Ok(generation)
    }

    async fn run(self: Arc<Self>, generation: u64) {
        match self.establish(generation).await {
            Ok(handle) => {
                diag!(self, subscription = %handle, "subscribed");
            }
            Err(Abort::Failed(payload)) => {
                if self.abandon(generation) {
                    tracing::warn!(
                        target: targets::STREAMING,
                        channel = %self.config.channel,
                        error = %payload,
                        "connect failed"
                    );
                    self.error.emit(payload);
                }
            }
            Err(Abort::Superseded) => {
                diag!(self, generation, "connect run superseded");
            }
        }
    }

    async fn establish(self: &Arc<Self>, generation: u64) -> Result<SubscriptionHandle, Abort> {
        if !self.runtime_loaded.load(Ordering::SeqCst) {
            diag!(self, "loading messaging runtime");
            self.factory
                .load()
                .await
                .map_err(|err| NetworkError::RuntimeLoad(err.detail()))?;
            self.runtime_loaded.store(true, Ordering::SeqCst);
        }

        self.advance(generation, ConnectionState::Authenticating)?;
        let credential = self.credentials.fetch().await?;
        diag!(self, "session credential acquired");

        let endpoint = self.config.endpoint_url()?;
        let options = TransportOptions::long_polling(endpoint)
            .header("Authorization", credential.authorization_header());
        let transport = self.factory.create()?;
        transport.configure(&options)?;
        diag!(self, url = %options.url, headers = ?options.header_names(), "transport configured");

        self.attach(generation, transport.clone())?;
        let reply = transport
            .handshake()
            .await
            .map_err(|err| NetworkError::Handshake(err.detail()))?;
        if !reply.successful {
            diag!(self, status = ?reply, "handshake rejected");
            return Err(Abort::Failed(ErrorPayload::Status(reply)));
        }
        diag!(self, client_id = ?reply.client_id, "handshake successful");

        self.advance(generation, ConnectionState::Subscribing)?;
        let handle = match transport
            .subscribe(&self.config.channel, self.listener(generation))
            .await
        {
            Ok(handle) => handle,
            Err(err) => {
                close_quietly(&self.config.channel, transport.as_ref()).await;
                return Err(NetworkError::Subscribe(err.detail()).into());
            }
        };

        if self.commit(generation, handle.clone()) {
            Ok(handle)
        } else {
            // Torn down while subscribing; the teardown owns the session, we
            // only release the subscription we just made.
            if let Err(err) = transport.unsubscribe(&handle).await {
                tracing::debug!(target: targets::STREAMING, error = %err, "late unsubscribe failed");
            }
            Err(Abort::Superseded)
        }
    }

    /// The callback handed to the transport. Holds the connector weakly so
    /// the transport never keeps it alive.
    fn listener(self: &Arc<Self>, generation: u64) -> MessageListener {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |payload: Value| {
            if let Some(inner) = weak.upgrade()
                && inner.is_live(generation)
            {
                diag!(inner, payload = %payload, "message received");
                inner.message.emit(payload);
            }
        })
    }

    fn is_live(&self, generation: u64) -> bool {
        let session = self.session.lock();
        session.generation == generation
            && matches!(
                session.state,
                ConnectionState::Subscribing | ConnectionState::Subscribed
            )
    }

    /// Move a run to its next state if it is still the current one.
    fn advance(&self, generation: u64, state: ConnectionState) -> Result<(), Abort> {
        {
            let mut session = self.session.lock();
            if session.generation != generation {
                return Err(Abort::Superseded);
            }
            session.state = state;
        }
        self.notify_state(state);
        Ok(())
    }

    /// Record the run's transport so a teardown can close it mid-handshake.
    fn attach(&self, generation: u64, transport: Arc<dyn StreamingTransport>) -> Result<(), Abort> {
        {
            let mut session = self.session.lock();
            if session.generation != generation {
                return Err(Abort::Superseded);
            }
            session.transport = Some(transport);
            session.state = ConnectionState::Handshaking;
        }
        self.notify_state(ConnectionState::Handshaking);
        Ok(())
    }

    fn commit(&self, generation: u64, handle: SubscriptionHandle) -> bool {
        {
            let mut session = self.session.lock();
            if session.generation != generation {
                return false;
            }
            session.subscription = Some(handle);
            session.state = ConnectionState::Subscribed;
        }
        self.notify_state(ConnectionState::Subscribed);
        true
    }

    /// Return a failed run to `Idle`. `false` if the run was already superseded.
    fn abandon(&self, generation: u64) -> bool {
        {
            let mut session = self.session.lock();
            if session.generation != generation {
                return false;
            }
            session.transport = None;
            session.subscription = None;
            session.state = ConnectionState::Idle;
        }
        self.notify_state(ConnectionState::Idle);
        true
    }

    async fn teardown(
        &self,
        transport: Arc<dyn StreamingTransport>,
        subscription: Option<SubscriptionHandle>,
        generation: u64,
    ) {
        let unsubscribed = match subscription {
            Some(handle) => match transport.unsubscribe(&handle).await {
                Ok(reply) if reply.successful => {
                    diag!(self, subscription = %handle, "unsubscribed successfully");
                    true
                }
                Ok(reply) => {
                    tracing::warn!(
                        target: targets::STREAMING,
                        channel = %self.config.channel,
                        error = ?reply.error,
                        "unsubscription failed"
                    );
                    false
                }
                Err(err) => {
                    tracing::warn!(
                        target: targets::STREAMING,
                        channel = %self.config.channel,
                        error = %NetworkError::Unsubscribe(err.detail()),
                        "unsubscription failed"
                    );
                    false
                }
            },
            // Torn down before the subscription existed: just close the session.
            None => true,
        };

        if unsubscribed {
            match transport.disconnect().await {
                Ok(reply) if reply.successful => {
                    diag!(self, "disconnected");
                }
                Ok(reply) => {
                    tracing::warn!(
                        target: targets::STREAMING,
                        channel = %self.config.channel,
                        error = ?reply.error,
                        "disconnection unsuccessful"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        target: targets::STREAMING,
                        channel = %self.config.channel,
                        error = %NetworkError::Disconnect(err.detail()),
                        "disconnection unsuccessful"
                    );
                }
            }
        }

        let finished = {
            let mut session = self.session.lock();
            if session.generation == generation && session.state == ConnectionState::Disconnecting {
                session.state = ConnectionState::Idle;
                true
            } else {
                false
            }
        };
        if finished {
            self.notify_state(ConnectionState::Idle);
        }
    }

    /// Announce a state the caller has just written under the lock.
    fn notify_state(&self, state: ConnectionState) {
        diag!(self, %state, "state changed");
        self.state_changed.emit(state);
    }
}

/// Best-effort disconnect after a failed subscribe; the outcome is only logged.
async fn close_quietly(channel: &str, transport: &dyn StreamingTransport) {
    match transport.disconnect().await {
        Ok(reply) if reply.successful => {}
        Ok(reply) => {
            tracing::debug!(target: targets::STREAMING, channel, error = ?reply.error, "disconnect after failed subscribe unsuccessful");
        }
        Err(err) => {
            tracing::debug!(target: targets::STREAMING, channel, error = %err, "disconnect after failed subscribe failed");
        }
    }
}

/// Async receiver for a connector's events, created by
/// [`ChannelConnector::events`].
pub struct ConnectorEvents {
    receiver: mpsc::UnboundedReceiver<ConnectorEvent>,
    _guards: (ConnectionGuard<Value>, ConnectionGuard<ErrorPayload>),
}

impl ConnectorEvents {
    /// Wait for the next event.
    ///
    /// Returns `None` once the connector has been dropped.
    pub async fn recv(&mut self) -> Option<ConnectorEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ConnectorEvent> {
        self.receiver.try_recv().ok()
    }
}

impl std::fmt::Debug for ConnectorEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorEvents").finish_non_exhaustive()
    }
}
