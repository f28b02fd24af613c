//! Scripted transport and credential fakes shared by the connector tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use url::Url;

use tidewire_net::streaming::{
    ChannelConnector, ConnectorConfig, CredentialSource, HandshakeReply, MessageListener,
    OperationReply, SessionCredential, StreamingTransport, SubscriptionHandle, TransportFactory,
    TransportOptions,
};
use tidewire_net::{NetworkError, Result};

pub const ORIGIN: &str = "https://acme.my.site.com";
pub const CHANNEL: &str = "/topic/InvoiceUpdates";
pub const TOKEN: &str = "TOKEN123";

/// How every transport created by a [`FakeFactory`] answers.
pub struct Script {
    pub handshake: Mutex<Result<HandshakeReply>>,
    /// When set, `handshake` waits for a notification before replying.
    pub handshake_gate: Mutex<Option<Arc<Notify>>>,
    pub subscribe_error: Mutex<Option<NetworkError>>,
    /// When set, `subscribe` waits for a notification before replying.
    pub subscribe_gate: Mutex<Option<Arc<Notify>>>,
    pub unsubscribe: Mutex<Result<OperationReply>>,
    pub disconnect: Mutex<Result<OperationReply>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            handshake: Mutex::new(Ok(HandshakeReply::accepted("client-1"))),
            handshake_gate: Mutex::new(None),
            subscribe_error: Mutex::new(None),
            subscribe_gate: Mutex::new(None),
            unsubscribe: Mutex::new(Ok(OperationReply::ok())),
            disconnect: Mutex::new(Ok(OperationReply::ok())),
        }
    }
}

pub struct FakeTransport {
    script: Arc<Script>,
    pub calls: Mutex<Vec<String>>,
    pub options: Mutex<Option<TransportOptions>>,
    listener: Mutex<Option<MessageListener>>,
    next_id: AtomicUsize,
}

impl FakeTransport {
    fn new(script: Arc<Script>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
            options: Mutex::new(None),
            listener: Mutex::new(None),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Push a message through the listener registered by `subscribe`.
    pub fn deliver(&self, payload: Value) -> bool {
        let listener = self.listener.lock().clone();
        match listener {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(call)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl StreamingTransport for FakeTransport {
    fn configure(&self, options: &TransportOptions) -> Result<()> {
        self.record("configure");
        *self.options.lock() = Some(options.clone());
        Ok(())
    }

    async fn handshake(&self) -> Result<HandshakeReply> {
        self.record("handshake");
        let gate = self.script.handshake_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script.handshake.lock().clone()
    }

    async fn subscribe(&self, channel: &str, listener: MessageListener) -> Result<SubscriptionHandle> {
        self.record(format!("subscribe:{channel}"));
        let gate = self.script.subscribe_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.script.subscribe_error.lock().clone() {
            return Err(err);
        }
        *self.listener.lock() = Some(listener);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(SubscriptionHandle::new(id.to_string(), channel))
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<OperationReply> {
        self.record(format!("unsubscribe:{}", handle.channel()));
        self.script.unsubscribe.lock().clone()
    }

    async fn disconnect(&self) -> Result<OperationReply> {
        self.record("disconnect");
        self.script.disconnect.lock().clone()
    }
}

#[derive(Default)]
pub struct FakeFactory {
    pub script: Arc<Script>,
    pub load_calls: AtomicUsize,
    /// Number of upcoming `load` calls that fail.
    pub load_failures: AtomicUsize,
    pub created: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeFactory {
    pub fn transports(&self) -> Vec<Arc<FakeTransport>> {
        self.created.lock().clone()
    }

    pub fn last(&self) -> Arc<FakeTransport> {
        self.created
            .lock()
            .last()
            .cloned()
            .expect("no transport was created")
    }

    pub fn loads(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportFactory for FakeFactory {
    async fn load(&self) -> Result<()> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .load_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NetworkError::RuntimeLoad("script failed to load".into()));
        }
        Ok(())
    }

    fn create(&self) -> Result<Arc<dyn StreamingTransport>> {
        let transport = Arc::new(FakeTransport::new(self.script.clone()));
        self.created.lock().push(transport.clone());
        Ok(transport)
    }
}

pub struct FakeCredential {
    result: Result<SessionCredential>,
    pub calls: AtomicUsize,
}

impl FakeCredential {
    pub fn ok(token: &str) -> Self {
        Self {
            result: SessionCredential::new(token),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(NetworkError::Credential(message.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for FakeCredential {
    async fn fetch(&self) -> Result<SessionCredential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig::new(Url::parse(ORIGIN).unwrap(), CHANNEL)
}

pub struct Harness {
    pub connector: ChannelConnector,
    pub factory: Arc<FakeFactory>,
    pub credential: Arc<FakeCredential>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(config(), FakeCredential::ok(TOKEN))
    }

    pub fn with(config: ConnectorConfig, credential: FakeCredential) -> Self {
        let factory = Arc::new(FakeFactory::default());
        let credential = Arc::new(credential);
        let connector = ChannelConnector::new(config, credential.clone(), factory.clone());
        Self {
            connector,
            factory,
            credential,
        }
    }

    pub fn script(&self) -> &Script {
        &self.factory.script
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tidewire_net=debug")
        .with_test_writer()
        .try_init();
}
