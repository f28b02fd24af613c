//! A minimal in-memory transport for driving the widget.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use tidewire::net::streaming::{
    ChannelConnector, ConnectorConfig, HandshakeReply, MessageListener, OperationReply,
    StaticCredential, StreamingTransport, SubscriptionHandle, TransportFactory, TransportOptions,
};
use tidewire::net::Result;

pub struct LoopbackTransport {
    handshake: HandshakeReply,
    unsubscribe: OperationReply,
    listener: Mutex<Option<MessageListener>>,
}

impl LoopbackTransport {
    pub fn deliver(&self, payload: Value) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener(payload);
        }
    }
}

#[async_trait]
impl StreamingTransport for LoopbackTransport {
    fn configure(&self, _options: &TransportOptions) -> Result<()> {
        Ok(())
    }

    async fn handshake(&self) -> Result<HandshakeReply> {
        Ok(self.handshake.clone())
    }

    async fn subscribe(&self, channel: &str, listener: MessageListener) -> Result<SubscriptionHandle> {
        *self.listener.lock() = Some(listener);
        Ok(SubscriptionHandle::new("1", channel))
    }

    async fn unsubscribe(&self, _handle: &SubscriptionHandle) -> Result<OperationReply> {
        Ok(self.unsubscribe.clone())
    }

    async fn disconnect(&self) -> Result<OperationReply> {
        Ok(OperationReply::ok())
    }
}

pub struct LoopbackFactory {
    pub handshake: HandshakeReply,
    pub unsubscribe: OperationReply,
    pub created: Mutex<Vec<Arc<LoopbackTransport>>>,
}

impl Default for LoopbackFactory {
    fn default() -> Self {
        Self {
            handshake: HandshakeReply::accepted("client-1"),
            unsubscribe: OperationReply::ok(),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl LoopbackFactory {
    pub fn rejecting(error: &str) -> Self {
        Self {
            handshake: HandshakeReply::rejected(error),
            ..Self::default()
        }
    }

    pub fn failing_unsubscribe(error: &str) -> Self {
        Self {
            unsubscribe: OperationReply::failed(error),
            ..Self::default()
        }
    }

    pub fn deliver(&self, payload: Value) {
        if let Some(transport) = self.created.lock().last().cloned() {
            transport.deliver(payload);
        }
    }
}

#[async_trait]
impl TransportFactory for LoopbackFactory {
    fn create(&self) -> Result<Arc<dyn StreamingTransport>> {
        let transport = Arc::new(LoopbackTransport {
            handshake: self.handshake.clone(),
            unsubscribe: self.unsubscribe.clone(),
            listener: Mutex::new(None),
        });
        self.created.lock().push(transport.clone());
        Ok(transport)
    }
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig::new(Url::parse("https://acme.my.site.com").unwrap(), "/topic/InvoiceUpdates")
}

pub fn connector(factory: Arc<LoopbackFactory>) -> ChannelConnector {
    ChannelConnector::new(
        config(),
        Arc::new(StaticCredential::new("TOKEN123").unwrap()),
        factory,
    )
}
