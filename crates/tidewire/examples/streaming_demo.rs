//! Streaming demo: a subscriber widget fed by an in-process transport.
//!
//! Run with: cargo run -p tidewire --example streaming_demo
//!
//! The transport here publishes a few synthetic events after subscribing; a
//! real application plugs in a CometD client instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tidewire::net::Result;
use tidewire::net::streaming::{
    MessageListener, OperationReply, SubscriptionHandle, TransportOptions,
};
use tidewire::prelude::*;
use tracing_subscriber::EnvFilter;

struct TickerTransport;

#[async_trait]
impl StreamingTransport for TickerTransport {
    fn configure(&self, options: &TransportOptions) -> Result<()> {
        println!("configured for {}", options.url);
        Ok(())
    }

    async fn handshake(&self) -> Result<HandshakeReply> {
        Ok(HandshakeReply::accepted("demo-client"))
    }

    async fn subscribe(&self, channel: &str, listener: MessageListener) -> Result<SubscriptionHandle> {
        tokio::spawn(async move {
            for replay_id in 1..=3 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                listener(json!({
                    "data": {
                        "event": {"replayId": replay_id},
                        "sobject": {"Name": format!("INV-{replay_id:04}")}
                    }
                }));
            }
        });
        Ok(SubscriptionHandle::new("1", channel))
    }

    async fn unsubscribe(&self, _handle: &SubscriptionHandle) -> Result<OperationReply> {
        Ok(OperationReply::ok())
    }

    async fn disconnect(&self) -> Result<OperationReply> {
        Ok(OperationReply::ok())
    }
}

struct TickerFactory;

#[async_trait]
impl TransportFactory for TickerFactory {
    fn create(&self) -> Result<Arc<dyn StreamingTransport>> {
        Ok(Arc::new(TickerTransport))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tidewire_net=debug")),
        )
        .init();

    let config = ConnectorConfig::new("https://acme.my.site.com".parse()?, "/topic/InvoiceUpdates")
        .debug(true);
    let connector = ChannelConnector::new(
        config,
        Arc::new(StaticCredential::new("demo-token")?),
        Arc::new(TickerFactory),
    );
    let widget = SubscriberWidget::new(connector);

    widget
        .payload_changed()
        .connect(|text| println!("payload so far: {text}"));
    widget
        .error_changed()
        .connect(|text| println!("error: {text}"));

    widget.mount().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("connected: {}", widget.check_connection());

    if let Some(teardown) = widget.destroy() {
        teardown.await?;
    }
    println!("connected after destroy: {}", widget.check_connection());
    Ok(())
}
