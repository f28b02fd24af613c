//! Integration tests for the subscriber widget.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{LoopbackFactory, config, connector};
use tidewire::net::streaming::{
    ChannelConnector, CredentialSource, SessionCredential,
};
use tidewire::net::{NetworkError, Result};
use tidewire::settings::{CredentialSettings, StreamingSettings};
use tidewire::widget::SubscriberWidget;

struct Unauthorized;

#[async_trait]
impl CredentialSource for Unauthorized {
    async fn fetch(&self) -> Result<SessionCredential> {
        Err(NetworkError::Credential("Unauthorized".into()))
    }
}

#[tokio::test]
async fn test_payloads_accumulate_in_arrival_order() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(connector(factory.clone()));
    let changes = Arc::new(Mutex::new(Vec::new()));
    let seen = changes.clone();
    widget
        .payload_changed()
        .connect(move |text| seen.lock().push(text.clone()));

    widget.restart().await.unwrap();
    let first = json!({"foo": "bar"});
    let second = json!({"count": 2, "items": [1, 2]});
    factory.deliver(first.clone());
    factory.deliver(second.clone());

    let expected = format!("{}{}", first, second);
    assert_eq!(widget.payload(), expected);
    assert_eq!(widget.payload(), r#"{"foo":"bar"}{"count":2,"items":[1,2]}"#);
    assert_eq!(changes.lock().len(), 2);
    assert!(!widget.has_error());
}

#[tokio::test]
async fn test_mount_subscribes_without_restart() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(connector(factory.clone()));

    widget.mount().await.unwrap();
    factory.deliver(json!({"foo": "bar"}));

    assert!(widget.check_connection());
    assert_eq!(widget.payload(), r#"{"foo":"bar"}"#);
    assert!(!widget.has_error());
}

#[tokio::test]
async fn test_credential_error_is_shown_and_payload_untouched() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(ChannelConnector::new(
        config(),
        Arc::new(Unauthorized),
        factory,
    ));

    widget.restart().await.unwrap();

    assert_eq!(widget.error(), "Unauthorized");
    assert!(widget.has_error());
    assert_eq!(widget.payload(), "");
    assert!(!widget.check_connection());
}

#[tokio::test]
async fn test_rejected_handshake_is_shown_as_json() {
    let factory = Arc::new(LoopbackFactory::rejecting("403::Handshake denied"));
    let widget = SubscriberWidget::new(connector(factory));

    widget.restart().await.unwrap();

    let shown: Value = serde_json::from_str(&widget.error()).unwrap();
    assert_eq!(shown["successful"], false);
    assert_eq!(shown["error"], "403::Handshake denied");
}

#[tokio::test]
async fn test_second_restart_reports_existing_subscription() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(connector(factory));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = errors.clone();
    widget
        .error_changed()
        .connect(move |text| seen.lock().push(text.clone()));

    widget.restart().await.unwrap();
    widget.restart().await.unwrap();

    assert_eq!(widget.error(), "Subscription already exists.");
    assert_eq!(*errors.lock(), vec!["Subscription already exists.".to_string()]);
}

#[tokio::test]
async fn test_check_connection_records_result() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(connector(factory));
    let checks = Arc::new(Mutex::new(Vec::new()));
    let seen = checks.clone();
    widget
        .connection_checked()
        .connect(move |connected| seen.lock().push(*connected));

    assert_eq!(widget.connection_on(), None);
    assert!(!widget.check_connection());
    assert_eq!(widget.connection_on(), Some(false));

    widget.restart().await.unwrap();
    assert!(widget.check_connection());
    assert_eq!(widget.connection_on(), Some(true));
    assert_eq!(*checks.lock(), vec![false, true]);
}

#[tokio::test]
async fn test_destroy_disconnects_and_clears_text() {
    let factory = Arc::new(LoopbackFactory::default());
    let widget = SubscriberWidget::new(connector(factory.clone()));
    widget.restart().await.unwrap();
    factory.deliver(json!({"foo": "bar"}));
    widget.restart().await.unwrap();
    assert!(widget.has_error());

    let teardown = widget.destroy();

    assert_eq!(widget.payload(), "");
    assert_eq!(widget.error(), "");
    assert!(!widget.check_connection());
    teardown.expect("teardown").await.unwrap();

    factory.deliver(json!({"late": true}));
    assert_eq!(widget.payload(), "");
}

#[tokio::test]
async fn test_destroy_clears_text_when_unsubscribe_fails() {
    let factory = Arc::new(LoopbackFactory::failing_unsubscribe("403::Unknown client"));
    let widget = SubscriberWidget::new(connector(factory.clone()));
    widget.restart().await.unwrap();
    factory.deliver(json!({"foo": "bar"}));
    widget.restart().await.unwrap();
    assert!(widget.has_error());

    let teardown = widget.destroy();

    assert_eq!(widget.payload(), "");
    assert_eq!(widget.error(), "");
    teardown.expect("teardown").await.unwrap();

    assert!(!widget.has_error());
    assert!(!widget.check_connection());
}

#[tokio::test]
async fn test_dropping_widget_releases_connector_slots() {
    let factory = Arc::new(LoopbackFactory::default());
    let connector = connector(factory);
    let widget = SubscriberWidget::new(connector.clone());
    assert_eq!(connector.message().connection_count(), 1);
    assert_eq!(connector.error().connection_count(), 1);

    drop(widget);

    assert_eq!(connector.message().connection_count(), 0);
    assert_eq!(connector.error().connection_count(), 0);
}

#[tokio::test]
async fn test_from_settings_uses_configured_connector() {
    let mut settings = StreamingSettings::new(
        config().debug(true),
        CredentialSettings::new(
            "https://acme.my.site.com/services/apexrest/streaming/session"
                .parse()
                .unwrap(),
        ),
    );
    settings.connect_on_create = false;
    let factory = Arc::new(LoopbackFactory::default());

    let widget = SubscriberWidget::from_settings(&settings, factory.clone()).unwrap();
    tokio::task::yield_now().await;

    assert_eq!(widget.connector().channel(), "/topic/InvoiceUpdates");
    assert!(widget.connector().config().debug);
    assert!(!widget.check_connection());
    assert!(factory.created.lock().is_empty());
}

#[tokio::test]
async fn test_from_settings_connects_on_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "TOKEN123"})))
        .expect(1)
        .mount(&server)
        .await;
    let settings = StreamingSettings::new(
        config(),
        CredentialSettings::new(
            format!("{}/services/apexrest/streaming/session", server.uri())
                .parse()
                .unwrap(),
        ),
    );
    let factory = Arc::new(LoopbackFactory::default());

    let widget = SubscriberWidget::from_settings(&settings, factory.clone()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !widget.connector().is_connected() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("widget never subscribed");
    factory.deliver(json!({"foo": "bar"}));

    assert_eq!(widget.payload(), r#"{"foo":"bar"}"#);
    assert!(!widget.has_error());
}
