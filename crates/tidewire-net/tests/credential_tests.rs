//! Integration tests for fetching session credentials over HTTP.

mod common;

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{FakeFactory, config};
use tidewire_net::http::HttpMethod;
use tidewire_net::streaming::{
    ChannelConnector, ConnectorEvent, CredentialSource, ErrorPayload, HttpCredentialSource,
};
use tidewire_net::NetworkError;

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/services/apexrest/streaming/session", server.uri())).unwrap()
}

#[tokio::test]
async fn test_fetch_json_string_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/apexrest/streaming/session"))
        .and(header("authorization", "Bearer access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("TOKEN123")))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpCredentialSource::new(endpoint(&server))
        .unwrap()
        .bearer_auth("access-token");
    let credential = source.fetch().await.unwrap();

    assert_eq!(credential.secret(), "TOKEN123");
    assert_eq!(credential.authorization_header(), "OAuth TOKEN123");
}

#[tokio::test]
async fn test_fetch_object_token_with_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/apexrest/streaming/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc", "expires": 7200})))
        .mount(&server)
        .await;

    let source = HttpCredentialSource::new(endpoint(&server))
        .unwrap()
        .method(HttpMethod::Get)
        .token_field("token");

    assert_eq!(source.fetch().await.unwrap().secret(), "abc");
}

#[tokio::test]
async fn test_fetch_error_uses_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!([
            {"errorCode": "INVALID_SESSION_ID", "message": "Session expired or invalid"}
        ])))
        .mount(&server)
        .await;

    let source = HttpCredentialSource::new(endpoint(&server)).unwrap();
    let err = source.fetch().await.unwrap_err();

    assert_eq!(
        err,
        NetworkError::Credential("Session expired or invalid".into())
    );
}

#[tokio::test]
async fn test_fetch_error_without_body_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = HttpCredentialSource::new(endpoint(&server)).unwrap();
    let err = source.fetch().await.unwrap_err();

    assert_eq!(err, NetworkError::Credential("HTTP 500".into()));
}

#[tokio::test]
async fn test_connector_reports_credential_failure_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let factory = Arc::new(FakeFactory::default());
    let source = HttpCredentialSource::new(endpoint(&server)).unwrap();
    let connector = ChannelConnector::new(config(), Arc::new(source), factory.clone());
    let mut events = connector.events();

    connector.connect().await.unwrap();

    assert_eq!(
        events.try_recv(),
        Some(ConnectorEvent::Error {
            error: ErrorPayload::Text("Unauthorized".into())
        })
    );
    assert_eq!(events.try_recv(), None);
    assert!(!connector.is_connected());
    assert!(factory.transports().is_empty());
}
