use dispatcher_core::{ChatMessage, Classify, FailureKind, PartnerId};
use dispatcher_sdk::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===== Test Helper Functions =====

fn logistics_client(server: &MockServer) -> LogisticsClient {
    let http = HttpClient::new(SdkConfig::new(server.uri())).unwrap();
    LogisticsClient::new(Arc::new(http))
}

fn completion_client(server: &MockServer, timeout: Duration) -> AnthropicClient {
    let config = AnthropicClient::sdk_config(server.uri(), "test-key", DEFAULT_API_VERSION)
        .with_timeout(timeout);
    let http = HttpClient::new(config).unwrap();
    AnthropicClient::new(Arc::new(http), CompletionSettings::default())
}

fn messages_body(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 4}
    })
}

// ===== Logistics Client Tests =====

#[tokio::test]
async fn test_fetch_partners() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Supplier/GetAllSuppliers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Trans Balkan",
                "language": "Serbian",
                "address": {"city": "Belgrade", "country": "Serbia", "latitude": 44.8, "longitude": 20.4}
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let partners = logistics_client(&server).partners().await.unwrap();

    assert_eq!(partners.len(), 1);
    assert_eq!(partners[0].id, PartnerId::Number(1));
    assert_eq!(partners[0].address.city, "Belgrade");
}

#[tokio::test]
async fn test_fetch_transport_history_and_cities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Transport/GetTransportHistory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"supplierId": 1, "price": 1200, "loadCity": "Barcelona"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Helper/GetAvailableCities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"city": "Barcelona", "country": "Spain"},
            {"city": "Belgrade", "country": "Serbia"}
        ])))
        .mount(&server)
        .await;

    let client = logistics_client(&server);
    let history = client.transport_history().await.unwrap();
    let cities = client.available_cities().await.unwrap();

    assert_eq!(history[0].details["loadCity"], json!("Barcelona"));
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[1].city, "Belgrade");
}

#[tokio::test]
async fn test_data_source_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Supplier/GetAllSuppliers"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = logistics_client(&server).partners().await.unwrap_err();

    assert!(matches!(err, SdkError::ServerError { status: 503, .. }));
    assert_eq!(err.failure_kind(), FailureKind::Transient);
}

#[tokio::test]
async fn test_malformed_payload_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Supplier/GetAllSuppliers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = logistics_client(&server).partners().await.unwrap_err();

    assert!(matches!(err, SdkError::SerializationError(_)));
    assert_eq!(err.failure_kind(), FailureKind::Unexpected);
}

// ===== Completion Client Tests =====

#[tokio::test]
async fn test_completion_sends_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", DEFAULT_API_VERSION))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 1024,
            "system": "be brief",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let client = completion_client(&server, Duration::from_secs(5));
    let request = CompletionRequest::conversation("be brief", vec![ChatMessage::user("hello")]);
    let response = client.complete(&request).await.unwrap();

    assert_eq!(response.text, "Hi there");
    assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    assert_eq!(response.output_tokens, Some(4));
}

#[rstest]
#[case(500, FailureKind::Transient)]
#[case(502, FailureKind::Transient)]
#[case(529, FailureKind::Transient)]
#[case(429, FailureKind::Transient)]
#[case(400, FailureKind::Permanent)]
#[case(401, FailureKind::Permanent)]
#[case(403, FailureKind::Permanent)]
#[case(404, FailureKind::Permanent)]
#[tokio::test]
async fn test_completion_status_classification(#[case] status: u16, #[case] expected: FailureKind) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "type": "error",
            "error": {"type": "api_error", "message": "nope"}
        })))
        .mount(&server)
        .await;

    let client = completion_client(&server, Duration::from_secs(5));
    let err = client
        .complete(&CompletionRequest::prompt("hello"))
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), expected);
}

#[tokio::test]
async fn test_completion_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(messages_body("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = completion_client(&server, Duration::from_millis(200));
    let err = client
        .complete(&CompletionRequest::prompt("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::Timeout(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_completion_without_text_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude",
            "content": []
        })))
        .mount(&server)
        .await;

    let client = completion_client(&server, Duration::from_secs(5));
    let err = client
        .complete(&CompletionRequest::prompt("hello"))
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::Unexpected);
}

#[tokio::test]
async fn test_completion_rejects_empty_conversation_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_body("x")))
        .expect(0)
        .mount(&server)
        .await;

    let client = completion_client(&server, Duration::from_secs(5));
    let err = client
        .complete(&CompletionRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::Permanent);
}
