//! Integration tests for the Service Management client over real HTTP
//!
//! Each test runs `HttpTransport` against a wiremock server and checks both
//! what goes over the wire and how responses are interpreted.

use std::sync::Arc;
use std::time::Duration;

use smctl_core::{
    CoreError, Credentials, HttpTransport, OperationState, PollPolicy, ServiceManagementClient,
    register_missing, wait_for,
};
use wiremock::matchers::{bearer_token, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NS: &str = "http://schemas.microsoft.com/windowsazure";

fn services_body(entries: &[(&str, &str)]) -> String {
    let services: String = entries
        .iter()
        .map(|(t, s)| format!("<Service><Type>{t}</Type><State>{s}</State></Service>"))
        .collect();
    format!(r#"<?xml version="1.0" encoding="utf-8"?><Services xmlns="{NS}">{services}</Services>"#)
}

fn operation_body(id: &str, status: &str) -> String {
    format!(r#"<Operation xmlns="{NS}"><ID>{id}</ID><Status>{status}</Status><HttpStatusCode>200</HttpStatusCode></Operation>"#)
}

fn xml(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, "application/xml")
}

fn client_for(server: &MockServer) -> ServiceManagementClient {
    let transport = HttpTransport::new(&server.uri(), Credentials::Token("test-token".to_string()))
        .expect("transport");
    ServiceManagementClient::new(Arc::new(transport), "sub1", "session-1")
}

// ============================================================================
// list_resources
// ============================================================================

#[tokio::test]
async fn test_list_resources_request_and_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .and(query_param("serviceList", "A,B,C"))
        .and(query_param("expandlist", "ServiceResource"))
        .and(header("x-ms-version", "2013-03-01"))
        .and(header("accept", "application/xml"))
        .and(header("x-ms-client-session-id", "session-1"))
        .and(header_exists("x-ms-client-request-id"))
        .and(bearer_token("test-token"))
        .respond_with(xml(
            200,
            services_body(&[("C", "Unregistered"), ("A", "Registered"), ("C", "Unregistered")]),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let resources = client_for(&server)
        .list_resources(&["A", "B", "C"])
        .await
        .unwrap();

    let pairs: Vec<_> = resources
        .iter()
        .map(|r| (r.resource_type.as_str(), r.state.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("C", "Unregistered"), ("A", "Registered"), ("C", "Unregistered")]
    );
}

#[tokio::test]
async fn test_list_resources_http_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("ForbiddenError"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_resources(&["A"]).await.unwrap_err();
    match err {
        CoreError::Transport { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "ForbiddenError");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_resources_wrong_namespace_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(xml(
            200,
            "<Services xmlns=\"urn:something-else\"><Service/></Services>".to_string(),
        ))
        .mount(&server)
        .await;

    let err = client_for(&server).list_resources(&["A"]).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse(_)), "{err:?}");
}

// ============================================================================
// register / unregister
// ============================================================================

#[tokio::test]
async fn test_register_then_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/sub1/services"))
        .and(query_param("service", "Storage"))
        .and(query_param("action", "register"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/sub1/services"))
        .and(query_param("service", "Storage"))
        .and(query_param("action", "register"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.register_resource_type("Storage").await.unwrap();
    let second = client.register_resource_type("Storage").await.unwrap();
    assert_eq!((first, second), (true, false));
}

#[tokio::test]
async fn test_unregister_conflict_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/sub1/services"))
        .and(query_param("service", "Caching"))
        .and(query_param("action", "unregister"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    assert!(
        !client_for(&server)
            .unregister_resource_type("Caching")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_register_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/sub1/services"))
        .respond_with(ResponseTemplate::new(500).set_body_string("InternalError"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .register_resource_type("Storage")
        .await
        .unwrap_err();
    assert!(err.is_server_error());
}

// ============================================================================
// register_missing workflow
// ============================================================================

#[tokio::test]
async fn test_register_missing_partial_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(xml(
            200,
            services_body(&[("A", "Registered"), ("B", "Unregistered")]),
        ))
        .mount(&server)
        .await;

    for (service, status) in [("B", 200u16), ("C", 409), ("D", 500)] {
        Mock::given(method("PUT"))
            .and(path("/sub1/services"))
            .and(query_param("service", service))
            .and(query_param("action", "register"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
    }
    // A is already registered and must not be touched
    Mock::given(method("PUT"))
        .and(query_param("service", "A"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = register_missing(&client_for(&server), &["A", "B", "C", "D"])
        .await
        .unwrap();

    assert_eq!(report.registered, vec!["B"]);
    assert_eq!(report.already_registered, vec!["C"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].resource_type, "D");
    assert!(report.failed[0].error.contains("500"));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_register_missing_nothing_to_do() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(xml(200, services_body(&[("A", "Registered")])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = register_missing(&client_for(&server), &["A"]).await.unwrap();
    assert!(report.registered.is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_register_missing_list_failure_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = register_missing(&client_for(&server), &["A"]).await.unwrap_err();
    assert!(err.is_unauthorized());
}

// ============================================================================
// operation polling
// ============================================================================

#[tokio::test]
async fn test_wait_for_polls_until_succeeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-1"))
        .and(header("x-ms-version", "2013-03-01"))
        .respond_with(xml(200, operation_body("op-1", "InProgress")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-1"))
        .respond_with(xml(200, operation_body("op-1", "Succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let status = wait_for(
        &client_for(&server),
        "op-1",
        PollPolicy::new(Duration::from_millis(10), 5),
        None,
    )
    .await
    .unwrap();

    assert_eq!(status.status, OperationState::Succeeded);
    assert_eq!(status.tracking_id, "op-1");
}

#[tokio::test]
async fn test_wait_for_times_out_with_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-2"))
        .respond_with(xml(200, operation_body("op-2", "InProgress")))
        .expect(3)
        .mount(&server)
        .await;

    let err = wait_for(
        &client_for(&server),
        "op-2",
        PollPolicy::new(Duration::from_millis(5), 3),
        None,
    )
    .await
    .unwrap_err();

    match err {
        CoreError::OperationTimeout {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_status.status, OperationState::InProgress);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_for_unknown_tracking_id_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = wait_for(
        &client_for(&server),
        "missing",
        PollPolicy::new(Duration::from_millis(5), 3),
        None,
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
}
