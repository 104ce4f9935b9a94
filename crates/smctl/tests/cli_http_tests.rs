//! End-to-end tests running the binary against a mock management endpoint

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NS: &str = "http://schemas.microsoft.com/windowsazure";

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

fn services(entries: &[(&str, &str)]) -> String {
    let inner: String = entries
        .iter()
        .map(|(t, s)| format!("<Service><Type>{t}</Type><State>{s}</State></Service>"))
        .collect();
    format!(r#"<Services xmlns="{NS}">{inner}</Services>"#)
}

fn operation(id: &str, status: &str, error: Option<(&str, &str)>) -> String {
    let error = error
        .map(|(code, message)| {
            format!("<Error><Code>{code}</Code><Message>{message}</Message></Error>")
        })
        .unwrap_or_default();
    format!(
        r#"<Operation xmlns="{NS}"><ID>{id}</ID><Status>{status}</Status><HttpStatusCode>200</HttpStatusCode>{error}</Operation>"#
    )
}

/// Config with one token profile pointing at `server`
fn write_config(dir: &TempDir, server: &MockServer) {
    std::fs::write(
        dir.path().join("config.toml"),
        format!(
            r#"
default_profile = "mock"

[profiles.mock]
subscription_id = "sub1"
endpoint = "{}"
token = "test-token"
"#,
            server.uri()
        ),
    )
    .unwrap();
}

fn smctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("smctl").unwrap();
    for var in ["SMCTL_TOKEN", "SMCTL_CERTIFICATE", "SMCTL_PROFILE", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd.arg("--config-file").arg(dir.path().join("config.toml"));
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .and(query_param("serviceList", "Caching,Storage"))
        .respond_with(xml(services(&[
            ("Caching", "Unregistered"),
            ("Storage", "Registered"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["provider", "list", "--type", "Storage", "--type", "Caching", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"Caching\""))
        .stdout(predicate::str::contains("\"state\": \"Registered\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_register_already_registered() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/sub1/services"))
        .and(query_param("service", "Storage"))
        .and(query_param("action", "register"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["provider", "register", "Storage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already registered"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_sync_dry_run_does_not_register() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(xml(services(&[("Storage", "Registered")])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["provider", "sync", "--dry-run", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CloudServices"))
        .stdout(predicate::str::contains("\"Storage\"").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_sync_partial_failure_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/services/"))
        .respond_with(xml(services(&[])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(query_param("service", "Storage"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["provider", "sync"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Storage"))
        .stderr(predicate::str::contains("could not be registered"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_operation_show() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-1"))
        .respond_with(xml(operation("op-1", "InProgress", None)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["operation", "show", "op-1", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"InProgress\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_operation_wait_failed_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-2"))
        .respond_with(xml(operation(
            "op-2",
            "Failed",
            Some(("ConflictError", "Name already in use")),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["operation", "wait", "op-2", "--interval", "1", "-o", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ConflictError"))
        .stderr(predicate::str::contains("Operation op-2 failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_operation_wait_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub1/operations/op-3"))
        .respond_with(xml(operation("op-3", "InProgress", None)))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args([
            "operation",
            "wait",
            "op-3",
            "--interval",
            "1",
            "--max-attempts",
            "2",
            "-o",
            "json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timeout"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_shows_tips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("ForbiddenError"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(&dir, &server);

    smctl(&dir)
        .args(["provider", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"))
        .stderr(predicate::str::contains("tip"));
}
