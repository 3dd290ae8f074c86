/*
[INPUT]:  Mock login/validate endpoints, credential combinations
[OUTPUT]: Test results for the token lifecycle
[POS]:    Integration tests - credential resolution, login, validation, re-authorization
[UPDATE]: When auth flow or credential rules change
*/

mod common;

use common::{client_for, mock_token, setup_mock_server};
use financefeast::{Credentials, FinanceFeastError, Query};
use reqwest::StatusCode;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, token: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/oauth/login"))
        .and(header("X-FF-ID", "client-id"))
        .and(header("X-FF-SECRET", "client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": token})))
        .expect(expected)
        .mount(server)
        .await;
}

fn client_pair() -> Credentials {
    Credentials::with_client("client-id", "client-secret")
}

#[test]
fn test_missing_credentials_fail_before_network() {
    let err = Credentials::default().resolve_with(|_| None).unwrap_err();
    assert!(matches!(err, FinanceFeastError::NotAuthorised));

    let err = Credentials {
        client_secret: Some("secret".to_string()),
        ..Credentials::default()
    }
    .resolve_with(|_| None)
    .unwrap_err();
    assert!(matches!(err, FinanceFeastError::MissingClientId));

    let err = Credentials {
        client_id: Some("id".to_string()),
        ..Credentials::default()
    }
    .resolve_with(|_| None)
    .unwrap_err();
    assert!(matches!(err, FinanceFeastError::MissingClientSecret));
}

#[test]
fn test_environment_supplies_missing_secret() {
    let resolved = Credentials {
        client_id: Some("id".to_string()),
        ..Credentials::default()
    }
    .resolve_with(|name| (name == "FF-CLIENT-SECRET").then(|| "from-env".to_string()));

    let resolved = assert_ok!(resolved);
    let client = resolved.client.expect("client pair");
    assert_eq!(client.client_id, "id");
    assert_eq!(client.client_secret, "from-env");
}

#[tokio::test]
async fn test_token_only_client_never_logs_in() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/oauth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "x"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/eod"))
        .and(header("authorization", format!("Bearer {}", mock_token()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::with_token(mock_token()));
    for _ in 0..3 {
        assert_ok!(client.get_data("data/eod", &Query::new(), true).await);
    }
}

#[tokio::test]
async fn test_client_credentials_login_exactly_once() {
    let server = setup_mock_server().await;
    mount_login(&server, "issued-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/info/ticker"))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["air.nz"]})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, client_pair());
    for _ in 0..3 {
        let data = assert_ok!(client.get_data("info/ticker", &Query::new(), true).await);
        assert_eq!(data, json!(["air.nz"]));
    }
    assert_eq!(client.token(), Some("issued-token".to_string()));
}

#[tokio::test]
async fn test_login_without_access_token_reports_detail() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/oauth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"detail": "Invalid client secret"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, client_pair());
    let err = client
        .get_data("data/eod", &Query::new(), true)
        .await
        .unwrap_err();

    match err {
        FinanceFeastError::Authorization { message } => {
            assert_eq!(message, "Invalid client secret");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_failed_validation_triggers_single_relogin() {
    let server = setup_mock_server().await;
    mount_login(&server, "issued-token", 2).await;
    Mock::given(method("GET"))
        .and(path("/oauth/validate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/eod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, client_pair());
    assert_ok!(client.get_data("data/eod", &Query::new(), true).await);

    let validated = assert_ok!(client.validate().await);
    assert_eq!(validated, None);
    assert!(client.token().is_none());

    assert_ok!(client.get_data("data/eod", &Query::new(), true).await);
    assert_eq!(client.token(), Some("issued-token".to_string()));
}

#[tokio::test]
async fn test_successful_validation_returns_payload() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/oauth/validate"))
        .and(header("authorization", format!("Bearer {}", mock_token()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"active": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::with_token(mock_token()));
    let validated = assert_ok!(client.validate().await);
    assert_eq!(validated, Some(json!({"active": true})));
    assert!(assert_ok!(client.check_authorization().await));
    assert_eq!(client.token(), Some(mock_token()));
}

#[tokio::test]
async fn test_rejected_token_reauthorizes_once() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/oauth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "first"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "second"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/eod"))
        .and(header("authorization", "Bearer first"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/eod"))
        .and(header("authorization", "Bearer second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, client_pair());
    let data = assert_ok!(client.get_data("data/eod", &Query::new(), true).await);
    assert_eq!(data, json!([1]));
    assert_eq!(client.token(), Some("second".to_string()));
}

#[tokio::test]
async fn test_rejected_supplied_token_is_not_retried() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/data/eod"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::with_token(mock_token()));
    let err = client
        .get_data("data/eod", &Query::new(), true)
        .await
        .unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}
