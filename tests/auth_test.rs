mod common;

use autocare_client::{ApiClient, ApiError, ApiRequest, ErrorKind, StaticToken};
use common::{config_for, RecordingSleeper};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn counting_handler(counter: Arc<AtomicUsize>) -> impl Fn(&ApiError) + Send + Sync {
    move |_err: &ApiError| {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_unauthorized_invokes_handler_once() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/users");
            then.status(401).json_body(json!({"message": "Token expired"}));
        })
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = RecordingSleeper::default();
    let client = ApiClient::builder(config_for(&server.base_url()))
        .unauthorized_handler(counting_handler(calls.clone()))
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    let err = client.execute(&ApiRequest::get("/users")).await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.is_auth_error());
    assert_eq!(err.status, Some(401));
    assert!(err.user_message().contains("đăng nhập"));
    assert_eq!(api_mock.hits_async().await, 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_forbidden_is_auth_error_without_handler_call() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/users/2");
            then.status(403);
        })
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let client = ApiClient::builder(config_for(&server.base_url()))
        .unauthorized_handler(counting_handler(calls.clone()))
        .sleeper(RecordingSleeper::default())
        .build()
        .unwrap();

    let err = client
        .execute(&ApiRequest::delete("/users/2"))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(err.kind, ErrorKind::Auth);
    assert!(err.message.contains("không có quyền"));
    assert_eq!(api_mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_handler_receives_normalized_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me");
            then.status(401);
        })
        .await;

    let seen = Arc::new(Mutex::new(None::<ApiError>));
    let sink = seen.clone();
    let client = ApiClient::builder(config_for(&server.base_url()))
        .unauthorized_handler(move |err: &ApiError| {
            *sink.lock().unwrap() = Some(err.clone());
        })
        .build()
        .unwrap();

    let _ = client.execute(&ApiRequest::get("/auth/me")).await;

    let seen = seen.lock().unwrap().clone().expect("handler was not called");
    assert!(seen.is_auth_error());
    assert!(seen.url.ends_with("/auth/me"));
}

#[tokio::test]
async fn test_bearer_token_from_provider() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/centers")
                .header("Authorization", "Bearer tok-123");
            then.status(200).json_body(json!({"content": []}));
        })
        .await;

    let client = ApiClient::builder(config_for(&server.base_url()))
        .token_provider(|| Some("tok-123".to_string()))
        .build()
        .unwrap();

    let response = client.execute(&ApiRequest::get("/centers")).await;
    tokio_test::assert_ok!(response);
    api_mock.assert_async().await;
}

#[tokio::test]
async fn test_no_token_means_no_header() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/centers").header_exists("Authorization");
            then.status(500);
        })
        .await;
    let open_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/centers");
            then.status(200).json_body(json!({"content": []}));
        })
        .await;

    let client = ApiClient::builder(config_for(&server.base_url()))
        .token_provider(|| None::<String>)
        .build()
        .unwrap();

    tokio_test::assert_ok!(client.execute(&ApiRequest::get("/centers")).await);
    assert_eq!(api_mock.hits_async().await, 0);
    assert_eq!(open_mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_static_token_and_config_token() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/parts")
                .header("Authorization", "Bearer from-config");
            then.status(200).json_body(json!({"content": []}));
        })
        .await;

    let mut config = config_for(&server.base_url());
    config.auth.token = Some("from-config".to_string());
    let client = ApiClient::new(config).unwrap();
    tokio_test::assert_ok!(client.execute(&ApiRequest::get("/parts")).await);

    let client = ApiClient::builder(config_for(&server.base_url()))
        .token_provider(StaticToken("from-config".to_string()))
        .build()
        .unwrap();
    tokio_test::assert_ok!(client.execute(&ApiRequest::get("/parts")).await);

    assert_eq!(api_mock.hits_async().await, 2);
}
