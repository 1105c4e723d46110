//! Integration tests for TransportMiddleware using wiremock.

use std::net::TcpListener;

use http::HeaderValue;
use pretty_assertions::assert_eq;
use reqwest::Client;
use stashbox::Transport;
use stashbox_fs::FileCache;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_cache_miss_then_hit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"message":"Hello from server"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let transport = Transport::builder()
        .cache(FileCache::new(temp_dir.path()))
        .init()
        .await
        .unwrap();
    let client = stashbox_reqwest::client(transport, Client::new());
    let url = format!("{}/data?page=2", mock_server.uri());

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["content-type"], "application/json");
    assert_eq!(
        first.text().await.unwrap(),
        r#"{"message":"Hello from server"}"#
    );

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.headers()["content-type"], "application/json");
    assert_eq!(
        second.text().await.unwrap(),
        r#"{"message":"Hello from server"}"#
    );

    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_retries_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = Transport::builder().retries(2).build();
    let client = stashbox_reqwest::client(transport, Client::new());

    let response = client
        .get(format!("{}/flaky", mock_server.uri()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "finally");
}

#[tokio::test]
async fn test_retries_post_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let transport = Transport::builder().retries(1).build();
    let client = stashbox_reqwest::client(transport, Client::new());

    let response = client
        .post(format!("{}/submit", mock_server.uri()))
        .body("payload")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|request| request.body == b"payload"));
}

#[tokio::test]
async fn test_error_status_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let transport = Transport::builder()
        .cache(FileCache::new(temp_dir.path()))
        .init()
        .await
        .unwrap();
    let client = stashbox_reqwest::client(transport, Client::new());
    let url = format!("{}/missing", mock_server.uri());

    for _ in 0..2 {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), 404);
    }

    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_user_agent_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "stashbox-test/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = Transport::builder()
        .user_agent(HeaderValue::from_static("stashbox-test/1.0"))
        .build();
    let client = stashbox_reqwest::client(transport, Client::new());

    let response = client
        .get(mock_server.uri())
        .header("user-agent", "something-else")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_transport_error_after_retries() {
    // nothing listens on a port whose listener was just dropped
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = format!("http://127.0.0.1:{port}/gone");

    let transport = Transport::builder().retries(1).build();
    let client = stashbox_reqwest::client(transport, Client::new());

    let result = client.get(&url).send().await;

    match result {
        Err(reqwest_middleware::Error::Reqwest(err)) => {
            assert!(err.is_connect(), "unexpected error: {err}")
        }
        other => panic!("expected a connection error, got {other:?}"),
    }
}
