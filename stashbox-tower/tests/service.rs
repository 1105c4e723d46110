use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use pretty_assertions::assert_eq;
use stashbox::Transport;
use stashbox_fs::FileCache;
use stashbox_tower::TransportLayer;
use tempfile::TempDir;
use tower::util::BoxCloneService;
use tower::{BoxError, ServiceBuilder, ServiceExt, service_fn};

type Client = BoxCloneService<Request<String>, Response<Full<Bytes>>, Infallible>;

/// Inner client answering `statuses[n]` on the n-th call, 200 afterwards.
fn client(statuses: &'static [u16], calls: Arc<AtomicUsize>) -> Client {
    BoxCloneService::new(service_fn(move |req: Request<String>| {
        let calls = Arc::clone(&calls);
        async move {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            let status = statuses.get(call).copied().unwrap_or(200);
            let body = format!("{} {} #{}", req.method(), req.uri().path(), call + 1);
            Ok::<_, Infallible>(
                Response::builder()
                    .status(status)
                    .header("content-type", "text/plain")
                    .body(Full::new(Bytes::from(body)))
                    .unwrap(),
            )
        }
    }))
}

async fn body_text(response: Response<Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::get(uri).body(String::new()).unwrap()
}

#[tokio::test]
async fn test_layer_caches_successful_responses() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Transport::builder()
        .cache(FileCache::new(temp_dir.path()))
        .init()
        .await
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ServiceBuilder::new()
        .layer(TransportLayer::new(transport))
        .service(client(&[], calls.clone()));

    let first = service
        .clone()
        .oneshot(get("http://example.com/items?page=1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_text(first).await, "GET /items #1");

    let second = service
        .clone()
        .oneshot(get("http://example.com/items?page=1"))
        .await
        .unwrap();
    assert_eq!(second.headers()["content-type"], "text/plain");
    assert_eq!(body_text(second).await, "GET /items #1");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_layer_retries_error_statuses() {
    let transport = Transport::builder().retries(2).build();
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ServiceBuilder::new()
        .layer(TransportLayer::new(transport))
        .service(client(&[502, 503], calls.clone()));

    let response = service
        .oneshot(get("http://example.com/unstable"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "GET /unstable #3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_layer_returns_final_error_status() {
    let transport = Transport::builder().retries(1).build();
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ServiceBuilder::new()
        .layer(TransportLayer::new(transport))
        .service(client(&[500, 429], calls.clone()));

    let response = service
        .oneshot(get("http://example.com/busy"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_layer_propagates_final_service_error() {
    let transport = Transport::builder().retries(2).build();
    let calls = Arc::new(AtomicUsize::new(0));
    let failing = service_fn({
        let calls = Arc::clone(&calls);
        move |_req: Request<String>| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<Response<Full<Bytes>>, BoxError>("connection refused".into()) }
        }
    });
    let service = ServiceBuilder::new()
        .layer(TransportLayer::new(transport))
        .service(failing);

    let err = service
        .oneshot(get("http://example.com/down"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "connection refused");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
