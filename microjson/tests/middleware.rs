mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Extension, Router,
};
use microjson::{
    middleware::{
        log_requests, request_id, request_id::REQUEST_ID_HEADER, version::VERSION_HEADER,
        version_header, RequestId,
    },
    state::ServiceInfo,
};
use tower::ServiceExt;
use uuid::Uuid;

use support::response_text;

async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
    id.to_string()
}

fn app(version: &str) -> Router {
    let service = ServiceInfo::new(version, "test-host");
    Router::new()
        .route("/test", get(echo_request_id))
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(from_fn_with_state(service, version_header))
}

fn request(uri: &str) -> axum::http::request::Builder {
    Request::builder().uri(uri)
}

#[tokio::test]
async fn version_header_is_added_to_every_response() {
    let response = app("1.4.0")
        .oneshot(request("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers().get(VERSION_HEADER).unwrap(), "1.4.0");

    let missing = app("1.4.0")
        .oneshot(request("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.headers().get(VERSION_HEADER).unwrap(), "1.4.0");
}

#[tokio::test]
async fn unprintable_version_is_skipped() {
    let response = app("bad\nversion")
        .oneshot(request("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(VERSION_HEADER).is_none());
}

#[tokio::test]
async fn generated_request_id_reaches_handler_and_response() {
    let response = app("1.0.0")
        .oneshot(request("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let header = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(Uuid::parse_str(&header).is_ok());
    assert_eq!(response_text(response).await, header);
}

#[tokio::test]
async fn client_request_id_is_kept() {
    let response = app("1.0.0")
        .oneshot(
            request("/test")
                .header("x-correlation-id", "corr-req-456")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "corr-req-456");
    assert_eq!(response_text(response).await, "corr-req-456");
}

#[tokio::test]
async fn oversized_request_id_is_replaced() {
    let oversized = "x".repeat(200);
    let response = app("1.0.0")
        .oneshot(
            request("/test")
                .header("x-request-id", oversized.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let header = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
    assert!(Uuid::parse_str(header).is_ok());
}
