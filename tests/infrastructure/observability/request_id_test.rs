use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::middleware;
use axum::routing::get;
use tower::ServiceExt;

use vaultd::infrastructure::observability::{REQUEST_ID_HEADER, RequestId, request_id_middleware};

fn app() -> Router {
    Router::new()
        .route(
            "/",
            get(|axum::Extension(id): axum::Extension<RequestId>| async move { id.0 }),
        )
        .layer(middleware::from_fn(request_id_middleware))
}

#[test]
fn given_request_id_header_constant_when_accessed_then_returns_correct_value() {
    assert_eq!(REQUEST_ID_HEADER, "x-request-id");
}

#[test]
fn given_unprintable_or_oversized_client_id_when_accepting_then_a_fresh_one_is_generated() {
    assert_eq!(
        RequestId::from_client(Some("trace-42")),
        RequestId("trace-42".to_string())
    );

    let spaced = RequestId::from_client(Some("two words"));
    assert!(uuid::Uuid::parse_str(&spaced.0).is_ok());

    let long = "a".repeat(500);
    let oversized = RequestId::from_client(Some(&long));
    assert!(uuid::Uuid::parse_str(&oversized.0).is_ok());

    assert!(uuid::Uuid::parse_str(&RequestId::from_client(None).0).is_ok());
}

#[tokio::test]
async fn given_client_request_id_when_handled_then_it_is_echoed_and_visible_to_handlers() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"abc-123");
}

#[tokio::test]
async fn given_no_request_id_when_handled_then_one_is_generated() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}
