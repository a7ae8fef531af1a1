use std::sync::Arc;

use axum::body::Body;
use http::{Request, StatusCode};
use tower::util::ServiceExt;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opizontas_registry::services::ServiceName;
use opizontas_registry::services::log::{
    FileSink, HttpSink, LogError, LogSink, RemoteLogger, create_router,
};

#[tokio::test]
async fn test_file_sink_appends() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("distributed.log");
    let sink = FileSink::new(&file);

    assert_eq!(sink.write(b"first\n").await.unwrap(), 6);
    sink.write(b"second\n").await.unwrap();

    let content = std::fs::read_to_string(&file).unwrap();
    assert_eq!(content, "first\nsecond\n");
}

#[tokio::test]
async fn test_http_sink_posts_to_log_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpSink::new(reqwest::Client::new(), &server.uri());
    assert_eq!(sink.write(b"hello").await.unwrap(), 5);
}

#[tokio::test]
async fn test_http_sink_reports_non_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let sink = HttpSink::new(reqwest::Client::new(), &server.uri());
    let result = sink.write(b"hello").await;
    assert!(matches!(result, Err(LogError::Status { status: 400 })));
}

#[tokio::test]
async fn test_log_endpoint_writes_to_sink() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("distributed.log");
    let app = create_router(Arc::new(FileSink::new(&file)), "distributed");

    let empty = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/log")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/log")
                .body(Body::from("grades updated"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content = std::fs::read_to_string(&file).unwrap();
    assert_eq!(content, "[distributed] - grades updated\n");
}

#[tokio::test]
async fn test_remote_logger_prefixes_service_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_string("[GradingService] - graded"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink: Arc<dyn LogSink> = Arc::new(HttpSink::new(reqwest::Client::new(), &server.uri()));
    let logger = RemoteLogger::new(sink, ServiceName::GRADING_SERVICE);
    logger.log("graded").await.unwrap();
}
