use std::sync::Arc;

use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::util::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opizontas_registry::services::registry::{
    Registration, RegistryStore, ServiceName, create_router,
};

fn registration_json(name: &str, url: &str, required: &[&str]) -> String {
    serde_json::json!({
        "ServiceName": name,
        "ServiceURL": url,
        "RequiredServices": required,
        "ServiceUpdateURL": format!("{url}/services"),
        "HeartbeatURL": format!("{url}/heartbeat"),
    })
    .to_string()
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/services")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn delete(url: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri("/services")
        .body(Body::from(url.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_endpoint() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());

    let response = app
        .oneshot(post(registration_json("LogService", "http://h:4000", &[])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_rejects_malformed_body() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());

    let response = app.oneshot(post("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_register_reports_backfill_failure() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());

    // 更新地址无法连接，依赖回填失败
    let response = app
        .oneshot(post(registration_json(
            "GradingService",
            "http://127.0.0.1:1",
            &["LogService"],
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.get("http://127.0.0.1:1").await.is_some());
}

#[tokio::test]
async fn test_deregister_unknown_url() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());

    let response = app.oneshot(delete("http://h:4000")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_list_endpoint() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());

    app.clone()
        .oneshot(post(registration_json("LogService", "http://h:4000", &[])))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/services")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let listed: Vec<Registration> = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].service_name, ServiceName::LOG_SERVICE);
}

#[tokio::test]
async fn test_register_and_deregister_scenario() {
    let store = Arc::new(RegistryStore::default());
    let app = create_router(store.clone());
    let grading_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&grading_server)
        .await;

    let response = app
        .clone()
        .oneshot(post(registration_json("LogService", "http://h:4000", &[])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post(registration_json(
            "GradingService",
            &grading_server.uri(),
            &["LogService"],
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(delete("http://h:4000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    store.notifier().flush().await;

    let bodies: Vec<String> = grading_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|r| String::from_utf8(r.body).unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec![
            r#"{"Added":[{"Name":"LogService","URL":"http://h:4000"}],"Removed":null}"#.to_string(),
            r#"{"Added":null,"Removed":[{"Name":"LogService","URL":"http://h:4000"}]}"#.to_string(),
        ]
    );
    assert!(store.get("http://h:4000").await.is_none());
}
