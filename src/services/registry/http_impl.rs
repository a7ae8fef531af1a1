use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use http::StatusCode;

use super::error::RegistryError;
use super::store::RegistryStore;
use super::types::Registration;
use crate::services::heartbeat::HeartbeatMonitor;

/// 注册接口的 HTTP 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::warn!(status = %status, error = %message, "Registry request failed");
        (status, message).into_response()
    }
}

// 路由共享状态
#[derive(Clone)]
struct RegistryState {
    store: Arc<RegistryStore>,
    monitor: Option<Arc<HeartbeatMonitor>>,
}

// 注册服务路由
pub fn create_router(store: Arc<RegistryStore>) -> Router {
    build_router(RegistryState {
        store,
        monitor: None,
    })
}

/// 带心跳监测的注册服务路由，注销时同时停止监测该服务
pub fn create_router_with_monitor(
    store: Arc<RegistryStore>,
    monitor: Arc<HeartbeatMonitor>,
) -> Router {
    build_router(RegistryState {
        store,
        monitor: Some(monitor),
    })
}

fn build_router(state: RegistryState) -> Router {
    Router::new()
        .route(
            "/services",
            post(register_handler)
                .delete(deregister_handler)
                .get(list_handler),
        )
        .with_state(state)
}

// POST /services，请求体为 JSON 编码的注册信息
async fn register_handler(
    State(RegistryState { store, .. }): State<RegistryState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let registration: Registration = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(RegistryError::from(e).to_string()))?;

    tracing::info!(
        service_name = %registration.service_name,
        service_url = %registration.service_url,
        "Adding service"
    );

    store
        .add(registration)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(StatusCode::OK)
}

// DELETE /services，请求体为服务地址原文
async fn deregister_handler(
    State(RegistryState { store, monitor }): State<RegistryState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let url = String::from_utf8(body.to_vec())
        .map_err(|e| ApiError::BadRequest(RegistryError::from(e).to_string()))?;

    tracing::info!(service_url = %url, "Removing service");

    let result = store.remove(&url).await;

    // 已被驱逐的服务不在注册表中，同样需要停止监测
    if matches!(result, Ok(_) | Err(RegistryError::NotFound { .. })) {
        if let Some(monitor) = &monitor {
            monitor.forget(&url);
        }
    }

    result.map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(StatusCode::OK)
}

// GET /services
async fn list_handler(State(RegistryState { store, .. }): State<RegistryState>) -> Json<Vec<Registration>> {
    Json(store.snapshot().await)
}
