use std::sync::Arc;

use axum::{Router, extract::State, routing::post};
use bytes::Bytes;
use http::StatusCode;

use super::sink::LogSink;

#[derive(Clone)]
struct LogState {
    sink: Arc<dyn LogSink>,
    prefix: Arc<str>,
}

/// 日志服务路由，`POST /log` 的请求体原样写入 sink
pub fn create_router(sink: Arc<dyn LogSink>, prefix: &str) -> Router {
    Router::new()
        .route("/log", post(log_handler))
        .with_state(LogState {
            sink,
            prefix: Arc::from(prefix),
        })
}

async fn log_handler(State(state): State<LogState>, body: Bytes) -> StatusCode {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    let message = String::from_utf8_lossy(&body);
    let line = format!("[{}] - {}\n", state.prefix, message.trim_end());
    match state.sink.write(line.as_bytes()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Failed to write log entry");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
