use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use bytes::Bytes;
use http::StatusCode;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::ClientError;
use super::providers::Providers;
use super::registry_client::RegistryClient;
use crate::services::registry::{Patch, Registration};

/// 每个已注册服务都需要提供的回调路由：补丁接收和心跳
pub fn consumer_router(providers: Providers) -> Router {
    Router::new()
        .route("/services", post(update_handler))
        .route("/heartbeat", get(heartbeat_handler))
        .with_state(providers)
}

// POST /services，合并注册中心推送的补丁
async fn update_handler(State(providers): State<Providers>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Patch>(&body) {
        Ok(patch) => {
            providers.update(&patch).await;
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!(error = %e, "Received malformed patch");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn heartbeat_handler() -> &'static str {
    "OK"
}

/// 已启动并注册到注册中心的服务
#[derive(Debug)]
pub struct RunningService {
    registration: Registration,
    providers: Providers,
    client: RegistryClient,
    shutdown: CancellationToken,
    server: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningService {
    /// 启动 HTTP 服务并注册；注册失败时关闭已启动的服务
    pub async fn start(
        client: RegistryClient,
        registration: Registration,
        listen_addr: &str,
        routes: Router,
        shutdown: CancellationToken,
    ) -> Result<Self, ClientError> {
        let providers = Providers::new();
        let app = routes.merge(consumer_router(providers.clone()));

        let listener = TcpListener::bind(listen_addr).await?;
        tracing::info!(
            service_name = %registration.service_name,
            addr = %listen_addr,
            "Service listening"
        );

        let server_shutdown = shutdown.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(server_shutdown.cancelled_owned())
                .await
        });

        if let Err(e) = client.register_service(&registration).await {
            shutdown.cancel();
            return Err(e);
        }

        Ok(Self {
            registration,
            providers,
            client,
            shutdown,
            server,
        })
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// 等待关闭信号，然后注销并停止 HTTP 服务
    pub async fn wait(self) -> Result<(), ClientError> {
        self.shutdown.cancelled().await;

        let deregistered = self
            .client
            .shutdown_service(&self.registration.service_url)
            .await;

        match self.server.await {
            Ok(result) => result?,
            Err(e) => tracing::error!(error = %e, "Service task failed"),
        }

        tracing::info!(service_name = %self.registration.service_name, "Service stopped");
        deregistered
    }
}
