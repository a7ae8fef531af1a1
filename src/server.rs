use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::services::heartbeat::HeartbeatMonitor;
use crate::services::registry::{PatchNotifier, RegistryStore, create_router_with_monitor};

pub async fn start(config: Config, shutdown: CancellationToken) -> Result<(), Box<dyn std::error::Error>> {
    let client = config.http_client()?;

    // 初始化服务注册表
    let store = Arc::new(RegistryStore::new(PatchNotifier::new(client.clone())));

    let monitor = Arc::new(HeartbeatMonitor::new(
        store.clone(),
        client,
        config.heartbeat_config(),
    ));
    monitor.start();

    let listener = TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(addr = %config.server.listen_addr, "Registry server listening");

    let app = create_router_with_monitor(store.clone(), monitor.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    monitor.shutdown().await;
    store.notifier().flush().await;
    tracing::info!("Registry server stopped");

    Ok(())
}
