use std::sync::Arc;

use opizontas_registry::services::ServiceName;
use opizontas_registry::services::client::{RegistryClient, RunningService, ServiceConfig};
use opizontas_registry::services::log::{FileSink, create_router};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

const ENV_PREFIX: &str = "LOG_SERVICE_";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();
    let config = ServiceConfig::from_env(ENV_PREFIX)?;
    let log_file = std::env::var(format!("{ENV_PREFIX}FILE")).unwrap_or_else(|_| "./distributed.log".to_string());

    let sink = Arc::new(FileSink::new(log_file));
    let routes = create_router(sink, "distributed");
    let registration = config.registration(ServiceName::LOG_SERVICE, Vec::new());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal.cancel(),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    let client = RegistryClient::connect(&config.registry_url);
    let service = RunningService::start(client, registration, &config.listen_addr(), routes, shutdown).await?;
    service.wait().await?;

    tracing::info!("Shutting down log service");
    Ok(())
}
