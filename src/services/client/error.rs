use crate::services::registry::ServiceName;

/// 注册中心客户端错误类型
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Registry responded with status {status}")]
    Status { status: u16 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No provider available for service {0}")]
    NoProvider(ServiceName),
}
