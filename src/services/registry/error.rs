use thiserror::Error;

/// 补丁推送失败
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Consumer responded with status {status}")]
    Status { status: u16 },
}

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Payload is not valid UTF-8")]
    InvalidPayload(#[from] std::string::FromUtf8Error),

    #[error("Service at url {url} not found")]
    NotFound { url: String },

    #[error("Failed to deliver patch to {url}: {source}")]
    Delivery {
        url: String,
        #[source]
        source: DeliveryError,
    },
}
