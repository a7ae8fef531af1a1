use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// 日志写入错误
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to send log message, service responded with code {status}")]
    Status { status: u16 },
}

/// 日志目的地，只暴露写入能力
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn write(&self, data: &[u8]) -> Result<usize, LogError>;
}

/// 追加写入本地文件
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn write(&self, data: &[u8]) -> Result<usize, LogError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(data.len())
    }
}

/// 通过 `POST <url>/log` 写入远程日志服务
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(client: reqwest::Client, service_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/log", service_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn write(&self, data: &[u8]) -> Result<usize, LogError> {
        let response = self
            .client
            .post(&self.url)
            .header(http::header::CONTENT_TYPE, "text/plain")
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LogError::Status {
                status: status.as_u16(),
            });
        }
        Ok(data.len())
    }
}
