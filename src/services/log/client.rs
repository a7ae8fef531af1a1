use std::sync::Arc;

use super::sink::{LogError, LogSink};
use crate::services::registry::ServiceName;

/// 带服务名前缀的日志写入器，底层 sink 可以是文件也可以是远程日志服务
#[derive(Clone)]
pub struct RemoteLogger {
    sink: Arc<dyn LogSink>,
    service: ServiceName,
}

impl RemoteLogger {
    pub fn new(sink: Arc<dyn LogSink>, service: ServiceName) -> Self {
        Self { sink, service }
    }

    pub async fn log(&self, message: &str) -> Result<(), LogError> {
        let line = format!("[{}] - {}", self.service, message);
        self.sink.write(line.as_bytes()).await?;
        Ok(())
    }
}
