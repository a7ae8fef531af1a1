use serde::Deserialize;

use crate::services::registry::{Registration, ServiceName};

pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:10000/services";

/// 注册到注册中心的服务的启动配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 对外公布的主机名
    pub host: String,
    /// 本地监听的地址
    pub bind_host: String,
    pub port: u16,
    /// 注册中心的 `/services` 地址
    pub registry_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            bind_host: "0.0.0.0".to_string(),
            port: 14000,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// 从带前缀的环境变量读取，例如 `LOG_SERVICE_PORT`
    pub fn from_env(prefix: &str) -> Result<Self, envy::Error> {
        envy::prefixed(prefix).from_env()
    }

    pub fn service_address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// 按约定的回调路径生成注册信息
    pub fn registration(&self, name: ServiceName, required: Vec<ServiceName>) -> Registration {
        let address = self.service_address();
        Registration {
            service_name: name,
            service_update_url: format!("{address}/services"),
            heartbeat_url: format!("{address}/heartbeat"),
            service_url: address,
            required_services: required,
        }
    }
}
